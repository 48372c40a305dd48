//! Named animation clips and the player that blends them onto a host rig.

pub(crate) mod catalog;
pub(crate) mod player;
