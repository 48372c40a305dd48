//! Scroll and pointer state derived from raw host samples.

pub(crate) mod pointer;
pub(crate) mod scroll;
