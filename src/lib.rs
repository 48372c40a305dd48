#![forbid(unsafe_code)]
//! Scroll-driven choreography for an animated 3D figure on a content page.
//!
//! A [`Stage`] owns every component. The host queues [`Input`]s from its
//! scroll, pointer and readiness callbacks and calls [`Stage::frame`] once
//! per animation frame; outbound signals arrive as [`ChoreoEvent`]s on the
//! stage's [`EventBus`].

pub mod animation;
pub mod bus;
pub mod clips;
pub mod config;
pub mod director;
pub mod displacement;
pub mod foundation;
pub mod letters;
pub mod loader;
pub mod projection;
pub mod proxies;
pub mod stage;
pub mod state;
pub mod tracking;

pub use animation::{
    ease::Ease,
    tween::{Lerp, Timeline, Tween},
};
pub use bus::{ChoreoEvent, CollisionEdge, EventBus, EventKind, Inbox, Subscription};
pub use clips::{
    catalog::{ClipCatalog, ClipData, Track},
    player::{LoopMode, NullRig, Placement, PoseLayer, Rig, SkeletalPlayer},
};
pub use config::{
    Anchor, CameraConfig, ChoreoConfig, ChoreographyConfig, ClipNames, DisplacementConfig,
    FigureConfig, LetterConfig, LoaderConfig, ProxyConfig, ScatterConfig,
};
pub use director::{Director, LoadingLayout};
pub use displacement::{GlyphStyle, GlyphSurface, LetterDisplacementState, TextDisplacement};
pub use foundation::{
    core::{
        DVec3, Direction, ElementRef, GlyphId, LetterId, Point, Rect, SectionId, Vec2, Viewport,
    },
    error::{ChoreoError, ChoreoResult},
    math::Aabb,
};
pub use letters::{LetterBody, LetterLayer};
pub use loader::LoadSequencer;
pub use projection::Camera;
pub use proxies::{ElementSource, ProxyCollider, ProxyLayer};
pub use stage::{Input, Stage, StageHosts};
pub use state::{AnimationState, CharacterScreen, CharacterWorld, Phase};
pub use tracking::{
    pointer::PointerState,
    scroll::{PageLayout, ScrollSample, ScrollState, SectionBounds},
};
