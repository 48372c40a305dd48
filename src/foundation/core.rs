use crate::foundation::error::{ChoreoError, ChoreoResult};

pub use glam::DVec3;
pub use kurbo::{Point, Rect, Vec2};

/// Scroll-anchored content region of the page.
///
/// Sections are totally ordered by their position on the page; moving to a
/// higher-ordered section is a forward transition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    /// Landing section.
    Hero,
    /// About section.
    About,
    /// Experience section (rope-climb detour).
    Experience,
    /// Projects section.
    Projects,
    /// Contact section.
    Contact,
}

impl SectionId {
    /// All sections in page order.
    pub const ALL: [SectionId; 5] = [
        Self::Hero,
        Self::About,
        Self::Experience,
        Self::Projects,
        Self::Contact,
    ];

    /// 0-based page order.
    pub fn index(self) -> usize {
        match self {
            Self::Hero => 0,
            Self::About => 1,
            Self::Experience => 2,
            Self::Projects => 3,
            Self::Contact => 4,
        }
    }

    /// Anchor element id used by the page for this section.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::About => "about",
            Self::Experience => "experience",
            Self::Projects => "projects",
            Self::Contact => "contact",
        }
    }

    /// Parse an anchor id.
    pub fn parse(s: &str) -> ChoreoResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hero" => Ok(Self::Hero),
            "about" => Ok(Self::About),
            "experience" => Ok(Self::Experience),
            "projects" => Ok(Self::Projects),
            "contact" => Ok(Self::Contact),
            other => Err(ChoreoError::validation(format!(
                "unknown section '{other}'"
            ))),
        }
    }

    /// Direction of travel from `self` to `to`.
    pub fn direction_to(self, to: SectionId) -> Direction {
        if to.index() < self.index() {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Travel direction between two sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward a higher-ordered section: parabolic arc.
    Forward,
    /// Toward a lower-ordered section: flat path.
    Backward,
}

/// Opaque host handle for a page element (text container, heading, ...).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ElementRef(pub u64);

/// Opaque host handle for one rendered glyph.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct GlyphId(pub u64);

/// Identifier of a spawned physics letter; never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LetterId(pub u64);

/// Viewport size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero or not finite.
    pub fn is_degenerate(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite()) || self.width <= 0.0 || self.height <= 0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
