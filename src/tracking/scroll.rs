use crate::foundation::core::SectionId;

/// Document-space geometry of one section anchor.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SectionBounds {
    /// Offset of the anchor's top edge from the document top, in pixels.
    pub top: f64,
    /// Anchor height in pixels.
    pub height: f64,
}

/// Host page geometry for section anchors.
pub trait PageLayout {
    /// Bounds of `section`'s anchor, or `None` when the page has no such anchor.
    fn section_bounds(&self, section: SectionId) -> Option<SectionBounds>;
}

/// One raw scroll reading from the host.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrollSample {
    /// Document scroll offset.
    pub scroll_y: f64,
    /// Viewport height.
    pub viewport_height: f64,
    /// Total scrollable document height.
    pub scroll_height: f64,
}

/// Scroll-derived values read by the phase machine.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ScrollState {
    /// Section containing the viewport midpoint.
    pub section: SectionId,
    /// Fraction of `section` the viewport midpoint has passed, in `[0, 1]`.
    pub section_progress: f64,
    /// Signed delta from the previous sample.
    pub velocity: f64,
    /// Whole-page progress in `[0, 1]`.
    pub progress: f64,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            section: SectionId::Hero,
            section_progress: 0.0,
            velocity: 0.0,
            progress: 0.0,
        }
    }
}

/// Folds scroll samples into a [`ScrollState`].
///
/// Anchor geometry is resolved on the first sample and memoized until
/// [`ScrollTracker::invalidate_layout`] is called.
#[derive(Debug, Default)]
pub struct ScrollTracker {
    state: ScrollState,
    anchors: Option<[Option<SectionBounds>; 5]>,
    last_scroll_y: f64,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Forget memoized anchor geometry; the next sample re-queries the layout.
    pub fn invalidate_layout(&mut self) {
        self.anchors = None;
    }

    /// Fold one sample into the state.
    pub fn sample(&mut self, sample: ScrollSample, layout: &dyn PageLayout) {
        let ScrollSample {
            scroll_y,
            viewport_height,
            scroll_height,
        } = sample;
        if !(scroll_y.is_finite() && viewport_height.is_finite() && scroll_height.is_finite()) {
            tracing::trace!(?sample, "ignoring non-finite scroll sample");
            return;
        }

        let max_scroll = scroll_height - viewport_height;
        self.state.progress = if max_scroll > 0.0 {
            (scroll_y / max_scroll).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.state.velocity = scroll_y - self.last_scroll_y;
        self.last_scroll_y = scroll_y;

        let anchors = *self
            .anchors
            .get_or_insert_with(|| SectionId::ALL.map(|s| layout.section_bounds(s)));
        let (section, progress) = locate(&anchors, scroll_y, viewport_height);
        self.state.section = section;
        self.state.section_progress = progress;
    }
}

fn locate(
    anchors: &[Option<SectionBounds>; 5],
    scroll_y: f64,
    viewport_height: f64,
) -> (SectionId, f64) {
    let mid = scroll_y + viewport_height * 0.5;

    let mut current = (0..anchors.len())
        .rev()
        .find(|&i| anchors[i].is_some_and(|b| b.top <= mid));
    if current.is_none() && scroll_y < viewport_height * 0.5 && anchors[0].is_some() {
        current = Some(0);
    }

    let Some(i) = current else {
        return (SectionId::Hero, 0.0);
    };
    let Some(bounds) = anchors[i] else {
        return (SectionId::ALL[i], 0.0);
    };
    let span = match anchors.get(i + 1).copied().flatten() {
        Some(next) => next.top - bounds.top,
        None => bounds.height,
    };
    let progress = if span > 0.0 {
        ((mid - bounds.top) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (SectionId::ALL[i], progress)
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/scroll.rs"]
mod tests;
