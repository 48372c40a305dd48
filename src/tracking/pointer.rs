use crate::foundation::core::{Point, Viewport};

/// Latest pointer position.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct PointerState {
    /// Horizontal position in `[-1, 1]`, left to right.
    pub x: f64,
    /// Vertical position in `[-1, 1]`, bottom to top.
    pub y: f64,
    /// Raw client position in CSS pixels.
    pub client: Point,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    state: PointerState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// Record a pointer move. A degenerate viewport leaves the state unchanged.
    pub fn sample(&mut self, client: Point, viewport: Viewport) {
        if viewport.is_degenerate() || !(client.x.is_finite() && client.y.is_finite()) {
            return;
        }
        self.state = PointerState {
            x: (client.x / viewport.width) * 2.0 - 1.0,
            y: -(client.y / viewport.height) * 2.0 + 1.0,
            client,
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tracking/pointer.rs"]
mod tests;
