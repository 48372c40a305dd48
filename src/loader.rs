//! Built-in load sequencer driving the loading counter and the site-ready signal.

use crate::{
    bus::{ChoreoEvent, EventBus, EventKind, Inbox},
    config::LoaderConfig,
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    /// Waiting for the figure to be ready (or the fallback to elapse).
    Arming { elapsed: f64 },
    /// Armed; waiting for the jump onto the loading bar to land.
    AwaitingJump { elapsed: f64 },
    /// Counting 0..=100.
    Counting { elapsed: f64, next: u8 },
    /// Counter done; waiting out the exit slide.
    Exiting { elapsed: f64 },
    Done,
}

/// Publishes `LoadProgress` once per integer percent, then `SiteReady` once.
#[derive(Debug)]
pub struct LoadSequencer {
    cfg: LoaderConfig,
    bus: EventBus,
    inbox: Inbox,
    stage: Stage,
    figure_ready: bool,
    jump_landed: bool,
}

impl LoadSequencer {
    pub fn new(cfg: LoaderConfig, bus: &EventBus) -> Self {
        Self {
            cfg,
            bus: bus.clone(),
            inbox: bus.inbox(&[EventKind::FigureReady, EventKind::JumpComplete]),
            stage: if cfg.enabled {
                Stage::Arming { elapsed: 0.0 }
            } else {
                Stage::Done
            },
            figure_ready: false,
            jump_landed: false,
        }
    }

    /// Stop listening and never publish again.
    pub fn teardown(&mut self) {
        self.inbox.close();
        self.stage = Stage::Done;
    }

    /// `true` once `SiteReady` was published, or when the sequencer is disabled.
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn tick(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for ev in self.inbox.drain() {
            match ev {
                ChoreoEvent::FigureReady => self.figure_ready = true,
                ChoreoEvent::JumpComplete => self.jump_landed = true,
                _ => {}
            }
        }

        self.stage = match self.stage {
            Stage::Arming { elapsed } => {
                let elapsed = elapsed + dt;
                if self.figure_ready || elapsed >= self.cfg.ready_fallback_secs {
                    if !self.figure_ready {
                        tracing::debug!(elapsed, "loader armed by fallback");
                    }
                    self.after_armed()
                } else {
                    Stage::Arming { elapsed }
                }
            }
            Stage::AwaitingJump { elapsed } => {
                let elapsed = elapsed + dt;
                if self.jump_landed || elapsed >= self.cfg.jump_ack_fallback_secs {
                    self.count(0.0, 0)
                } else {
                    Stage::AwaitingJump { elapsed }
                }
            }
            Stage::Counting { elapsed, next } => self.count(elapsed + dt, next),
            Stage::Exiting { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.cfg.exit_delay_secs {
                    tracing::debug!("site ready");
                    self.bus.publish(ChoreoEvent::SiteReady);
                    Stage::Done
                } else {
                    Stage::Exiting { elapsed }
                }
            }
            Stage::Done => Stage::Done,
        };
    }

    fn after_armed(&mut self) -> Stage {
        if self.jump_landed {
            self.count(0.0, 0)
        } else {
            Stage::AwaitingJump { elapsed: 0.0 }
        }
    }

    /// Publish every integer in `next..=current` and move on once 100 is out.
    fn count(&mut self, elapsed: f64, mut next: u8) -> Stage {
        let fraction = (elapsed / self.cfg.duration_secs).clamp(0.0, 1.0);
        let current = (fraction * 100.0).round() as u8;
        while next <= current {
            self.bus.publish(ChoreoEvent::LoadProgress { percent: next });
            if next == 100 {
                return Stage::Exiting { elapsed: 0.0 };
            }
            next += 1;
        }
        Stage::Counting { elapsed, next }
    }
}

#[cfg(test)]
#[path = "../tests/unit/loader.rs"]
mod tests;
