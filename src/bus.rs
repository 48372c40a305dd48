//! Typed publish/subscribe registry shared by every component of a [`crate::Stage`].
//!
//! Dispatch is synchronous and in registration order. Callbacks may subscribe or
//! unsubscribe (including themselves) while an event is being dispatched: dispatch
//! runs over a snapshot, and entries removed mid-dispatch are skipped if they have
//! not run yet.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::{Rc, Weak},
};

use crate::{
    foundation::core::{DVec3, ElementRef, LetterId, SectionId},
    state::Phase,
};

/// Discriminant of a [`ChoreoEvent`], used as the subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum EventKind {
    /// See [`ChoreoEvent::FigureReady`].
    FigureReady,
    /// See [`ChoreoEvent::SeatedClipFinished`].
    SeatedClipFinished,
    /// See [`ChoreoEvent::JumpComplete`].
    JumpComplete,
    /// See [`ChoreoEvent::LoadProgress`].
    LoadProgress,
    /// See [`ChoreoEvent::SiteReady`].
    SiteReady,
    /// See [`ChoreoEvent::LandedOnSection`].
    LandedOnSection,
    /// See [`ChoreoEvent::PickedUpFromSection`].
    PickedUpFromSection,
    /// See [`ChoreoEvent::SectionTransitionMidpoint`].
    SectionTransitionMidpoint,
    /// See [`ChoreoEvent::ProxyCollision`].
    ProxyCollision,
    /// See [`ChoreoEvent::ProxyNear`].
    ProxyNear,
    /// See [`ChoreoEvent::PhaseChanged`].
    PhaseChanged,
    /// See [`ChoreoEvent::LetterSpawned`].
    LetterSpawned,
    /// See [`ChoreoEvent::LetterRetired`].
    LetterRetired,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 13] = [
        Self::FigureReady,
        Self::SeatedClipFinished,
        Self::JumpComplete,
        Self::LoadProgress,
        Self::SiteReady,
        Self::LandedOnSection,
        Self::PickedUpFromSection,
        Self::SectionTransitionMidpoint,
        Self::ProxyCollision,
        Self::ProxyNear,
        Self::PhaseChanged,
        Self::LetterSpawned,
        Self::LetterRetired,
    ];
}

/// Edge of a proxy overlap latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionEdge {
    /// The figure entered the padded proxy box.
    Enter,
    /// The figure left the padded proxy box.
    Exit,
}

/// Every event carried by the bus.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ChoreoEvent {
    /// The figure's model is loaded and its seated clip started.
    FigureReady,
    /// The seated clip played to its end.
    SeatedClipFinished,
    /// The jump onto the loading bar landed.
    JumpComplete,
    /// Loader progress, emitted once per distinct integer percent.
    LoadProgress {
        /// Percent in `[0, 100]`.
        percent: u8,
    },
    /// Loading sequence complete; main content revealed.
    SiteReady,
    /// The figure landed on a section's text.
    LandedOnSection {
        /// Landing section.
        section: SectionId,
    },
    /// The figure stood back up, releasing the section's text.
    PickedUpFromSection {
        /// Section being released.
        section: SectionId,
    },
    /// A swing crossed the midpoint of its arc.
    SectionTransitionMidpoint {
        /// Destination section.
        to: SectionId,
        /// Swing start point in world space.
        start: DVec3,
        /// Swing end point in world space.
        end: DVec3,
    },
    /// Figure entered or left a text proxy.
    ProxyCollision {
        /// Host element mirrored by the proxy.
        element: ElementRef,
        /// Stable proxy id.
        proxy_id: String,
        /// Enter or exit.
        edge: CollisionEdge,
    },
    /// A directional ray from the figure hit a text proxy.
    ProxyNear {
        /// Host element mirrored by the proxy.
        element: ElementRef,
        /// Stable proxy id.
        proxy_id: String,
        /// `1 - distance / reach`, in `[0, 1]`.
        proximity: f64,
    },
    /// The phase machine changed phase.
    PhaseChanged {
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// A physics letter was spawned.
    LetterSpawned {
        /// Letter body id.
        id: LetterId,
        /// Rendered glyph.
        glyph: char,
    },
    /// A physics letter faded out and was removed.
    LetterRetired {
        /// Letter body id (never reused).
        id: LetterId,
    },
}

impl ChoreoEvent {
    /// Subscription key of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::FigureReady => EventKind::FigureReady,
            Self::SeatedClipFinished => EventKind::SeatedClipFinished,
            Self::JumpComplete => EventKind::JumpComplete,
            Self::LoadProgress { .. } => EventKind::LoadProgress,
            Self::SiteReady => EventKind::SiteReady,
            Self::LandedOnSection { .. } => EventKind::LandedOnSection,
            Self::PickedUpFromSection { .. } => EventKind::PickedUpFromSection,
            Self::SectionTransitionMidpoint { .. } => EventKind::SectionTransitionMidpoint,
            Self::ProxyCollision { .. } => EventKind::ProxyCollision,
            Self::ProxyNear { .. } => EventKind::ProxyNear,
            Self::PhaseChanged { .. } => EventKind::PhaseChanged,
            Self::LetterSpawned { .. } => EventKind::LetterSpawned,
            Self::LetterRetired { .. } => EventKind::LetterRetired,
        }
    }
}

type Callback = Rc<RefCell<dyn FnMut(&ChoreoEvent)>>;

struct Entry {
    id: u64,
    kind: EventKind,
    callback: Callback,
    live: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Registry {
    next_id: Cell<u64>,
    entries: RefCell<Vec<Entry>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|e| e.id != id);
    }
}

/// Cheaply clonable handle to one registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<Registry>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.registry.entries.borrow().len())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every callback currently subscribed to its kind.
    pub fn publish(&self, event: ChoreoEvent) {
        let kind = event.kind();
        let snapshot: Vec<(Callback, Rc<Cell<bool>>)> = self
            .registry
            .entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| (Rc::clone(&e.callback), Rc::clone(&e.live)))
            .collect();

        for (callback, live) in snapshot {
            if !live.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut cb) => (&mut *cb)(&event),
                Err(_) => tracing::trace!(?kind, "skipping re-entrant subscriber"),
            }
        }
    }

    /// Register `callback` for events of `kind`.
    ///
    /// The callback stays registered until the returned handle is unsubscribed or dropped.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl FnMut(&ChoreoEvent) + 'static,
    ) -> Subscription {
        let id = self.registry.next_id.get();
        self.registry.next_id.set(id + 1);
        let live = Rc::new(Cell::new(true));
        self.registry.entries.borrow_mut().push(Entry {
            id,
            kind,
            callback: Rc::new(RefCell::new(callback)),
            live: Rc::clone(&live),
        });
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
            live,
        }
    }

    /// Queue every event of the given kinds into an [`Inbox`].
    pub fn inbox(&self, kinds: &[EventKind]) -> Inbox {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        let subscriptions = kinds
            .iter()
            .map(|&kind| {
                let queue = Rc::clone(&queue);
                self.subscribe(kind, move |ev| queue.borrow_mut().push_back(ev.clone()))
            })
            .collect();
        Inbox {
            queue,
            subscriptions,
        }
    }

    /// Number of live subscribers for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind && e.live.get())
            .count()
    }
}

/// Registration handle returned by [`EventBus::subscribe`]. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
    live: Rc<Cell<bool>>,
}

impl Subscription {
    /// Remove the callback. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.live.replace(false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }

    /// `true` until unsubscribed.
    pub fn is_active(&self) -> bool {
        self.live.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// FIFO of bus events for a component that consumes them during its frame step.
pub struct Inbox {
    queue: Rc<RefCell<VecDeque<ChoreoEvent>>>,
    subscriptions: Vec<Subscription>,
}

impl Inbox {
    /// Take every queued event in arrival order.
    pub fn drain(&self) -> Vec<ChoreoEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Unsubscribe from every kind and discard queued events. Idempotent.
    pub fn close(&self) {
        for sub in &self.subscriptions {
            sub.unsubscribe();
        }
        self.queue.borrow_mut().clear();
    }
}

impl std::fmt::Debug for Inbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox")
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/unit/bus.rs"]
mod tests;
