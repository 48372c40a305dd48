use super::*;

fn counter(bus: &EventBus, kind: EventKind) -> (Rc<Cell<u32>>, Subscription) {
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let sub = bus.subscribe(kind, move |_| h.set(h.get() + 1));
    (hits, sub)
}

#[test]
fn publish_reaches_subscribers_in_registration_order() {
    let bus = EventBus::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let subs: Vec<_> = (0..3)
        .map(|i| {
            let order = Rc::clone(&order);
            bus.subscribe(EventKind::SiteReady, move |_| order.borrow_mut().push(i))
        })
        .collect();
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
    drop(subs);
}

#[test]
fn publish_only_matches_kind() {
    let bus = EventBus::new();
    let (hits, _sub) = counter(&bus, EventKind::JumpComplete);
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(hits.get(), 0);
    bus.publish(ChoreoEvent::JumpComplete);
    assert_eq!(hits.get(), 1);
}

#[test]
fn late_subscribers_get_no_replay() {
    let bus = EventBus::new();
    bus.publish(ChoreoEvent::FigureReady);
    let (hits, _sub) = counter(&bus, EventKind::FigureReady);
    assert_eq!(hits.get(), 0);
}

#[test]
fn drop_and_unsubscribe_remove_callbacks() {
    let bus = EventBus::new();
    let (hits, sub) = counter(&bus, EventKind::SiteReady);
    sub.unsubscribe();
    sub.unsubscribe();
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(hits.get(), 0);

    let (hits, sub) = counter(&bus, EventKind::SiteReady);
    drop(sub);
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(hits.get(), 0);
    assert_eq!(bus.subscriber_count(EventKind::SiteReady), 0);
}

#[test]
fn unsubscribing_a_later_callback_mid_dispatch_skips_it() {
    let bus = EventBus::new();
    let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let v = Rc::clone(&victim);
    let _killer = bus.subscribe(EventKind::SiteReady, move |_| {
        if let Some(sub) = v.borrow_mut().take() {
            sub.unsubscribe();
        }
    });
    let (hits, sub) = counter(&bus, EventKind::SiteReady);
    *victim.borrow_mut() = Some(sub);
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(hits.get(), 0);
}

#[test]
fn subscribing_mid_dispatch_does_not_join_current_dispatch() {
    let bus = EventBus::new();
    let added: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
    let late_hits = Rc::new(Cell::new(0));
    let (b, a, lh) = (bus.clone(), Rc::clone(&added), Rc::clone(&late_hits));
    let _spawner = bus.subscribe(EventKind::JumpComplete, move |_| {
        let lh = Rc::clone(&lh);
        a.borrow_mut()
            .push(b.subscribe(EventKind::JumpComplete, move |_| lh.set(lh.get() + 1)));
    });
    bus.publish(ChoreoEvent::JumpComplete);
    assert_eq!(late_hits.get(), 0);
    bus.publish(ChoreoEvent::JumpComplete);
    assert_eq!(late_hits.get(), 1);
}

#[test]
fn recursive_publish_skips_the_running_callback() {
    let bus = EventBus::new();
    let hits = Rc::new(Cell::new(0));
    let (b, h) = (bus.clone(), Rc::clone(&hits));
    let _sub = bus.subscribe(EventKind::SiteReady, move |_| {
        h.set(h.get() + 1);
        b.publish(ChoreoEvent::SiteReady);
    });
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(hits.get(), 1);
}

#[test]
fn subscription_outliving_bus_is_harmless() {
    let bus = EventBus::new();
    let (_hits, sub) = counter(&bus, EventKind::SiteReady);
    drop(bus);
    sub.unsubscribe();
    assert!(!sub.is_active());
}

#[test]
fn inbox_queues_matching_kinds() {
    let bus = EventBus::new();
    let inbox = bus.inbox(&[EventKind::LoadProgress, EventKind::SiteReady]);
    bus.publish(ChoreoEvent::LoadProgress { percent: 3 });
    bus.publish(ChoreoEvent::JumpComplete);
    bus.publish(ChoreoEvent::SiteReady);
    assert_eq!(
        inbox.drain(),
        vec![ChoreoEvent::LoadProgress { percent: 3 }, ChoreoEvent::SiteReady]
    );
    assert!(inbox.is_empty());
    drop(inbox);
    assert_eq!(bus.subscriber_count(EventKind::SiteReady), 0);
}

#[test]
fn closed_inbox_stops_listening_and_drops_its_queue() {
    let bus = EventBus::new();
    let inbox = bus.inbox(&[EventKind::SiteReady]);
    bus.publish(ChoreoEvent::SiteReady);
    inbox.close();
    assert!(inbox.is_empty());
    assert_eq!(bus.subscriber_count(EventKind::SiteReady), 0);

    bus.publish(ChoreoEvent::SiteReady);
    assert!(inbox.drain().is_empty());
    inbox.close();
}
