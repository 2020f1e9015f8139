/// Integration tests for flushes cut short by a failing connection.
/// Bookkeeping always runs ahead of the wire, so a client that misses part of
/// a flush is brought back in line by resetting it.
use std::sync::Arc;

use aware_server::{AwarenessConfig, AwarenessError, AwarenessServer, Observer};
use aware_shared::{Directive, Location, ObserverKey, TransportError, World};
use aware_test::{assert_check, check_bracket_balance, ClientMirror, RecordingTransport, TestWorld};

fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

#[test]
fn failure_mid_create_keeps_bookkeeping_and_transform() {
    init_logger();
    let mut test_world = TestWorld::new();
    let (player, companion) = test_world.spawn_player(Location::ORIGIN);
    let chest = test_world.spawn_item(Location::new(4.0, 0.0, 0.0));
    let server = AwarenessServer::new(AwarenessConfig::default());
    let key = ObserverKey::from_u64(1);
    let transport = Arc::new(RecordingTransport::new());
    let engine = server.add_observer(Observer::player(key, player, companion, transport.clone()));
    engine
        .set_pending_transform(test_world.world(), None, Location::new(0.5, 0.0, 0.5))
        .unwrap();

    transport.fail_after(4);
    let interest = test_world.interest(player, &[chest]);
    let visible = interest.clone();
    let source = move |_: &Observer, _: &World| visible.clone();
    let result = server.flush_observer(&key, test_world.world(), &source);

    match result {
        Err(AwarenessError::Transport { observer, source }) => {
            assert_eq!(observer, key);
            assert!(matches!(source, TransportError::ConnectionClosed { .. }));
        }
        other => panic!("expected a transport error, got {:?}", other),
    }
    assert_eq!(transport.take().len(), 4);
    assert_eq!(engine.visible_count(), interest.len());
    assert!(engine.has_pending_transform());

    // with the connection back, the next flush carries only the transform
    transport.heal();
    let summary = server
        .flush_observer(&key, test_world.world(), &source)
        .unwrap();
    assert_eq!(summary.created, 0);
    assert!(summary.transform_sent);
    let sent = transport.take();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Directive::Transform { id, .. } if id == player));
}

#[test]
fn reset_after_failure_resynchronizes_the_client() {
    init_logger();
    let mut test_world = TestWorld::new();
    let (player, companion) = test_world.spawn_player(Location::ORIGIN);
    let (building, _) = test_world.spawn_building(Location::new(12.0, 0.0, 0.0), 2);
    let server = AwarenessServer::new(AwarenessConfig::default());
    let key = ObserverKey::from_u64(1);
    let transport = Arc::new(RecordingTransport::new());
    let engine = server.add_observer(Observer::player(key, player, companion, transport.clone()));
    let interest = test_world.interest(player, &[building]);
    let visible = interest.clone();
    let source = move |_: &Observer, _: &World| visible.clone();

    transport.fail_after(7);
    assert!(server
        .flush_observer(&key, test_world.world(), &source)
        .is_err());
    transport.take();

    // a fresh client is rebuilt from nothing
    transport.heal();
    assert_eq!(engine.reset(test_world.world()).unwrap(), interest.len());
    server
        .flush_observer(&key, test_world.world(), &source)
        .unwrap();
    let sent = transport.take();
    assert_check!(check_bracket_balance(&sent));
    let mut mirror = ClientMirror::new();
    assert_check!(mirror.apply(&sent));
    assert_eq!(mirror.known(), engine.visible_entities());
}

#[test]
fn failing_observer_does_not_hold_up_the_others() {
    init_logger();
    let mut test_world = TestWorld::new();
    let (first, first_companion) = test_world.spawn_player(Location::ORIGIN);
    let (second, second_companion) = test_world.spawn_player(Location::new(2.0, 0.0, 0.0));
    let chest = test_world.spawn_item(Location::new(4.0, 0.0, 0.0));
    let server = AwarenessServer::new(AwarenessConfig::default());

    let broken = Arc::new(RecordingTransport::new());
    broken.fail_after(0);
    let working = Arc::new(RecordingTransport::new());
    server.add_observer(Observer::player(
        ObserverKey::from_u64(1),
        first,
        first_companion,
        broken.clone(),
    ));
    server.add_observer(Observer::player(
        ObserverKey::from_u64(2),
        second,
        second_companion,
        working.clone(),
    ));

    let source = |observer: &Observer, world: &World| {
        let mut visible = vec![observer.entity(), chest];
        visible.extend(observer.companion());
        visible.retain(|id| world.contains(id));
        visible
    };
    let tick = server.flush_all(test_world.world(), &source);

    assert_eq!(tick.flushed, 1);
    assert_eq!(tick.failed, 1);
    assert_eq!(tick.created, 3);
    assert!(working.sent_count() > 0);
    assert!(server.observer_scope(&ObserverKey::from_u64(1)).has(&chest));
}
