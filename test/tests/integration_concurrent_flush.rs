/// Integration tests for ticks that flush many observers on worker threads
/// while they share entities.
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
};

use aware_server::{AwarenessConfig, AwarenessServer, Observer};
use aware_shared::{EntityId, Location, ObserverKey, World};
use aware_test::{assert_check, check_subscriptions, subtree, RecordingTransport, TestWorld};

const OBSERVERS: u64 = 24;
const TICKS: u64 = 10;

fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init()
        .ok();
}

/// Each observer sees its own structure plus a pseudo-random share of the
/// world that changes every tick.
struct RotatingInterest {
    roots: Vec<EntityId>,
    tick: AtomicU64,
}

impl RotatingInterest {
    fn visible(&self, observer: &Observer, world: &World) -> Vec<EntityId> {
        let tick = self.tick.load(Ordering::SeqCst);
        let rng = fastrand::Rng::with_seed(tick * 1_000 + observer.key().to_u64());
        let mut visible = subtree(world, observer.entity());
        for root in &self.roots {
            if rng.bool() {
                visible.extend(subtree(world, *root));
            }
        }
        visible
    }
}

fn populate(test_world: &mut TestWorld) {
    for index in 0..OBSERVERS {
        test_world.spawn_player(Location::new(index as f64, 0.0, 0.0));
    }
    for index in 0..8 {
        let location = Location::new(0.0, 0.0, index as f64 * 5.0);
        if index % 2 == 0 {
            test_world.spawn_building(location, 3);
        } else {
            let chest = test_world.spawn_item(location);
            test_world.spawn_child(chest, -1);
            test_world.spawn_child(chest, 1);
        }
    }
}

#[test]
fn concurrent_ticks_keep_subscriptions_consistent() {
    init_logger();
    let mut test_world = TestWorld::new();
    populate(&mut test_world);
    let server = AwarenessServer::new(AwarenessConfig {
        flush_workers: 6,
        ..AwarenessConfig::default()
    });
    let mut transports = Vec::new();
    for (index, (player, companion)) in test_world.players().iter().enumerate() {
        let transport = Arc::new(RecordingTransport::new());
        server.add_observer(Observer::player(
            ObserverKey::from_u64(index as u64 + 1),
            *player,
            *companion,
            transport.clone(),
        ));
        transports.push(transport);
    }
    let interest = RotatingInterest {
        roots: test_world.roots().to_vec(),
        tick: AtomicU64::new(0),
    };
    let source = |observer: &Observer, world: &World| interest.visible(observer, world);

    for tick in 0..TICKS {
        interest.tick.store(tick, Ordering::SeqCst);
        let summary = server.flush_all(test_world.world(), &source);
        assert_eq!(summary.flushed, OBSERVERS as usize);
        assert_eq!(summary.failed, 0);

        for key in 1..=OBSERVERS {
            let engine = server.engine(&ObserverKey::from_u64(key)).unwrap();
            assert_check!(check_subscriptions(
                test_world.world(),
                &engine,
                test_world.entities()
            ));
            let mut expected = interest.visible(engine.observer(), test_world.world());
            expected.sort();
            assert_eq!(engine.visible_entities(), expected);
        }
    }

    // every shared entity counts each observer that sees it exactly once
    for id in test_world.entities() {
        let seen_by = (1..=OBSERVERS)
            .filter(|key| server.observer_scope(&ObserverKey::from_u64(*key)).has(id))
            .count();
        assert_eq!(test_world.world().subscribers().subscriber_count(id), seen_by);
    }
}

#[test]
fn observers_flushed_from_many_threads_stay_serialized() {
    init_logger();
    let mut test_world = TestWorld::new();
    populate(&mut test_world);
    let (player, companion) = test_world.player();
    let server = AwarenessServer::new(AwarenessConfig::default());
    let key = ObserverKey::from_u64(1);
    let transport = Arc::new(RecordingTransport::new());
    let engine = server.add_observer(Observer::player(key, player, companion, transport.clone()));
    let everything = test_world.interest(player, test_world.roots());

    thread::scope(|scope| {
        for round in 0..8 {
            let engine = engine.clone();
            let world = test_world.world();
            let everything = &everything;
            scope.spawn(move || {
                let visible = if round % 2 == 0 {
                    everything.clone()
                } else {
                    vec![player, companion]
                };
                engine.flush(world, &visible, &RecordingTransport::new()).unwrap();
            });
        }
    });

    engine.flush(test_world.world(), &everything, &*transport).unwrap();
    assert_check!(check_subscriptions(
        test_world.world(),
        &engine,
        test_world.entities()
    ));
    let mut expected = everything.clone();
    expected.sort();
    assert_eq!(engine.visible_entities(), expected);
}
