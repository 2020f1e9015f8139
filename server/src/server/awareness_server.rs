use std::{
    collections::HashMap,
    panic,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread,
};

use log::{info, warn};

use aware_shared::{EntityId, ObserverKey, World};

use crate::{
    awareness::sync_engine::{FlushSummary, SyncEngine},
    AwarenessConfig, AwarenessError, Observer, ObserverScopeRef,
};

/// Supplies, per observer per tick, the raw set of entities its client
/// should know about.
pub trait InterestSource: Sync {
    fn visible_to(&self, observer: &Observer, world: &World) -> Vec<EntityId>;
}

impl<F> InterestSource for F
where
    F: Fn(&Observer, &World) -> Vec<EntityId> + Sync,
{
    fn visible_to(&self, observer: &Observer, world: &World) -> Vec<EntityId> {
        self(observer, world)
    }
}

/// Outcome of one synchronization tick across all observers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub flushed: usize,
    pub failed: usize,
    pub created: usize,
    pub destroyed: usize,
}

impl TickSummary {
    fn record(&mut self, result: &Result<FlushSummary, AwarenessError>) {
        match result {
            Ok(summary) => {
                self.flushed += 1;
                self.created += summary.created;
                self.destroyed += summary.destroyed;
            }
            Err(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: TickSummary) {
        self.flushed += other.flushed;
        self.failed += other.failed;
        self.created += other.created;
        self.destroyed += other.destroyed;
    }
}

/// Owns one synchronization engine per observer and drives them each tick.
pub struct AwarenessServer {
    config: AwarenessConfig,
    engines: RwLock<HashMap<ObserverKey, Arc<SyncEngine>>>,
}

impl AwarenessServer {
    pub fn new(config: AwarenessConfig) -> Self {
        Self {
            config,
            engines: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AwarenessConfig {
        &self.config
    }

    fn engines(&self) -> RwLockReadGuard<'_, HashMap<ObserverKey, Arc<SyncEngine>>> {
        self.engines
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn engines_mut(&self) -> RwLockWriteGuard<'_, HashMap<ObserverKey, Arc<SyncEngine>>> {
        self.engines
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers an observer with an empty view. An observer already
    /// registered under the same key is replaced without being reset.
    pub fn add_observer(&self, observer: Observer) -> Arc<SyncEngine> {
        let key = observer.key();
        let engine = Arc::new(SyncEngine::new(observer, self.config.clone()));
        if self.engines_mut().insert(key, engine.clone()).is_some() {
            warn!("{} registered twice, replacing its engine", key);
        } else {
            info!("{} registered", key);
        }
        engine
    }

    /// Unsubscribes the observer from everything it sees and forgets it.
    pub fn remove_observer(&self, key: &ObserverKey, world: &World) -> Result<(), AwarenessError> {
        let Some(engine) = self.engines_mut().remove(key) else {
            return Err(AwarenessError::ObserverNotFound { observer: *key });
        };
        engine.reset(world)?;
        info!("{} removed", key);
        Ok(())
    }

    pub fn engine(&self, key: &ObserverKey) -> Option<Arc<SyncEngine>> {
        self.engines().get(key).cloned()
    }

    pub fn observer_count(&self) -> usize {
        self.engines().len()
    }

    pub fn observer_scope(&'_ self, key: &ObserverKey) -> ObserverScopeRef<'_> {
        ObserverScopeRef::new(self, key)
    }

    /// Flushes a single observer: networked when it has a connection,
    /// passive otherwise.
    pub fn flush_observer(
        &self,
        key: &ObserverKey,
        world: &World,
        interest: &dyn InterestSource,
    ) -> Result<FlushSummary, AwarenessError> {
        let Some(engine) = self.engine(key) else {
            return Err(AwarenessError::ObserverNotFound { observer: *key });
        };
        flush_engine(&engine, world, interest)
    }

    /// Runs one synchronization tick for every observer, spread over at most
    /// `flush_workers` threads. A failing observer is logged and counted; it
    /// never holds up the others.
    pub fn flush_all(&self, world: &World, interest: &dyn InterestSource) -> TickSummary {
        let mut engines: Vec<Arc<SyncEngine>> = self.engines().values().cloned().collect();
        if engines.is_empty() {
            return TickSummary::default();
        }
        engines.sort_by_key(|engine| engine.observer().key());

        let workers = self.config.flush_workers.clamp(1, engines.len());
        let chunk_size = engines.len().div_ceil(workers);

        thread::scope(|scope| {
            let handles: Vec<_> = engines
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        let mut summary = TickSummary::default();
                        for engine in chunk {
                            let result = flush_engine(engine, world, interest);
                            summary.record(&result);
                        }
                        summary
                    })
                })
                .collect();

            let mut total = TickSummary::default();
            for handle in handles {
                match handle.join() {
                    Ok(summary) => total.merge(summary),
                    Err(payload) => panic::resume_unwind(payload),
                }
            }
            total
        })
    }
}

fn flush_engine(
    engine: &SyncEngine,
    world: &World,
    interest: &dyn InterestSource,
) -> Result<FlushSummary, AwarenessError> {
    let observer = engine.observer();
    let new_visibility = interest.visible_to(observer, world);
    match observer.connection() {
        Some(connection) => engine.flush(world, &new_visibility, connection.as_ref()),
        None => engine.flush_passive(world, &new_visibility),
    }
}
