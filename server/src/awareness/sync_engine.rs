use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use log::{debug, info, trace, warn};

use aware_shared::{
    ContainmentGraph, Directive, EntityId, EntityRecord, GraphSnapshot, Location, Transport,
    TransportError, World,
};

use crate::{config::AwarenessConfig, error::AwarenessError, observer::Observer};

use super::{
    bracket_emitter::{emit_destroys, BracketEmitter},
    delta_builder::{report_violation, DeltaBuilder, ObserverView},
    visibility_set::VisibilitySet,
};

/// What one flush changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub created: usize,
    pub destroyed: usize,
    pub transform_sent: bool,
}

impl FlushSummary {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.destroyed == 0 && !self.transform_sent
    }
}

struct EngineState {
    visibility: VisibilitySet,
    pending_transform: Option<Directive>,
    delta: DeltaBuilder,
}

/// The send side of a flush. Bookkeeping is identical for every
/// implementation; only what reaches the wire differs.
trait FlushPhases {
    fn create<G: ContainmentGraph>(
        &mut self,
        graph: &G,
        observer: &Observer,
        create: &[EntityId],
    ) -> Result<(), TransportError>;

    /// Runs between the create and destroy phases. Returns true if a pending
    /// transform went out.
    fn intermediate(
        &mut self,
        pending_transform: &mut Option<Directive>,
    ) -> Result<bool, TransportError>;

    fn destroy(&mut self, destroy: &[EntityId]) -> Result<(), TransportError>;
}

struct NetworkPhases<'t> {
    transport: &'t dyn Transport,
    log_deltas: bool,
}

impl NetworkPhases<'_> {
    fn send(&self, directive: Directive) -> Result<(), TransportError> {
        if self.log_deltas {
            trace!("-> {} {:?}", directive.name(), directive);
        }
        self.transport.send(directive)
    }
}

impl FlushPhases for NetworkPhases<'_> {
    fn create<G: ContainmentGraph>(
        &mut self,
        graph: &G,
        observer: &Observer,
        create: &[EntityId],
    ) -> Result<(), TransportError> {
        let mut emitter = BracketEmitter::new();
        emitter.emit_creates(graph, observer, create, &mut |directive| self.send(directive))
    }

    fn intermediate(
        &mut self,
        pending_transform: &mut Option<Directive>,
    ) -> Result<bool, TransportError> {
        match pending_transform.take() {
            Some(transform) => {
                self.send(transform)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn destroy(&mut self, destroy: &[EntityId]) -> Result<(), TransportError> {
        emit_destroys(destroy, &mut |directive| self.send(directive))
    }
}

/// For observers without a client: nothing is sent and the pending transform
/// is left in place.
struct PassivePhases;

impl FlushPhases for PassivePhases {
    fn create<G: ContainmentGraph>(
        &mut self,
        _: &G,
        _: &Observer,
        _: &[EntityId],
    ) -> Result<(), TransportError> {
        Ok(())
    }

    fn intermediate(&mut self, _: &mut Option<Directive>) -> Result<bool, TransportError> {
        Ok(false)
    }

    fn destroy(&mut self, _: &[EntityId]) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Keeps one observer's client view reconciled with the world.
///
/// Every public operation holds the engine's lock for its full duration, so
/// operations on one observer are serialized while different observers never
/// contend.
pub struct SyncEngine {
    observer: Observer,
    config: AwarenessConfig,
    state: Mutex<EngineState>,
}

impl SyncEngine {
    pub fn new(observer: Observer, config: AwarenessConfig) -> Self {
        let delta = DeltaBuilder::new(config.validation);
        Self {
            observer,
            config,
            state: Mutex::new(EngineState {
                visibility: VisibilitySet::new(),
                pending_transform: None,
                delta,
            }),
        }
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>, AwarenessError> {
        self.state.lock().map_err(|_| AwarenessError::LockPoisoned {
            observer: self.observer.key(),
        })
    }

    /// Replaces any unconsumed transform. It is sent between the create and
    /// destroy phases of the next networked flush.
    pub fn set_pending_transform(
        &self,
        world: &World,
        parent: Option<EntityId>,
        location: Location,
    ) -> Result<(), AwarenessError> {
        let mut state = self.lock()?;
        let id = self.observer.entity();
        let update_count = world.next_update_count(&id)?;
        state.pending_transform = Some(match parent {
            Some(parent) => Directive::TransformWithParent {
                id,
                update_count,
                parent,
                location,
            },
            None => Directive::Transform {
                id,
                update_count,
                location,
            },
        });
        Ok(())
    }

    pub fn has_pending_transform(&self) -> bool {
        self.lock()
            .map(|state| state.pending_transform.is_some())
            .unwrap_or(false)
    }

    /// Reconciles the client behind `transport` with `new_visibility`.
    pub fn flush(
        &self,
        world: &World,
        new_visibility: &[EntityId],
        transport: &dyn Transport,
    ) -> Result<FlushSummary, AwarenessError> {
        let mut phases = NetworkPhases {
            transport,
            log_deltas: self.config.log_deltas,
        };
        self.handle_flush(world, new_visibility, &mut phases)
            .inspect_err(|err| warn!("{}", err))
    }

    /// Advances visibility bookkeeping and subscriptions exactly like
    /// `flush`, without sending anything.
    pub fn flush_passive(
        &self,
        world: &World,
        new_visibility: &[EntityId],
    ) -> Result<FlushSummary, AwarenessError> {
        self.handle_flush(world, new_visibility, &mut PassivePhases)
    }

    /// Forgets everything the client knows about, unsubscribing from all of
    /// it. Returns how many entities were dropped.
    pub fn reset(&self, world: &World) -> Result<usize, AwarenessError> {
        let mut state = self.lock()?;
        let key = self.observer.key();
        let records = state.visibility.drain();
        for record in &records {
            world.subscribers().remove_subscriber(&record.id, &key);
        }
        if !records.is_empty() {
            info!("{} reset, dropped {} visible entities", key, records.len());
        }
        Ok(records.len())
    }

    pub fn is_visible(&self, id: &EntityId) -> bool {
        self.lock()
            .map(|state| state.visibility.contains(id))
            .unwrap_or(false)
    }

    pub fn is_entity_visible(&self, entity: &EntityRecord) -> bool {
        self.is_visible(&entity.id)
    }

    pub fn visible_entities(&self) -> Vec<EntityId> {
        self.lock()
            .map(|state| state.visibility.sorted_ids())
            .unwrap_or_default()
    }

    pub fn visible_count(&self) -> usize {
        self.lock()
            .map(|state| state.visibility.len())
            .unwrap_or(0)
    }

    fn handle_flush<P: FlushPhases>(
        &self,
        world: &World,
        new_visibility: &[EntityId],
        phases: &mut P,
    ) -> Result<FlushSummary, AwarenessError> {
        let mut guard = self.lock()?;
        let EngineState {
            visibility,
            pending_transform,
            delta,
        } = &mut *guard;
        let key = self.observer.key();
        let transport_error = |source: TransportError| AwarenessError::Transport {
            observer: key,
            source,
        };

        // Everything below works on copies taken here
        let old_visibility = visibility.snapshot_ids();
        let new_set: HashSet<EntityId> = new_visibility.iter().copied().collect();
        let observer_entity = self.observer.entity();
        let graph = snapshot_graph(world, visibility, &old_visibility, &new_set, observer_entity)?;
        let view = ObserverView::from_graph(&graph, observer_entity);

        let mut summary = FlushSummary::default();

        // Create
        let create = delta.build_create(&graph, &view, &old_visibility, new_visibility);
        for id in create {
            let Some(record) = graph.record(id) else {
                continue;
            };
            visibility.insert(record.clone());
            world.subscribers().add_subscriber(id, key);
            self.observer.hooks().on_entered_visibility(record);
        }
        summary.created = create.len();
        let aware_after_create = self.verify_self_visibility(visibility, "create");
        phases
            .create(&graph, &self.observer, create)
            .map_err(transport_error)?;

        // Transform
        summary.transform_sent = phases
            .intermediate(pending_transform)
            .map_err(transport_error)?;

        // Destroy
        let destroy = delta.build_destroy(&graph, &view, &old_visibility, &new_set);
        let destroyed: HashSet<EntityId> = destroy.iter().copied().collect();
        let exiting: Vec<EntityId> = visibility
            .records()
            .map(|record| record.id)
            .filter(|id| !graph.is_ancestor_or_self(&observer_entity, id))
            .filter(|id| has_ancestor_or_self_in(&graph, id, &destroyed))
            .collect();
        for id in exiting {
            let Some(record) = visibility.remove(&id) else {
                continue;
            };
            world.subscribers().remove_subscriber(&id, &key);
            self.observer.hooks().on_exited_visibility(&record);
        }
        summary.destroyed = destroy.len();
        phases.destroy(destroy).map_err(transport_error)?;

        if aware_after_create {
            self.verify_self_visibility(visibility, "destroy");
        }

        if !summary.is_empty() {
            debug!(
                "{} flushed: {} created, {} destroyed, {} visible",
                key,
                summary.created,
                summary.destroyed,
                visibility.len()
            );
        }
        Ok(summary)
    }

    /// Reports the observer's own entity or companion missing from its
    /// visibility after `phase`. Returns false if anything was missing.
    fn verify_self_visibility(&self, visibility: &VisibilitySet, phase: &str) -> bool {
        if !self.observer.is_logged_in() || visibility.is_empty() {
            return true;
        }
        let required = std::iter::once(self.observer.entity()).chain(self.observer.companion());
        let mut aware = true;
        for id in required {
            if !visibility.contains(&id) {
                aware = false;
                report_violation(
                    self.config.validation,
                    format!(
                        "{} is not aware of its own entity {} after {}",
                        self.observer.key(),
                        id,
                        phase
                    ),
                );
            }
        }
        aware
    }
}

/// Copies the part of the world this flush looks at. Entities that vanished
/// from the world keep the record they were last synchronized with.
fn snapshot_graph(
    world: &World,
    visibility: &VisibilitySet,
    old_visibility: &HashSet<EntityId>,
    new_visibility: &HashSet<EntityId>,
    observer_entity: EntityId,
) -> Result<GraphSnapshot, AwarenessError> {
    let observer = [observer_entity];
    let mut graph = world.snapshot(
        old_visibility
            .iter()
            .chain(new_visibility.iter())
            .chain(observer.iter()),
    )?;
    for record in visibility.records() {
        graph.insert_if_absent(record.clone());
    }
    Ok(graph)
}

fn has_ancestor_or_self_in<G: ContainmentGraph>(
    graph: &G,
    id: &EntityId,
    destroyed: &HashSet<EntityId>,
) -> bool {
    if destroyed.is_empty() {
        return false;
    }
    destroyed
        .iter()
        .any(|ancestor| graph.is_ancestor_or_self(id, ancestor))
}
