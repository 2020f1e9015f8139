use std::{cmp::Ordering, collections::HashSet};

use log::{debug, error};

use aware_shared::{ContainmentGraph, EntityId, EntityRecord, Location, MAX_CONTAINMENT_DEPTH};

use crate::config::ValidationMode;

/// Where the observer stands, as seen by one delta computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverView {
    /// The entity the observer controls
    pub entity: EntityId,
    pub world_location: Location,
}

impl ObserverView {
    pub fn new(entity: EntityId, world_location: Location) -> Self {
        Self {
            entity,
            world_location,
        }
    }

    /// Reads the observer's world location out of `graph`: the location of
    /// its outermost known container.
    pub fn from_graph<G: ContainmentGraph>(graph: &G, entity: EntityId) -> Self {
        let mut world_location = Location::ORIGIN;
        let mut current = graph.record(&entity);
        let mut steps = 0;
        while let Some(record) = current {
            world_location = record.location;
            steps += 1;
            if steps > MAX_CONTAINMENT_DEPTH {
                break;
            }
            current = record.parent.and_then(|parent| graph.record(&parent));
        }
        Self::new(entity, world_location)
    }

    /// Distance used to order uncontained entities. Contained entities are
    /// always at distance 0.
    pub fn distance_to(&self, record: &EntityRecord) -> f64 {
        if record.parent.is_some() {
            0.0
        } else {
            self.world_location.distance_to(&record.location)
        }
    }
}

/// Computes the ordered create and destroy lists between two visibility
/// snapshots. Holds nothing but scratch buffers that are reused across
/// flushes.
pub struct DeltaBuilder {
    validation: ValidationMode,
    create: Vec<EntityId>,
    destroy: Vec<EntityId>,
    placed: HashSet<EntityId>,
    candidates: Vec<(EntityId, usize, f64)>,
}

impl DeltaBuilder {
    pub fn new(validation: ValidationMode) -> Self {
        Self {
            validation,
            create: Vec::new(),
            destroy: Vec::new(),
            placed: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    /// Entities to create on the client, parents before their children and
    /// bundled children directly behind their container.
    ///
    /// `new_visibility` is taken in the interest subsystem's order, which
    /// decides ties between equally deep, equally distant entities.
    pub fn build_create<G: ContainmentGraph>(
        &mut self,
        graph: &G,
        view: &ObserverView,
        old_visibility: &HashSet<EntityId>,
        new_visibility: &[EntityId],
    ) -> &[EntityId] {
        self.create.clear();
        self.placed.clear();
        self.candidates.clear();

        let mut added = HashSet::new();
        for id in new_visibility {
            if old_visibility.contains(id) || !added.insert(*id) {
                continue;
            }
            let Some(record) = graph.record(id) else {
                debug!("entity {} left the world before it could be created", id);
                continue;
            };
            self.candidates
                .push((*id, graph.depth(id), view.distance_to(record)));
        }
        self.candidates.sort_by(compare_candidates);

        for &(id, _, _) in &self.candidates {
            let Some(record) = graph.record(&id) else {
                continue;
            };
            let parent = record.parent;

            if let Some(parent) = parent {
                if !old_visibility.contains(&parent) && !self.placed.contains(&parent) {
                    if record.kind.is_cell() {
                        report_violation(
                            self.validation,
                            format!("cell {} exposed without its building {}", id, parent),
                        );
                    } else {
                        debug!("deferring {}: container {} is not visible yet", id, parent);
                    }
                    continue;
                }
            }

            if record.kind.exposes_children_atomically() {
                let missing: Vec<EntityId> = graph
                    .children(&id)
                    .into_iter()
                    .filter(|child| !added.contains(child))
                    .collect();
                if !missing.is_empty() {
                    report_violation(
                        self.validation,
                        format!(
                            "{} exposed without all of its children: missing {:?}",
                            id, missing
                        ),
                    );
                }
            }

            let bundled = record.is_bundled_within(parent, view.entity);
            let parent_slot = match parent {
                Some(parent) if bundled && !old_visibility.contains(&parent) => {
                    self.create.iter().position(|placed| *placed == parent)
                }
                _ => None,
            };
            match parent_slot {
                Some(position) => self.create.insert(position + 1, id),
                None => self.create.push(id),
            }
            self.placed.insert(id);
        }

        &self.create
    }

    /// Entities to destroy on the client. Never includes anything the
    /// observer is standing in, nor a child whose direct container is
    /// destroyed in the same list.
    pub fn build_destroy<G: ContainmentGraph>(
        &mut self,
        graph: &G,
        view: &ObserverView,
        old_visibility: &HashSet<EntityId>,
        new_visibility: &HashSet<EntityId>,
    ) -> &[EntityId] {
        self.destroy.clear();
        self.placed.clear();
        self.candidates.clear();

        let mut removed: Vec<EntityId> = old_visibility
            .iter()
            .filter(|id| !new_visibility.contains(id))
            .filter(|id| !graph.is_ancestor_or_self(&view.entity, id))
            .copied()
            .collect();
        removed.sort();
        for id in removed {
            let distance = graph
                .record(&id)
                .map(|record| view.distance_to(record))
                .unwrap_or(0.0);
            self.candidates.push((id, graph.depth(&id), distance));
        }
        self.candidates.sort_by(compare_candidates);

        // `placed` mirrors `destroy`; only a direct parent in it covers a child
        for &(id, _, _) in &self.candidates {
            let covered = graph
                .parent(&id)
                .map(|parent| self.placed.contains(&parent))
                .unwrap_or(false);
            if !covered {
                self.placed.insert(id);
                self.destroy.push(id);
            }
        }

        &self.destroy
    }
}

fn compare_candidates(a: &(EntityId, usize, f64), b: &(EntityId, usize, f64)) -> Ordering {
    a.1.cmp(&b.1).then_with(|| a.2.total_cmp(&b.2))
}

pub(crate) fn report_violation(validation: ValidationMode, message: String) {
    match validation {
        ValidationMode::Strict => panic!("visibility invariant violated: {}", message),
        ValidationMode::Lenient => error!("visibility invariant violated: {}", message),
    }
}
