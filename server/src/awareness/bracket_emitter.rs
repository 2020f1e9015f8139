use aware_shared::{ContainmentGraph, Directive, EntityId, EntityRecord, TransportError};

use crate::observer::Observer;

/// Turns an ordered create list into a directive stream in which every
/// container's scope is opened and closed around its contents.
pub struct BracketEmitter {
    stack: Vec<EntityId>,
    opened: usize,
    closed: usize,
}

impl Default for BracketEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BracketEmitter {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            opened: 0,
            closed: 0,
        }
    }

    /// Number of entities that opened a bracket
    pub fn opened(&self) -> usize {
        self.opened
    }

    pub fn closed(&self) -> usize {
        self.closed
    }

    pub fn open_brackets(&self) -> &[EntityId] {
        &self.stack
    }

    /// Emits the creation directives for `create` and closes every bracket
    /// it opened. Stops at the first failed send.
    pub fn emit_creates<G, S>(
        &mut self,
        graph: &G,
        observer: &Observer,
        create: &[EntityId],
        send: &mut S,
    ) -> Result<(), TransportError>
    where
        G: ContainmentGraph,
        S: FnMut(Directive) -> Result<(), TransportError>,
    {
        for id in create {
            let Some(record) = graph.record(id) else {
                continue;
            };

            let top = self.stack.last().copied();
            let bundled_with_top = record.parent.is_some()
                && record.parent == top
                && record.is_bundled_within(record.parent, observer.entity());

            if !bundled_with_top {
                self.pop_until(record.parent, send)?;
                self.stack.push(*id);
                self.opened += 1;
            }
            emit_entity(record, observer, send)?;
        }
        self.pop_until(None, send)
    }

    fn pop_until<S>(
        &mut self,
        parent: Option<EntityId>,
        send: &mut S,
    ) -> Result<(), TransportError>
    where
        S: FnMut(Directive) -> Result<(), TransportError>,
    {
        while let Some(top) = self.stack.last().copied() {
            if Some(top) == parent {
                break;
            }
            self.stack.pop();
            self.closed += 1;
            send(Directive::CloseBracket(top))?;
        }
        Ok(())
    }
}

/// One `DestroyEntity` per entry, in order. Destroys are never bracketed.
pub fn emit_destroys<S>(destroy: &[EntityId], send: &mut S) -> Result<(), TransportError>
where
    S: FnMut(Directive) -> Result<(), TransportError>,
{
    for id in destroy {
        send(Directive::DestroyEntity(*id))?;
    }
    Ok(())
}

fn emit_entity<S>(
    record: &EntityRecord,
    observer: &Observer,
    send: &mut S,
) -> Result<(), TransportError>
where
    S: FnMut(Directive) -> Result<(), TransportError>,
{
    let id = record.id;

    send(Directive::CreateEntity {
        id,
        location: record.location,
        type_tag: record.type_tag,
    })?;

    send(Directive::SnapshotCore(id))?;
    send(Directive::SnapshotShared(id))?;

    if record.owner == Some(observer.key()) {
        send(Directive::SnapshotPrivate(id))?;
        send(Directive::SnapshotOwnerExtA(id))?;
        send(Directive::SnapshotOwnerExtB(id))?;
    }

    if record.kind.is_cell() {
        send(Directive::CellPermission { flag: 1, id })?;
    }

    if let Some(creature) = record.kind.generated_creature() {
        send(Directive::Posture {
            posture: creature.posture,
            id,
        })?;
        send(Directive::FactionStatus {
            faction: creature.faction,
            id,
            flags: observer.hooks().pvp_flags_for(record),
        })?;
    }

    if let Some(parent) = record.parent {
        send(Directive::Containment {
            child: id,
            parent,
            slot: record.slot_arrangement,
        })?;
    }

    Ok(())
}
