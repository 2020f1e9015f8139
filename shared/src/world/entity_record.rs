use crate::{
    BaselineScope, EntityId, Location, ObserverKey, SlotArrangement, TypeTag, UpdateCount,
    UNSLOTTED,
};

/// State the client needs before a creature can be shown with posture and
/// faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CreatureState {
    pub posture: u8,
    pub faction: u32,
    /// Default pvp flags, used when the observer has no opinion of its own
    pub pvp_flags: u32,
    /// Set once the creature has finished initialization
    pub generated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EntityKind {
    #[default]
    Generic,
    /// A structure whose cells must always be exposed together with it
    Building,
    Cell,
    Creature(CreatureState),
}

impl EntityKind {
    pub fn is_cell(&self) -> bool {
        matches!(self, EntityKind::Cell)
    }

    /// Containers whose children may only ever be exposed as a whole
    pub fn exposes_children_atomically(&self) -> bool {
        matches!(self, EntityKind::Building)
    }

    pub fn generated_creature(&self) -> Option<&CreatureState> {
        match self {
            EntityKind::Creature(state) if state.generated => Some(state),
            _ => None,
        }
    }
}

/// A world entity as seen by the synchronization core.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub type_tag: TypeTag,
    pub location: Location,
    pub parent: Option<EntityId>,
    pub slot_arrangement: SlotArrangement,
    pub baseline_scope: BaselineScope,
    pub kind: EntityKind,
    pub owner: Option<ObserverKey>,
    pub update_count: UpdateCount,
}

impl EntityRecord {
    pub fn new(id: EntityId, type_tag: TypeTag) -> Self {
        Self {
            id,
            type_tag,
            location: Location::ORIGIN,
            parent: None,
            slot_arrangement: UNSLOTTED,
            baseline_scope: BaselineScope::General,
            kind: EntityKind::Generic,
            owner: None,
            update_count: 0,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn within(mut self, parent: EntityId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn slotted(mut self, slot_arrangement: SlotArrangement) -> Self {
        self.slot_arrangement = slot_arrangement;
        self
    }

    pub fn scoped(mut self, baseline_scope: BaselineScope) -> Self {
        self.baseline_scope = baseline_scope;
        self
    }

    pub fn of_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn owned_by(mut self, owner: ObserverKey) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Whether this entity must be created contiguously with `parent` rather
    /// than in a bracket of its own.
    pub fn is_bundled_within(&self, parent: Option<EntityId>, observer_entity: EntityId) -> bool {
        let Some(parent) = parent else {
            return false;
        };
        self.slot_arrangement == UNSLOTTED
            || self.baseline_scope == BaselineScope::Player
            || parent == observer_entity
    }
}
