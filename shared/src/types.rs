use std::fmt;

pub type TypeTag = u32;
pub type SlotArrangement = i32;
pub type UpdateCount = u32;

/// Slot arrangement of an entity that is bundled with its container instead
/// of occupying a concrete slot.
pub const UNSLOTTED: SlotArrangement = -1;

// EntityId
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    pub fn from_u64(value: u64) -> Self {
        EntityId(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ObserverKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ObserverKey(u64);

impl ObserverKey {
    pub fn from_u64(value: u64) -> Self {
        ObserverKey(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Which baseline family an entity belongs to. `Player` baselines always
/// travel together with their container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BaselineScope {
    #[default]
    General,
    Player,
}
