use crate::{EntityId, Location, SlotArrangement, TypeTag, UpdateCount};

/// A single instruction to an observer's client.
///
/// Only the ordering of directives is part of the synchronization contract;
/// turning a directive into bytes is left to the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    /// Makes the entity exist on the client and opens its scope.
    CreateEntity {
        id: EntityId,
        location: Location,
        type_tag: TypeTag,
    },
    SnapshotCore(EntityId),
    SnapshotShared(EntityId),
    /// Owner-only snapshots. Sent only to the observer that owns the entity.
    SnapshotPrivate(EntityId),
    SnapshotOwnerExtA(EntityId),
    SnapshotOwnerExtB(EntityId),
    CellPermission {
        flag: u8,
        id: EntityId,
    },
    Posture {
        posture: u8,
        id: EntityId,
    },
    FactionStatus {
        faction: u32,
        id: EntityId,
        flags: u32,
    },
    Containment {
        child: EntityId,
        parent: EntityId,
        slot: SlotArrangement,
    },
    /// Closes the scope opened by the matching `CreateEntity`.
    CloseBracket(EntityId),
    DestroyEntity(EntityId),
    Transform {
        id: EntityId,
        update_count: UpdateCount,
        location: Location,
    },
    TransformWithParent {
        id: EntityId,
        update_count: UpdateCount,
        parent: EntityId,
        location: Location,
    },
}

impl Directive {
    /// The entity this directive is about.
    pub fn entity(&self) -> EntityId {
        match self {
            Directive::CreateEntity { id, .. }
            | Directive::SnapshotCore(id)
            | Directive::SnapshotShared(id)
            | Directive::SnapshotPrivate(id)
            | Directive::SnapshotOwnerExtA(id)
            | Directive::SnapshotOwnerExtB(id)
            | Directive::CellPermission { id, .. }
            | Directive::Posture { id, .. }
            | Directive::FactionStatus { id, .. }
            | Directive::CloseBracket(id)
            | Directive::DestroyEntity(id)
            | Directive::Transform { id, .. }
            | Directive::TransformWithParent { id, .. } => *id,
            Directive::Containment { child, .. } => *child,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Directive::CreateEntity { .. } => "CreateEntity",
            Directive::SnapshotCore(_) => "SnapshotCore",
            Directive::SnapshotShared(_) => "SnapshotShared",
            Directive::SnapshotPrivate(_) => "SnapshotPrivate",
            Directive::SnapshotOwnerExtA(_) => "SnapshotOwnerExtA",
            Directive::SnapshotOwnerExtB(_) => "SnapshotOwnerExtB",
            Directive::CellPermission { .. } => "CellPermission",
            Directive::Posture { .. } => "Posture",
            Directive::FactionStatus { .. } => "FactionStatus",
            Directive::Containment { .. } => "Containment",
            Directive::CloseBracket(_) => "CloseBracket",
            Directive::DestroyEntity(_) => "DestroyEntity",
            Directive::Transform { .. } => "Transform",
            Directive::TransformWithParent { .. } => "TransformWithParent",
        }
    }
}
