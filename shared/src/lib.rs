//! # Aware Shared
//! Entity model, containment graph and wire directives shared between the
//! aware synchronization crates.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

mod directive;
mod location;
mod transport;
mod types;
mod world;

pub use directive::Directive;
pub use location::Location;
pub use transport::{error::TransportError, Transport};
pub use types::{
    BaselineScope, EntityId, ObserverKey, SlotArrangement, TypeTag, UpdateCount, UNSLOTTED,
};
pub use world::{
    arena::World,
    entity_record::{CreatureState, EntityKind, EntityRecord},
    error::WorldError,
    graph::{ContainmentGraph, GraphSnapshot, MAX_CONTAINMENT_DEPTH},
    subscribers::SubscriberRegistry,
};
