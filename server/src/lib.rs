//! # Aware Server
//! Decides, for each connected observer, which world entities exist on its
//! client, and streams the ordered directives that reconcile the client's view
//! with the server every synchronization tick.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use aware_shared::{
        BaselineScope, ContainmentGraph, CreatureState, Directive, EntityId, EntityKind,
        EntityRecord, GraphSnapshot, Location, ObserverKey, SubscriberRegistry, Transport,
        TransportError, World, WorldError, UNSLOTTED,
    };
}

mod awareness;
mod config;
mod error;
mod observer;
mod observer_scope;
mod server;

pub use awareness::{
    bracket_emitter::{emit_destroys, BracketEmitter},
    delta_builder::{DeltaBuilder, ObserverView},
    sync_engine::{FlushSummary, SyncEngine},
    visibility_set::VisibilitySet,
};
pub use config::{AwarenessConfig, ValidationMode};
pub use error::AwarenessError;
pub use observer::{NoopHooks, Observer, ObserverHooks};
pub use observer_scope::ObserverScopeRef;
pub use server::{AwarenessServer, InterestSource, TickSummary};
