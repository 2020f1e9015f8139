pub mod arena;
pub mod entity_record;
pub mod error;
pub mod graph;
pub mod subscribers;
