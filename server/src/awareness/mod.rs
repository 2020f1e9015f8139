pub mod bracket_emitter;
pub mod delta_builder;
pub mod sync_engine;
pub mod visibility_set;

mod tests;
