mod awareness_server;

pub use awareness_server::{AwarenessServer, InterestSource, TickSummary};
