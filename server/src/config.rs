use std::default::Default;

/// How upstream invariant violations handed to the engine are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    /// Panic on the first violation
    Strict,
    /// Log the violation, drop the offending entity from this flush and carry on
    Lenient,
}

impl Default for ValidationMode {
    fn default() -> Self {
        cfg_if! {
            if #[cfg(debug_assertions)] {
                ValidationMode::Strict
            } else {
                ValidationMode::Lenient
            }
        }
    }
}

/// Contains Config properties which will be used by the synchronization engines
#[derive(Clone, Debug)]
pub struct AwarenessConfig {
    /// What to do when the interest subsystem hands over a visibility set that
    /// breaks containment rules
    pub validation: ValidationMode,
    /// Upper bound on worker threads used to flush observers in one tick
    pub flush_workers: usize,
    /// Trace every directive handed to a connection
    pub log_deltas: bool,
}

impl AwarenessConfig {
    pub fn lenient() -> Self {
        Self {
            validation: ValidationMode::Lenient,
            ..Self::default()
        }
    }
}

impl Default for AwarenessConfig {
    fn default() -> Self {
        Self {
            validation: ValidationMode::default(),
            flush_workers: 4,
            log_deltas: false,
        }
    }
}
