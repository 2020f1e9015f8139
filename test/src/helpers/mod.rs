pub mod client_mirror;
pub mod recording_transport;

pub use assertions::{check_bracket_balance, check_disjoint, check_subscriptions};
pub use client_mirror::ClientMirror;
pub use recording_hooks::RecordingHooks;
pub use recording_transport::RecordingTransport;

/// Assert that a stream check passes, reporting which one failed
#[macro_export]
macro_rules! assert_check {
    ($check:expr) => {
        if let Err(message) = $check {
            panic!("{} failed: {}", stringify!($check), message);
        }
    };
}
