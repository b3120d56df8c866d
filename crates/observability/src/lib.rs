//! Process-wide tracing setup.

/// Initialize tracing for the process.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init(subscriber::LogFormat::from_env());
}

pub mod subscriber;
