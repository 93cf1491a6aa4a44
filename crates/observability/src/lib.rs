//! Process-wide tracing/logging setup shared by binaries and tests.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize logging using `LOG_FORMAT` and `RUST_LOG` from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init(LogFormat::from_env());
}

/// Initialize logging with an explicit output format.
pub fn init_with(format: LogFormat) {
    subscriber::init(format);
}
