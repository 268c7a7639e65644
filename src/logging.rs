//! Logging macros that set target to "docdb_auth" for all log calls.
//!
//! Without an explicit target, tracing uses the full module path
//! (e.g., "docdb_auth::auth::sasl"), creating overly verbose logger names
//! for hosts that map targets onto their own logger hierarchy. These macros
//! ensure all logs from this crate use a single "docdb_auth" target.

macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!(target: "docdb_auth", $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!(target: "docdb_auth", $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { ::tracing::info!(target: "docdb_auth", $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { ::tracing::warn!(target: "docdb_auth", $($arg)*) };
}

macro_rules! error {
    ($($arg:tt)*) => { ::tracing::error!(target: "docdb_auth", $($arg)*) };
}
