//! Process exit codes.
//!
//! Library failures keep the code their [`ProxyError`] variant carries, so
//! scripts can tell a misconfiguration from an unreachable origin.

use offline_proxy::ProxyError;

pub const SUCCESS: i32 = 0;
pub const GENERAL_ERROR: i32 = 1; // Anything not raised by the proxy itself
pub const INCOMPLETE_INSTALL: i32 = 4; // Install finished with skipped entries

/// Exit code for a failed command.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProxyError>())
        .map(ProxyError::exit_code)
        .unwrap_or(GENERAL_ERROR)
}
