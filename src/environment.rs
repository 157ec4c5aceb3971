use anyhow::{anyhow, Result};
use std::env;

/// Retrieves a required environment variable, failing before any I/O is attempted.
///
/// # Arguments
/// - `var`: The name of the environment variable.
///
/// # Returns
/// - `Result<String>`
pub fn require_env(var: &str) -> Result<String> {
    env::var(var).map_err(|_| anyhow!("{} must be set in the environment", var))
}

/// Retrieves an environment variable, falling back to a default when unset.
pub fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}
