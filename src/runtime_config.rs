//! Environment variable based runtime configuration.
//!
//! ## Environment Variables
//!
//! ### `CASCADE_STACK_SIZE`
//!
//! Stack size for the coroutines that run detached parallel-route chains.
//! Accepts decimal (`16384`) or hexadecimal (`0x4000`) values.
//! Default: `0x4000` (16 KB).
//!
//! Larger stacks support deeper layer chains and larger locals; smaller
//! stacks reduce memory when many parallel chains are in flight.
//!
//! ### `CASCADE_ENV`
//!
//! Environment name consulted by [`Router::configure`](crate::router::Router::configure)
//! blocks. Default: `development`.

use std::env;

const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
///
/// Load this at startup using [`RuntimeConfig::from_env()`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Stack size for detached chain coroutines in bytes (default: 16 KB)
    pub stack_size: usize,
    /// Environment name (default: `development`)
    pub env: String,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("CASCADE_STACK_SIZE") {
            Ok(val) => parse_stack_size(&val).unwrap_or(DEFAULT_STACK_SIZE),
            Err(_) => DEFAULT_STACK_SIZE,
        };
        let env = env::var("CASCADE_ENV").unwrap_or_else(|_| "development".to_string());
        RuntimeConfig { stack_size, env }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_stack_size(val: &str) -> Option<usize> {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
