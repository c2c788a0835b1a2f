//! CLI command implementations

pub mod deploy;
pub mod install;
pub mod venv;

use crate::{Error, Result};

/// Build the runtime driving a command's sequential async pipeline
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::project(
                format!("Failed to create async runtime: {}", e),
                "This is likely a bug in devlam",
            )
        })
}
