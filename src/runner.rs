//! External command execution with log capture
//!
//! This module runs the external tools devlam orchestrates (pip, venv
//! creation, git, the stack deploy command) while capturing their stdout and
//! stderr. Each line is logged via tracing and optionally passed to a
//! callback for progress display.

use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::{Error, Result};

/// Callback for log lines
pub type LogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Run a command, streaming its output through tracing.
///
/// Returns `Error::StepFailed` carrying the command's exit status when it
/// exits non-zero. A process killed by a signal has no exit status and is
/// reported as status 1.
///
/// # Arguments
/// * `command` - The command to execute
/// * `operation` - Description of the step (e.g. "pip install -r requirements.txt")
/// * `log_callback` - Optional callback to receive log lines
pub async fn run_logged(
    command: &mut Command,
    operation: &str,
    log_callback: Option<LogCallback>,
) -> Result<()> {
    // Configure command to capture output
    command.stdout(Stdio::piped()).stderr(Stdio::piped());

    tracing::debug!("Running command: {:?}", command);

    // Spawn the process
    let mut child = command.spawn().map_err(|e| Error::StepSpawn {
        operation: operation.to_string(),
        source: e,
    })?;

    // Take ownership of stdout and stderr
    let stdout = child.stdout.take().expect("Failed to capture stdout");
    let stderr = child.stderr.take().expect("Failed to capture stderr");

    // Spawn task to read stdout
    let log_callback_stdout = log_callback.clone();
    let operation_stdout = operation.to_string();

    let stdout_handle = tokio::spawn(async move {
        let reader = BufReader::new(stdout);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(target: "step_output", step = %operation_stdout, "{}", line);

            if let Some(ref callback) = log_callback_stdout {
                callback(&line);
            }
        }
    });

    // Spawn task to read stderr
    let log_callback_stderr = log_callback;
    let operation_stderr = operation.to_string();

    let stderr_handle = tokio::spawn(async move {
        let reader = BufReader::new(stderr);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            // stderr lines surface at warn level
            tracing::warn!(target: "step_output", step = %operation_stderr, "{}", line);

            if let Some(ref callback) = log_callback_stderr {
                callback(&line);
            }
        }
    });

    // Wait for the process to complete
    let status = child.wait().await.map_err(|e| Error::StepSpawn {
        operation: operation.to_string(),
        source: e,
    })?;

    // Wait for output tasks to finish
    let _ = stdout_handle.await;
    let _ = stderr_handle.await;

    if !status.success() {
        return Err(Error::step_failed(operation, status.code().unwrap_or(1)));
    }

    Ok(())
}
