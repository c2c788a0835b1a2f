//! pip invocations
//!
//! Thin wrappers around the pip command shapes the installer uses: cache
//! purge, self-upgrade, single-package installs, and manifest installs with
//! an optional target-directory override. All installs run `--quiet`; their
//! progress is reported by the caller, not by pip.

use camino::Utf8Path;
use tokio::process::Command;

use crate::pyenv::PythonEnv;
use crate::runner::{run_logged, LogCallback};
use crate::Result;

/// pip client bound to one target environment
pub struct Pip<'a> {
    env: &'a PythonEnv,
    log_callback: Option<LogCallback>,
}

impl<'a> Pip<'a> {
    /// Create a pip client for the given environment
    pub fn new(env: &'a PythonEnv) -> Self {
        Self {
            env,
            log_callback: None,
        }
    }

    /// Set a callback receiving each output line
    pub fn with_log_callback(mut self, callback: LogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    /// Purge the pip download cache (`<python> -m pip cache purge`)
    pub async fn purge_cache(&self) -> Result<()> {
        let python = self.env.python();
        let mut cmd = Command::new(python.as_str());
        cmd.args(["-m", "pip", "cache", "purge"]);
        self.run(cmd, format!("{} -m pip cache purge", python)).await
    }

    /// Remove pip's selfcheck directory under the user cache, if present.
    ///
    /// Stale selfcheck state has caused spurious install failures; clearing
    /// it is part of the bootstrap sequence.
    pub fn remove_selfcheck(&self) -> Result<()> {
        let Some(home) = std::env::var_os("HOME") else {
            tracing::debug!("HOME not set, skipping pip selfcheck cleanup");
            return Ok(());
        };
        let selfcheck_dir = std::path::PathBuf::from(home).join(".cache/pip/selfcheck");

        match std::fs::remove_dir_all(&selfcheck_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!("Removed pip cache selfcheck directory");
        Ok(())
    }

    /// Upgrade pip itself in the target environment
    pub async fn upgrade_self(&self) -> Result<()> {
        self.install_upgrade("pip").await
    }

    /// Install or upgrade a single package
    pub async fn install_upgrade(&self, package: &str) -> Result<()> {
        let pip = self.env.pip();
        let mut cmd = Command::new(pip.as_str());
        cmd.args(["install", "--upgrade", package, "--quiet"]);
        self.run(cmd, format!("{} install --upgrade {}", pip, package))
            .await
    }

    /// Install the dependencies listed in a manifest file.
    ///
    /// With `target`, packages are installed into that directory with
    /// `--upgrade` (the staging-bundle shape); without it, they land in the
    /// target environment's own package store.
    pub async fn install_requirements(
        &self,
        manifest: &Utf8Path,
        target: Option<&Utf8Path>,
    ) -> Result<()> {
        let pip = self.env.pip();
        let args = requirements_args(manifest, target);

        let mut operation = format!("{} ", pip);
        operation.push_str(&args.join(" "));

        let mut cmd = Command::new(pip.as_str());
        cmd.args(&args);
        self.run(cmd, operation).await
    }

    async fn run(&self, mut cmd: Command, operation: String) -> Result<()> {
        run_logged(&mut cmd, &operation, self.log_callback.clone()).await
    }
}

/// Argument list for a manifest install
fn requirements_args(manifest: &Utf8Path, target: Option<&Utf8Path>) -> Vec<String> {
    let mut args = vec![
        "install".to_string(),
        "-r".to_string(),
        manifest.to_string(),
    ];
    if let Some(target) = target {
        args.push("--target".to_string());
        args.push(target.to_string());
        args.push("--upgrade".to_string());
    }
    args.push("--quiet".to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    #[test]
    fn test_base_requirements_args() {
        let args = requirements_args(Utf8Path::new("lambda/fn/requirements.txt"), None);
        assert_eq!(
            args,
            ["install", "-r", "lambda/fn/requirements.txt", "--quiet"]
        );
    }

    #[test]
    fn test_target_requirements_args_upgrade() {
        let args = requirements_args(
            Utf8Path::new("lambda/fn/requirements.txt"),
            Some(Utf8Path::new("lambda/fn/packages")),
        );
        assert_eq!(
            args,
            [
                "install",
                "-r",
                "lambda/fn/requirements.txt",
                "--target",
                "lambda/fn/packages",
                "--upgrade",
                "--quiet"
            ]
        );
    }
}
