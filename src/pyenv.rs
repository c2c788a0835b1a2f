//! Explicit Python environment handle
//!
//! The shell-era tooling assumed an activated virtual environment and ran
//! bare `pip`. Here the install destination is an explicit input: a
//! [`PythonEnv`] is either the ambient interpreter or a concrete venv
//! directory, and it derives the executable paths and site-packages layout
//! used by every install step.

use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;

use crate::runner::run_logged;
use crate::Result;

/// A Python environment installs are directed at
#[derive(Debug, Clone)]
pub struct PythonEnv {
    kind: EnvKind,
    /// Python version used for the site-packages directory layout
    version: String,
}

#[derive(Debug, Clone)]
enum EnvKind {
    /// Whatever interpreter/pip is on PATH
    Ambient { interpreter: String },
    /// A virtual environment rooted at `dir`
    Venv { dir: Utf8PathBuf },
}

impl PythonEnv {
    /// Environment backed by the ambient interpreter and `pip` on PATH
    pub fn ambient(interpreter: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: EnvKind::Ambient {
                interpreter: interpreter.into(),
            },
            version: version.into(),
        }
    }

    /// Environment backed by a virtual environment directory
    pub fn venv(dir: impl Into<Utf8PathBuf>, version: impl Into<String>) -> Self {
        Self {
            kind: EnvKind::Venv { dir: dir.into() },
            version: version.into(),
        }
    }

    /// Path of the `python` executable for this environment
    pub fn python(&self) -> Utf8PathBuf {
        match &self.kind {
            EnvKind::Ambient { interpreter } => Utf8PathBuf::from(interpreter),
            EnvKind::Venv { dir } => dir.join("bin").join("python"),
        }
    }

    /// Path of the `pip` executable for this environment
    pub fn pip(&self) -> Utf8PathBuf {
        match &self.kind {
            EnvKind::Ambient { .. } => Utf8PathBuf::from("pip"),
            EnvKind::Venv { dir } => dir.join("bin").join("pip"),
        }
    }

    /// Configured Python version (e.g. "3.11")
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Relative site-packages layout for this environment's Python version
    /// (e.g. "lib/python3.11/site-packages")
    pub fn site_packages_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("lib/python{}/site-packages", self.version))
    }

    /// Human-readable destination for log lines
    pub fn describe(&self) -> String {
        match &self.kind {
            EnvKind::Ambient { interpreter } => format!("ambient environment ({})", interpreter),
            EnvKind::Venv { dir } => format!("venv at {}", dir),
        }
    }

    /// Recreate a virtual environment from scratch.
    ///
    /// Deletes `dir` if present (a missing directory is not an error), runs
    /// `<interpreter> -m venv <dir>`, and returns the handle for the fresh
    /// environment.
    pub async fn recreate_venv(
        interpreter: &str,
        dir: &Utf8Path,
        version: &str,
    ) -> Result<PythonEnv> {
        tracing::info!("Deleting all content under {}", dir);
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Recreating Python virtual environment at {}", dir);
        let mut cmd = Command::new(interpreter);
        cmd.args(["-m", "venv", dir.as_str()]);
        run_logged(&mut cmd, &format!("{} -m venv {}", interpreter, dir), None).await?;

        tracing::info!(
            "Virtual environment recreated. Activate it with: source {}/bin/activate",
            dir
        );

        Ok(PythonEnv::venv(dir, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_paths() {
        let env = PythonEnv::ambient("python3.11", "3.11");
        assert_eq!(env.python(), Utf8PathBuf::from("python3.11"));
        assert_eq!(env.pip(), Utf8PathBuf::from("pip"));
    }

    #[test]
    fn test_venv_paths() {
        let env = PythonEnv::venv("/proj/.venv", "3.11");
        assert_eq!(env.python(), Utf8PathBuf::from("/proj/.venv/bin/python"));
        assert_eq!(env.pip(), Utf8PathBuf::from("/proj/.venv/bin/pip"));
    }

    #[test]
    fn test_site_packages_layout_follows_version() {
        let env = PythonEnv::venv("/proj/.venv", "3.12");
        assert_eq!(
            env.site_packages_dir(),
            Utf8PathBuf::from("lib/python3.12/site-packages")
        );
    }
}
