//! Install command implementation
//!
//! This module provides the CLI interface for the install pipeline.

use camino::Utf8Path;
use clap::Args;

use crate::install::{InstallArgs as CoreInstallArgs, Installer};
use crate::project::Project;
use crate::pyenv::PythonEnv;
use crate::Result;

/// Arguments for the install command
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Install into the project virtual environment instead of the
    /// interpreter/pip found on PATH
    #[arg(long)]
    pub venv: bool,

    /// Skip the bootstrap steps (cache purge, pip upgrade, essential packages)
    #[arg(long)]
    pub skip_bootstrap: bool,

    /// Skip the trailing tool-package installs
    #[arg(long)]
    pub skip_tools: bool,

    /// Dry run - show what would be installed
    #[arg(long)]
    pub dry_run: bool,
}

impl From<&InstallArgs> for CoreInstallArgs {
    fn from(args: &InstallArgs) -> Self {
        CoreInstallArgs {
            skip_bootstrap: args.skip_bootstrap,
            skip_tools: args.skip_tools,
            dry_run: args.dry_run,
        }
    }
}

/// Run the install command
pub fn run(project_root: &Utf8Path, args: InstallArgs) -> Result<()> {
    let project = Project::discover(project_root)?;

    let env = if args.venv {
        PythonEnv::venv(project.venv_dir(), &project.config.python.version)
    } else {
        PythonEnv::ambient(
            &project.config.python.interpreter,
            &project.config.python.version,
        )
    };

    let installer = Installer::new(&project, env);
    let core_args: CoreInstallArgs = (&args).into();

    let rt = super::runtime()?;
    let report = rt.block_on(installer.run(&core_args))?;

    if !args.dry_run {
        tracing::info!(
            "Installed {} manifests ({} function bundles, {} layer bundles)",
            report.manifests.len(),
            report.function_bundles,
            report.layer_bundles
        );
    }

    Ok(())
}
