//! Install pipeline orchestration
//!
//! This module drives the whole install run:
//! 1. bootstrap the tooling (cache purge, selfcheck cleanup, pip upgrade,
//!    essential packages)
//! 2. recursively install every dependency manifest, staging function and
//!    layer bundles for directories that match those patterns
//! 3. install the developer tool packages
//!
//! Execution is sequential and fail-fast: the first failing step aborts the
//! run and its exit status becomes the process exit status. No step is
//! retried and nothing is rolled back.

use std::sync::Arc;

use crate::pip::Pip;
use crate::progress::InstallProgress;
use crate::project::{ManifestDir, Project};
use crate::pyenv::PythonEnv;
use crate::runner::LogCallback;
use crate::Result;

/// Arguments for the install operation
#[derive(Debug, Clone, Default)]
pub struct InstallArgs {
    /// Skip the bootstrap steps (cache purge, pip upgrade, essential packages)
    pub skip_bootstrap: bool,
    /// Skip the trailing tool-package installs
    pub skip_tools: bool,
    /// Show what would be installed without running pip
    pub dry_run: bool,
}

/// Result of an install run
#[derive(Debug)]
pub struct InstallReport {
    /// Relative paths of the manifest directories processed, in order
    pub manifests: Vec<String>,
    /// Number of function-package bundles staged
    pub function_bundles: usize,
    /// Number of shared-layer bundles staged
    pub layer_bundles: usize,
}

/// Sequential installer for a project tree
pub struct Installer<'a> {
    project: &'a Project,
    env: PythonEnv,
}

impl<'a> Installer<'a> {
    /// Create an installer targeting the given environment
    pub fn new(project: &'a Project, env: PythonEnv) -> Self {
        Self { project, env }
    }

    /// Execute the install pipeline
    pub async fn run(&self, args: &InstallArgs) -> Result<InstallReport> {
        let manifest_dirs = self.project.manifest_dirs()?;

        tracing::info!(
            "Found {} manifest directories under {}",
            manifest_dirs.len(),
            self.project.root
        );
        tracing::info!("Install destination: {}", self.env.describe());

        if args.dry_run {
            return Ok(self.plan(&manifest_dirs));
        }

        let progress = Arc::new(InstallProgress::new(manifest_dirs.len()));
        let log_callback: LogCallback = {
            let progress = progress.clone();
            Arc::new(move |line: &str| progress.update_log(line))
        };
        let pip = Pip::new(&self.env).with_log_callback(log_callback);

        if !args.skip_bootstrap {
            self.bootstrap(&pip, &progress).await?;
        }

        let mut report = InstallReport {
            manifests: Vec::new(),
            function_bundles: 0,
            layer_bundles: 0,
        };

        for dir in &manifest_dirs {
            self.install_dir(&pip, &progress, dir, &mut report).await?;
            progress.finish_dir();
        }

        if !args.skip_tools {
            for package in &self.project.config.install.tool_packages {
                progress.start_step(&format!("Installing {}", package));
                tracing::info!("Installing/upgrading {} (will be quiet)...", package);
                pip.install_upgrade(package).await?;
            }
        }

        progress.finish(report.manifests.len(), manifest_dirs.len());
        tracing::info!("All done");

        Ok(report)
    }

    /// Bootstrap steps run before any manifest install
    async fn bootstrap(&self, pip: &Pip<'_>, progress: &InstallProgress) -> Result<()> {
        progress.start_step("Purging pip cache");
        pip.purge_cache().await?;
        tracing::info!("Purged pip cache");

        pip.remove_selfcheck()?;

        progress.start_step("Upgrading pip");
        pip.upgrade_self().await?;
        tracing::info!("Upgraded pip");

        for package in &self.project.config.install.essential_packages {
            progress.start_step(&format!("Installing {}", package));
            tracing::info!("Installing/upgrading {} (will be quiet)...", package);
            pip.install_upgrade(package).await?;
        }

        Ok(())
    }

    /// Base install plus any staging installs for one manifest directory.
    ///
    /// The base install always runs first; function and layer staging are
    /// independent and both run when both patterns matched.
    async fn install_dir(
        &self,
        pip: &Pip<'_>,
        progress: &InstallProgress,
        dir: &ManifestDir,
        report: &mut InstallReport,
    ) -> Result<()> {
        progress.start_step(&format!("Installing {}", dir.display_rel()));
        tracing::info!("Installing {} (will be quiet)...", dir.manifest);
        pip.install_requirements(&dir.manifest, None).await?;
        report.manifests.push(dir.display_rel().to_string());

        if dir.targets.function {
            let bundle = dir.function_bundle_dir();
            progress.start_step(&format!("Staging function bundle {}", dir.display_rel()));
            tracing::info!("Staging function bundle into {}", bundle);
            pip.install_requirements(&dir.manifest, Some(&bundle)).await?;
            report.function_bundles += 1;
        }

        if dir.targets.layer {
            let bundle = dir.layer_bundle_dir(&self.env.site_packages_dir());
            progress.start_step(&format!("Staging layer bundle {}", dir.display_rel()));
            tracing::info!("Staging layer bundle into {}", bundle);
            pip.install_requirements(&dir.manifest, Some(&bundle)).await?;
            report.layer_bundles += 1;
        }

        Ok(())
    }

    /// Dry-run report: what would be installed, without running pip
    fn plan(&self, manifest_dirs: &[ManifestDir]) -> InstallReport {
        println!("Would install the following manifests in order:");
        let mut report = InstallReport {
            manifests: Vec::new(),
            function_bundles: 0,
            layer_bundles: 0,
        };

        for dir in manifest_dirs {
            println!("  - {}", dir.display_rel());
            report.manifests.push(dir.display_rel().to_string());

            if dir.targets.function {
                println!("      -> {}", dir.function_bundle_dir());
                report.function_bundles += 1;
            }
            if dir.targets.layer {
                println!("      -> {}", dir.layer_bundle_dir(&self.env.site_packages_dir()));
                report.layer_bundles += 1;
            }
        }

        report
    }
}
