//! Multi-stack deployment
//!
//! A multi-stack root holds one deployable stack per immediate subdirectory.
//! Deploying a stack updates its git checkout, rebuilds its virtual
//! environment, installs its dependencies, and runs the configured deploy
//! command inside it. Stacks are retried a configurable number of times.
//!
//! Unlike the installer, deployment continues past failures: every stack is
//! attempted, the summary reports how many succeeded, and the run as a whole
//! fails if any stack failed.

use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;

use crate::install::{InstallArgs, Installer};
use crate::project::Project;
use crate::pyenv::PythonEnv;
use crate::runner::run_logged;
use crate::{Error, Result};

/// Arguments for the deploy operation
#[derive(Debug, Clone, Default)]
pub struct DeployArgs {
    /// Deploy specific stacks only (by directory name)
    pub stacks: Option<Vec<String>>,
    /// Show what would be deployed without running anything
    pub dry_run: bool,
}

/// Outcome of a deploy run
#[derive(Debug, Default)]
pub struct DeploySummary {
    /// Stacks that deployed successfully
    pub succeeded: Vec<String>,
    /// Stacks that failed after all attempts
    pub failed: Vec<String>,
}

/// Deploys every stack under a multi-stack root
pub struct DeployManager<'a> {
    project: &'a Project,
}

impl<'a> DeployManager<'a> {
    /// Create a deploy manager for the given root project
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Enumerate stack directories: immediate subdirectories of the root,
    /// excluding hidden names and the configured skip list, sorted by name.
    pub fn stacks(&self) -> Result<Vec<Utf8PathBuf>> {
        let skip = &self.project.config.deploy.skip_dirs;
        let mut stacks = Vec::new();

        for entry in self.project.root.read_dir_utf8()? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if name.starts_with('.') || skip.iter().any(|s| s == name) {
                continue;
            }
            stacks.push(entry.path().to_path_buf());
        }

        stacks.sort();
        Ok(stacks)
    }

    /// Deploy all (or the selected) stacks
    pub async fn deploy_all(&self, args: &DeployArgs) -> Result<DeploySummary> {
        let mut stacks = self.stacks()?;

        if let Some(ref selected) = args.stacks {
            for name in selected {
                if !stacks.iter().any(|s| s.file_name() == Some(name.as_str())) {
                    return Err(Error::deploy(
                        format!("Stack '{}' not found under {}", name, self.project.root),
                        "Stack names are the immediate subdirectory names of the root",
                    ));
                }
            }
            stacks.retain(|s| {
                s.file_name()
                    .map(|n| selected.iter().any(|sel| sel == n))
                    .unwrap_or(false)
            });
        }

        if stacks.is_empty() {
            tracing::warn!("No stacks found to deploy");
            return Ok(DeploySummary::default());
        }

        tracing::info!("Found {} stacks to deploy:", stacks.len());
        for stack in &stacks {
            tracing::info!("  {}", stack.file_name().unwrap_or(stack.as_str()));
        }

        if args.dry_run {
            println!("Would deploy the following stacks:");
            for stack in &stacks {
                println!("  - {}", stack.file_name().unwrap_or(stack.as_str()));
            }
            return Ok(DeploySummary::default());
        }

        let mut summary = DeploySummary::default();

        for stack in &stacks {
            let name = stack.file_name().unwrap_or(stack.as_str()).to_string();
            tracing::info!("{}", "-".repeat(80));
            tracing::info!("DEPLOYING STACK IN: {}", stack);
            tracing::info!("{}", "-".repeat(80));

            match self.deploy_stack(stack).await {
                Ok(()) => {
                    tracing::info!("Deployed {} successfully", name);
                    summary.succeeded.push(name);
                }
                Err(e) => {
                    tracing::error!("Failed to deploy {}: {}", name, e);
                    summary.failed.push(name);
                }
            }
        }

        tracing::info!(
            "Deployment complete: {}/{} stacks deployed successfully",
            summary.succeeded.len(),
            summary.succeeded.len() + summary.failed.len()
        );

        Ok(summary)
    }

    /// Deploy one stack, retrying on failure
    async fn deploy_stack(&self, stack: &Utf8Path) -> Result<()> {
        let max_attempts = self.project.config.deploy.max_attempts.max(1);
        let delay = std::time::Duration::from_secs(self.project.config.deploy.retry_delay_secs);

        let mut attempts = 0;
        loop {
            match self.deploy_stack_once(stack).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempts += 1;
                    if attempts == max_attempts {
                        tracing::error!("Failed after {} attempts", max_attempts);
                        return Err(e);
                    }
                    tracing::warn!("Attempt {} failed: {}", attempts, e);
                    tracing::warn!("Retrying in {} seconds...", delay.as_secs());
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One deploy attempt: git update, fresh venv, install, deploy command
    async fn deploy_stack_once(&self, stack: &Utf8Path) -> Result<()> {
        let branch = &self.project.config.deploy.branch;
        tracing::info!("Updating git repository in {}...", stack);

        self.git(stack, &["checkout", branch.as_str()]).await?;
        self.git(stack, &["fetch"]).await?;
        self.git(stack, &["pull"]).await?;
        tracing::info!("Git repository updated successfully in {}", stack);

        // Each stack is a devlam project of its own; its config decides the
        // manifest name, patterns, and venv location.
        let stack_project = Project::discover(stack)?;
        let env = PythonEnv::recreate_venv(
            &stack_project.config.python.interpreter,
            &stack_project.venv_dir(),
            &stack_project.config.python.version,
        )
        .await?;

        let installer = Installer::new(&stack_project, env);
        installer.run(&InstallArgs::default()).await?;

        self.run_deploy_command(stack).await
    }

    async fn git(&self, stack: &Utf8Path, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(stack);
        run_logged(&mut cmd, &format!("git {}", args.join(" ")), None).await
    }

    /// Run the configured deploy command inside the stack directory
    async fn run_deploy_command(&self, stack: &Utf8Path) -> Result<()> {
        let command = &self.project.config.deploy.command;
        let Some((program, args)) = command.split_first() else {
            return Err(Error::config(
                "deploy.command is empty",
                "Set deploy.command in devlam.toml, e.g. [\"cdk\", \"deploy\"]",
            ));
        };

        tracing::info!("Deploying...");
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(stack);
        run_logged(&mut cmd, &command.join(" "), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn setup_multi_stack_root() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("stack-a")).unwrap();
        fs::create_dir_all(root.join("stack-b")).unwrap();
        fs::create_dir_all(root.join("aws-common")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("README.md"), "not a stack\n").unwrap();
        temp_dir
    }

    #[test]
    fn test_stack_enumeration_skips_hidden_and_configured() {
        let temp_dir = setup_multi_stack_root();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let manager = DeployManager::new(&project);
        let stacks = manager.stacks().unwrap();

        let names: Vec<&str> = stacks.iter().filter_map(|s| s.file_name()).collect();
        assert_eq!(names, ["stack-a", "stack-b"]);
    }

    #[test]
    fn test_unknown_selected_stack_is_an_error() {
        let temp_dir = setup_multi_stack_root();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let manager = DeployManager::new(&project);

        let rt = runtime();
        let err = rt
            .block_on(manager.deploy_all(&DeployArgs {
                stacks: Some(vec!["nope".to_string()]),
                dry_run: true,
            }))
            .unwrap_err();
        assert!(matches!(err, Error::Deploy { .. }));
    }

    #[test]
    fn test_dry_run_deploys_nothing() {
        let temp_dir = setup_multi_stack_root();
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();

        let project = Project::discover(root).unwrap();
        let manager = DeployManager::new(&project);

        let rt = runtime();
        let summary = rt
            .block_on(manager.deploy_all(&DeployArgs {
                stacks: None,
                dry_run: true,
            }))
            .unwrap();
        assert!(summary.succeeded.is_empty());
        assert!(summary.failed.is_empty());
    }
}
