//! Deploy command implementation

use camino::Utf8Path;
use clap::Args;

use crate::deploy::{DeployArgs as CoreDeployArgs, DeployManager};
use crate::project::Project;
use crate::{Error, Result};

/// Arguments for the deploy command
#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Deploy specific stacks only (by directory name)
    #[arg(short, long)]
    pub stacks: Option<Vec<String>>,

    /// Dry run - show what would be deployed
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the deploy command
pub fn run(project_root: &Utf8Path, args: DeployArgs) -> Result<()> {
    let project = Project::discover(project_root)?;
    let manager = DeployManager::new(&project);

    let core_args = CoreDeployArgs {
        stacks: args.stacks,
        dry_run: args.dry_run,
    };

    let rt = super::runtime()?;
    let summary = rt.block_on(manager.deploy_all(&core_args))?;

    if !summary.failed.is_empty() {
        return Err(Error::deploy(
            format!("Stacks failed to deploy: {}", summary.failed.join(", ")),
            "See the log above for each stack's failure",
        ));
    }

    Ok(())
}
