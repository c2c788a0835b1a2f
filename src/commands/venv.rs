//! Venv command implementation

use camino::Utf8Path;
use clap::Args;

use crate::install::{InstallArgs, Installer};
use crate::project::Project;
use crate::pyenv::PythonEnv;
use crate::Result;

/// Arguments for the venv command
#[derive(Debug, Args)]
pub struct VenvArgs {
    /// Only recreate the virtual environment, do not install requirements
    #[arg(long)]
    pub no_install: bool,
}

/// Run the venv command
pub fn run(project_root: &Utf8Path, args: VenvArgs) -> Result<()> {
    let project = Project::discover(project_root)?;

    let rt = super::runtime()?;
    rt.block_on(async {
        let env = PythonEnv::recreate_venv(
            &project.config.python.interpreter,
            &project.venv_dir(),
            &project.config.python.version,
        )
        .await?;

        if args.no_install {
            return Ok(());
        }

        tracing::info!("Installing Python requirements...");
        let installer = Installer::new(&project, env);
        installer.run(&InstallArgs::default()).await?;
        Ok(())
    })
}
