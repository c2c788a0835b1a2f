//! devlam CLI - Python serverless monorepo workflow tool

use clap::{Parser, Subcommand};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use devlam::commands;

/// devlam - Python serverless monorepo workflow tool
#[derive(Debug, Parser)]
#[command(name = "devlam")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory
    #[arg(short = 'p', long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Install every dependency manifest in the project tree
    Install(commands::install::InstallArgs),

    /// Recreate the project virtual environment
    Venv(commands::venv::VenvArgs),

    /// Deploy the stacks under a multi-stack root
    Deploy(commands::deploy::DeployArgs),
}

fn main() {
    // Initialize tracing with indicatif layer for progress bar support
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Create indicatif layer for progress bars
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .with(filter)
        .init();

    // Determine project root
    let project_root = if let Some(ref path) = cli.project {
        camino::Utf8PathBuf::from(path)
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|p| camino::Utf8PathBuf::try_from(p).ok())
            .unwrap_or_else(|| camino::Utf8PathBuf::from("."))
    };

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(&project_root, args),
        Commands::Venv(args) => commands::venv::run(&project_root, args),
        Commands::Deploy(args) => commands::deploy::run(&project_root, args),
    };

    // The exit status of a failed external step becomes the process exit
    // status; every other error exits 1.
    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
