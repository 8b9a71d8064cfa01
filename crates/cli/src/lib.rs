mod db;
mod install;
mod patterns;
mod scan;
mod state;
mod watch;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vigil_core::config::VigilConfig;

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Keeps a verified grype on hand and scans workspaces for vulnerable dependencies",
    long_about = "Vigil downloads a pinned release of the grype vulnerability scanner, checks it \
                  against the release's published SHA-256 checksums, and runs it over a workspace. \
                  It can also watch a workspace and rescan whenever a package manifest changes."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Directory holding the scanner, its database, state and logs (default: ~/.vigil)
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Scanner release to provision, without the leading `v`
    #[arg(long, global = true, value_name = "VERSION")]
    pub grype_version: Option<String>,

    /// Release repository as host/path, e.g. github.com/anchore/grype
    #[arg(long, global = true, value_name = "REPOSITORY")]
    pub repository: Option<String>,
}

impl GlobalArgs {
    pub fn config(&self) -> VigilConfig {
        let mut config = VigilConfig::default();
        if let Some(dir) = &self.storage_dir {
            config = config.with_base_dir(dir);
        }
        if let Some(version) = &self.grype_version {
            config = config.with_version(version.trim_start_matches('v'));
        }
        if let Some(repository) = &self.repository {
            config = config.with_repository(repository);
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and verify the scanner, or confirm the installed one
    Install,
    /// Scan a directory once and print the findings
    Scan {
        /// Directory to scan. Defaults to current directory.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the scanner's report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Rescan a directory whenever a package manifest or lockfile changes
    #[command(
        long_about = "Watches the directory for changes to files the scanner reads (lockfiles, \
                      manifests, package databases). Bursts of changes are coalesced into a \
                      single rescan. Does nothing when automatic scanning is disabled."
    )]
    Watch {
        /// Directory to watch. Defaults to current directory.
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Turn automatic scanning on
    Enable,
    /// Turn automatic scanning off
    Disable,
    /// Refresh the scanner's vulnerability database
    DbUpdate,
    /// List the file patterns that trigger a rescan
    Patterns,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.global.config();

    let component = match &cli.command {
        Commands::Watch { .. } => "watch",
        _ => "cli",
    };
    let _guard = vigil_runtime::init_logging(&config, component, true);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Install => rt.block_on(install::run(&config)),
        Commands::Scan { path, json } => rt.block_on(scan::run(&config, workspace_path(path)?, json)),
        Commands::Watch { path } => rt.block_on(watch::run(&config, workspace_path(path)?)),
        Commands::Enable => state::run(&config, true),
        Commands::Disable => state::run(&config, false),
        Commands::DbUpdate => rt.block_on(db::run(&config)),
        Commands::Patterns => patterns::run(),
    }
}

fn workspace_path(path: Option<PathBuf>) -> std::io::Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => std::env::current_dir(),
    }
}
