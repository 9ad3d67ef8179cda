//! gdcli - installs Godot engine builds into a project
//!
//! Thin front end over `gdcli_core`: argument parsing, logging setup and
//! human-readable output. All install semantics live in the core crate.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gdcli_core::{Catalog, InstallConfig, InstallError, InstallSession, Platform, ResolvedVersion};

mod project;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(name = "gdcli", about = "Install Godot engine builds into a project", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Resolve builds for this platform instead of the host (windows, linux, macos)
    #[clap(long, global = true)]
    platform: Option<Platform>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Download and install an engine version
    Install {
        /// Version or display name; read from godot.json when omitted
        identifier: Option<String>,

        /// Install directory, relative to the project
        #[clap(long, default_value = "dependencies")]
        dir: PathBuf,
    },

    /// List the versions available for the platform
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show which catalog entry an identifier resolves to
    Resolve {
        /// Version or display name
        identifier: String,
    },

    /// Remove the install directory and the editor cache
    Clean {
        /// Install directory, relative to the project
        #[clap(long, default_value = "dependencies")]
        dir: PathBuf,
    },
}

/// Initialize tracing with CLI flags
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    // Logs go to stderr so stdout stays clean for --json output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    match cli.command {
        Command::Install { identifier, dir } => {
            let config = load_config(cli.config.as_deref())?;
            install_command(config, target_platform(cli.platform)?, identifier, dir).await
        }
        Command::List { json } => {
            let config = load_config(cli.config.as_deref())?;
            list_command(&config, target_platform(cli.platform)?, json)
        }
        Command::Resolve { identifier } => {
            let config = load_config(cli.config.as_deref())?;
            resolve_command(&config, target_platform(cli.platform)?, &identifier)
        }
        Command::Clean { dir } => clean_command(&dir),
    }
}

fn target_platform(requested: Option<Platform>) -> Result<Platform> {
    match requested {
        Some(platform) => Ok(platform),
        None => Platform::current()
            .ok_or_else(|| anyhow!("No engine builds for {}; pass --platform", std::env::consts::OS)),
    }
}

fn load_config(path: Option<&Path>) -> Result<InstallConfig> {
    let config = match path {
        Some(path) => InstallConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => InstallConfig::load().context("Failed to load config")?,
    };
    debug!("Using config: {:?}", config);
    Ok(config)
}

fn load_catalog(config: &InstallConfig) -> Result<Catalog> {
    config.catalog().context("Failed to load catalog")
}

async fn install_command(
    config: InstallConfig,
    platform: Platform,
    identifier: Option<String>,
    dir: PathBuf,
) -> Result<()> {
    let catalog = load_catalog(&config)?;

    let version = match identifier {
        Some(identifier) => resolve_or_explain(&catalog, platform, &identifier)?,
        None => {
            let project_file = project::ProjectFile::load(Path::new("."))?;
            let variant = project_file.variant();
            catalog
                .find(&project_file.engine_version, variant, platform)
                .ok_or_else(|| {
                    anyhow!(
                        "{} pins engine {} ({}), which has no {} build in the catalog",
                        project::PROJECT_FILE,
                        project_file.engine_version,
                        variant,
                        platform
                    )
                })?
        }
    };

    project::ensure_gdignore(&dir)?;

    let session = InstallSession::new(config)?;
    let token = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current stage");
            token.cancel();
        }
    });

    let outcome = session
        .install_version(&version, &dir)
        .await
        .with_context(|| format!("Failed to install {}", version.display_name))?;

    println!("Installed {} to {}", version.display_name, dir.display());
    println!("  {}", outcome.primary.display());
    if let Some(secondary) = &outcome.secondary {
        println!("  {}", secondary.display());
    }
    Ok(())
}

/// Resolve an identifier, listing the choices when it does not pin one build
fn resolve_or_explain(catalog: &Catalog, platform: Platform, identifier: &str) -> Result<ResolvedVersion> {
    match catalog.resolve(identifier, platform) {
        Ok(version) => Ok(version),
        Err(e @ InstallError::NotFound { .. }) => {
            eprintln!("Available versions for {platform}:");
            for entry in catalog.entries_for(platform) {
                eprintln!("  {}", entry.display_name);
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Variant")]
    variant: String,
    #[tabled(rename = "Archive")]
    archive: String,
}

fn list_command(config: &InstallConfig, platform: Platform, json: bool) -> Result<()> {
    let catalog = load_catalog(config)?;
    let entries: Vec<_> = catalog.entries_for(platform).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No versions available for {platform}");
        return Ok(());
    }

    let rows: Vec<VersionRow> = entries
        .iter()
        .map(|e| VersionRow {
            name: e.display_name.clone(),
            version: e.version.clone(),
            variant: e.variant.to_string(),
            archive: e.archive_name().to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

fn resolve_command(config: &InstallConfig, platform: Platform, identifier: &str) -> Result<()> {
    let catalog = load_catalog(config)?;
    let version = resolve_or_explain(&catalog, platform, identifier)?;

    println!("{}", version.display_name);
    println!("  version:  {}", version.version);
    println!("  variant:  {}", version.variant);
    println!("  platform: {}", version.platform);
    println!("  url:      {}", version.url);
    Ok(())
}

fn clean_command(dir: &Path) -> Result<()> {
    let removed = project::clean(Path::new("."), dir)?;
    if removed.is_empty() {
        println!("Nothing to clean");
    }
    for path in removed {
        println!("Removed {}", path.display());
    }
    Ok(())
}
