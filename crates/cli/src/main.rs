//! `ec`: resolve three-way merge conflicts from the command line.
//!
//! Works as a git mergetool (`ec <cmd> BASE LOCAL REMOTE MERGED`), as a CI
//! check for leftover conflict markers, and as a picker over the conflicted
//! files of the current repository.

mod commands;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use easyconflict_core::config::{AppConfig, MergeBackend, ResolverConfig};
use easyconflict_core::engine::MergeInputs;
use easyconflict_core::markers::Resolution;

/// Exit code for "conflicts remain".
const EXIT_CONFLICTED: u8 = 1;
/// Exit code for any error.
const EXIT_ERROR: u8 = 2;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Structured three-way merge conflict resolution.
#[derive(Parser, Debug)]
#[command(
    name = "ec",
    version,
    about = "Resolve three-way merge conflicts conflict by conflict"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the configured merge view producer.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Git,
    Builtin,
}

impl From<BackendArg> for MergeBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Git => MergeBackend::Git,
            BackendArg::Builtin => MergeBackend::Builtin,
        }
    }
}

/// The four files a git mergetool receives.
#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Common ancestor.
    base: PathBuf,
    /// Our version.
    local: PathBuf,
    /// Their version.
    remote: PathBuf,
    /// Working-tree file with conflict markers.
    merged: PathBuf,
}

impl From<MergeArgs> for MergeInputs {
    fn from(args: MergeArgs) -> Self {
        MergeInputs {
            base: args.base,
            local: args.local,
            remote: args.remote,
            merged: args.merged,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exit 0 if MERGED has no conflicts, 1 if it does, 2 on malformed markers.
    Check {
        merged: PathBuf,
    },

    /// Apply one resolution to every conflict and write MERGED.
    Apply {
        #[command(flatten)]
        files: MergeArgs,

        /// Resolution: ours, theirs, both, none.
        #[arg(long)]
        all: Resolution,

        /// Keep a copy of MERGED before overwriting it.
        #[arg(long)]
        backup: bool,
    },

    /// Run a resolution script and print or write the result.
    Resolve {
        #[command(flatten)]
        files: MergeArgs,

        /// Script file, or `-` for stdin.
        #[arg(short, long)]
        script: Option<String>,

        /// Write MERGED instead of printing the result.
        #[arg(short, long)]
        write: bool,
    },

    /// Show conflicts, their status, and line classification.
    Show {
        #[command(flatten)]
        files: MergeArgs,

        /// Emit a JSON summary.
        #[arg(long)]
        json: bool,
    },

    /// Open MERGED in an editor and pick up the edits.
    Edit {
        #[command(flatten)]
        files: MergeArgs,

        /// Editor command (default: $EDITOR, then vi).
        #[arg(short, long)]
        editor: Option<String>,
    },

    /// List conflicted files of the current repository.
    List {
        /// Pick a file and show its conflicts.
        #[arg(short, long)]
        select: bool,
    },

    /// Generate a default configuration file.
    InitConfig {
        /// Output path (default: the user config location).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config errors are reported after logging is up.
    let config = AppConfig::load(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.log.level.clone())
        .unwrap_or_else(|_| "warn".into());
    init_logging(cli.verbose, &level);

    let config = match config {
        Ok(c) => c,
        Err(e) if matches!(cli.command, Commands::InitConfig { .. }) => {
            tracing::warn!(error = %e, "ignoring invalid configuration");
            AppConfig::default()
        }
        Err(e) => {
            eprintln!("{}", style::error(&format!("{e}")));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{e:#}")));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// `-v` wins, then `EC_LOG`, then the configured level.
fn init_logging(verbose: bool, configured: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("EC_LOG").unwrap_or_else(|_| EnvFilter::new(configured))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    let mut options = config.resolver.clone();
    if let Some(backend) = cli.backend {
        options.merge_backend = backend.into();
    }

    match cli.command {
        Commands::Check { merged } => commands::check::run(&merged).await,
        Commands::Apply {
            files,
            all,
            backup,
        } => {
            options.backup |= backup;
            commands::apply::run(files.into(), all, &options).await
        }
        Commands::Resolve {
            files,
            script,
            write,
        } => commands::resolve::run(files.into(), options, script.as_deref(), write).await,
        Commands::Show { files, json } => commands::show::run(files.into(), options, json).await,
        Commands::Edit { files, editor } => {
            commands::resolve::edit(files.into(), options, editor).await
        }
        Commands::List { select } => commands::list::run(options, select).await,
        Commands::InitConfig { output } => cmd_init_config(output.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init_config(output: Option<&Path>) -> Result<ExitCode> {
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => AppConfig::default_path().context("no user configuration directory found")?,
    };

    if path.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, AppConfig::template()).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", path.display()))
    );
    Ok(ExitCode::SUCCESS)
}

/// Exit 0 when nothing is left unresolved, 1 otherwise.
pub fn exit_for(unresolved: usize) -> ExitCode {
    if unresolved == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_CONFLICTED)
    }
}

/// Allow stages without a base when the index had none.
pub fn with_missing_base(mut options: ResolverConfig, missing_base: bool) -> ResolverConfig {
    options.allow_missing_base |= missing_base;
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from(["ec", "apply", "b", "l", "r", "m", "--all", "theirs", "--backup"])
            .unwrap();
        match cli.command {
            Commands::Apply { files, all, backup } => {
                assert_eq!(files.merged, PathBuf::from("m"));
                assert_eq!(all, Resolution::Theirs);
                assert!(backup);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unset_resolution() {
        assert!(Cli::try_parse_from(["ec", "apply", "b", "l", "r", "m", "--all", "unset"]).is_err());
    }

    #[test]
    fn test_global_backend_flag() {
        let cli = Cli::try_parse_from(["ec", "check", "m", "--backend", "builtin"]).unwrap();
        assert!(matches!(cli.backend, Some(BackendArg::Builtin)));
    }

    #[test]
    fn test_exit_for() {
        assert_eq!(exit_for(0), ExitCode::SUCCESS);
        assert_eq!(exit_for(2), ExitCode::from(EXIT_CONFLICTED));
    }
}
