#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Command-line interface for managing bare Git mirrors via the libgitmirror crate.

use std::{
    env,
    io::{self, IsTerminal, Write},
    path::PathBuf,
    process,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use libgitmirror::{
    BareRepository, CommitId, Config, Executor, GitExecutor, MirrorError, RefKind, SyncAction,
};
use liboutput::{Output, Quiet, Terminal};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Helpers for paths and mirror names.
mod utils;

use utils::{dirname_for_remote, expand_tilde};

/// Default directory for storing mirrors.
const DEFAULT_MIRROR_DIR: &str = "~/.gitmirror";

/// Default configuration file location.
const DEFAULT_CONFIG_FILE: &str = "~/.config/gitmirror/config.toml";

/// Length of abbreviated commit ids printed with `--short`.
const SHORT_ID_LEN: usize = 12;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("color_mode")
        .args(["color", "no_color"])
))]
/// Top-level CLI options for gitmirror.
struct Cli {
    /// Override the mirror directory location
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<String>,

    /// Read configuration from this file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    /// Enable colored output
    #[arg(long, global = true)]
    color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Suppress all output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log every git command to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    /// The primary command to execute.
    command: Commands,
}

#[derive(Subcommand)]
/// CLI subcommands supported by gitmirror.
enum Commands {
    /// Create a mirror of a remote repository
    Clone {
        /// URL of the remote repository
        remote: String,

        /// Mirror directory name (derived from the remote URL by default)
        #[arg(long)]
        name: Option<String>,
    },

    /// Refresh a mirror from its remote, pruning deleted refs
    Fetch {
        /// Name of the mirror
        name: String,
    },

    /// Clone a mirror if it is missing, otherwise fetch it
    Sync {
        /// URL of the remote repository
        remote: String,

        /// Mirror directory name (derived from the remote URL by default)
        #[arg(long)]
        name: Option<String>,
    },

    /// List the branches of a mirror
    Branches {
        /// Name of the mirror
        name: String,
    },

    /// List the tags of a mirror
    Tags {
        /// Name of the mirror
        name: String,
    },

    /// Resolve a ref pattern to a commit id
    Resolve {
        /// Name of the mirror
        name: String,

        /// Branch, tag, commit id, or any rev-parse expression
        pattern: String,

        /// Print an abbreviated commit id
        #[arg(long)]
        short: bool,
    },

    /// Classify a ref pattern as branch, tag, commit, or unknown
    Kind {
        /// Name of the mirror
        name: String,

        /// Branch, tag, commit id, or any rev-parse expression
        pattern: String,

        /// Print an abbreviated commit id
        #[arg(long)]
        short: bool,
    },

    /// Print the filesystem path of a mirror
    Path {
        /// Name of the mirror
        name: String,
    },
}

/// Mirror directory plus the executor shared by every handle.
struct Mirrors {
    /// Directory holding all mirrors.
    dir: PathBuf,
    /// Executor configured from settings.
    executor: Arc<dyn Executor>,
}

impl Mirrors {
    /// Handle for the mirror named `name`, whether or not it exists yet.
    fn open(&self, name: &str) -> BareRepository {
        BareRepository::with_executor(&self.dir, name, self.executor.clone())
    }

    /// Handle for the mirror named `name`, failing when it has not been cloned.
    fn open_existing(&self, name: &str) -> Result<BareRepository> {
        let repo = self.open(name);
        if !repo.exists() {
            return Err(MirrorError::NotCloned {
                path: repo.path().to_path_buf(),
            }
            .into());
        }
        Ok(repo)
    }
}

/// Install a stderr log subscriber. `RUST_LOG` applies unless `verbose` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from the `--config` flag or the default location.
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(&expand_tilde(path))?,
        None => Config::load_or_default(&expand_tilde(DEFAULT_CONFIG_FILE))?,
    };
    Ok(config)
}

/// Determine the mirror directory (priority: CLI flag > env var > config > default).
fn mirror_dir(cli: &Cli, config: &Config) -> PathBuf {
    if let Some(dir) = &cli.dir {
        expand_tilde(dir)
    } else if let Ok(env_dir) = env::var("GITMIRROR_DIR") {
        expand_tilde(&env_dir)
    } else if let Some(dir) = &config.cache_dir {
        dir.clone()
    } else {
        expand_tilde(DEFAULT_MIRROR_DIR)
    }
}

/// Clone `remote` into a new mirror.
fn clone_command(mirrors: &Mirrors, output: &dyn Output, remote: &str, name: &str) -> Result<()> {
    let repo = mirrors.open(name);
    let spinner = output.spinner(&format!("Cloning {remote}"));
    let result = repo.clone_mirror(remote);
    spinner.finish();
    result.with_context(|| format!("Failed to clone {remote}"))?;
    output.success(&format!("Cloned {remote} into {}", repo.path().display()))?;
    Ok(())
}

/// Fetch an existing mirror.
fn fetch_command(mirrors: &Mirrors, output: &dyn Output, name: &str) -> Result<()> {
    let repo = mirrors.open_existing(name)?;
    let spinner = output.spinner(&format!("Fetching {name}"));
    let result = repo.fetch();
    spinner.finish();
    result.with_context(|| format!("Failed to fetch {name}"))?;
    output.success(&format!("Fetched {name}"))?;
    Ok(())
}

/// Clone or fetch a mirror as needed.
fn sync_command(mirrors: &Mirrors, output: &dyn Output, remote: &str, name: &str) -> Result<()> {
    let repo = mirrors.open(name);
    let spinner = output.spinner(&format!("Syncing {remote}"));
    let result = repo.sync(remote);
    spinner.finish();
    match result.with_context(|| format!("Failed to sync {remote}"))? {
        SyncAction::Cloned => {
            output.success(&format!("Cloned {remote} into {}", repo.path().display()))?;
        }
        SyncAction::Fetched => output.success(&format!("Fetched {name}"))?,
    }
    Ok(())
}

/// Print one ref name per line.
fn list_command(output: &dyn Output, names: &[String]) -> Result<()> {
    for name in names {
        output.item(name)?;
    }
    Ok(())
}

/// Full or abbreviated form of `commit`.
fn display_id(commit: &CommitId, short: bool) -> &str {
    if short {
        commit.short(SHORT_ID_LEN)
    } else {
        commit.as_str()
    }
}

/// Print the commit a pattern resolves to.
fn resolve_command(
    mirrors: &Mirrors,
    output: &dyn Output,
    name: &str,
    pattern: &str,
    short: bool,
) -> Result<()> {
    let repo = mirrors.open_existing(name)?;
    match repo.resolve(pattern)? {
        Some(commit) => {
            output.item(display_id(&commit, short))?;
            Ok(())
        }
        None => anyhow::bail!("'{pattern}' does not resolve to a commit in {name}"),
    }
}

/// Print the classification of a pattern, followed by its commit when known.
///
/// A branch that shares its name with a tag is reported as the branch, with a
/// warning first.
fn kind_command(
    mirrors: &Mirrors,
    output: &dyn Output,
    name: &str,
    pattern: &str,
    short: bool,
) -> Result<()> {
    let repo = mirrors.open_existing(name)?;
    let description = repo.describe_ref(pattern)?;
    debug!(pattern, kind = %description.kind, "classified pattern");
    if description.kind == RefKind::Branch && repo.tags()?.iter().any(|t| t == pattern) {
        output.warn(&format!(
            "'{pattern}' names both a branch and a tag; reporting the branch"
        ))?;
    }
    match &description.commit {
        Some(commit) => output.item(&format!(
            "{} {}",
            description.kind,
            display_id(commit, short)
        ))?,
        None => output.item(description.kind.as_str())?,
    }
    Ok(())
}

/// CLI entrypoint.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine color output preference early for error handling
    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        // Auto-detect based on terminal
        io::stdout().is_terminal()
    };

    init_tracing(cli.verbose);

    let output: Arc<dyn Output> = if cli.quiet {
        Arc::new(Quiet)
    } else {
        Arc::new(Terminal::new(color))
    };

    if let Err(e) = run(cli, output.as_ref()) {
        // Reset any existing colors only if color was enabled and stdout is a TTY
        if color && io::stdout().is_terminal() {
            print!("\x1b[0m");
            if let Err(flush_err) = io::stdout().flush() {
                eprintln!("Failed to flush stdout while resetting colors: {flush_err}");
            }
        }

        if let Err(display_err) = output.fail(&format!("{e:#}")) {
            eprintln!("Failed to report error via output handler: {display_err:#}");
        }
        if let Err(finish_err) = output.finish() {
            eprintln!("Failed to flush output handler: {finish_err:#}");
        }

        let exit_code = e
            .downcast_ref::<MirrorError>()
            .map_or(1, MirrorError::exit_code);
        process::exit(exit_code);
    }
    Ok(())
}

/// Execute the selected CLI command using the provided output implementation.
fn run(cli: Cli, output: &dyn Output) -> Result<()> {
    let config = load_config(&cli)?;
    let dir = mirror_dir(&cli, &config);
    debug!(dir = %dir.display(), "using mirror directory");

    let mirrors = Mirrors {
        dir,
        executor: Arc::new(GitExecutor::from_settings(&config.git)),
    };

    match cli.command {
        Commands::Clone { remote, name } => {
            let name = name.unwrap_or_else(|| dirname_for_remote(&remote));
            clone_command(&mirrors, output, &remote, &name)?;
        }
        Commands::Fetch { name } => {
            fetch_command(&mirrors, output, &name)?;
        }
        Commands::Sync { remote, name } => {
            let name = name.unwrap_or_else(|| dirname_for_remote(&remote));
            sync_command(&mirrors, output, &remote, &name)?;
        }
        Commands::Branches { name } => {
            let branches = mirrors.open_existing(&name)?.branches()?;
            list_command(output, &branches)?;
        }
        Commands::Tags { name } => {
            let tags = mirrors.open_existing(&name)?.tags()?;
            list_command(output, &tags)?;
        }
        Commands::Resolve {
            name,
            pattern,
            short,
        } => {
            resolve_command(&mirrors, output, &name, &pattern, short)?;
        }
        Commands::Kind {
            name,
            pattern,
            short,
        } => {
            kind_command(&mirrors, output, &name, &pattern, short)?;
        }
        Commands::Path { name } => {
            output.item(&mirrors.open(&name).path().display().to_string())?;
        }
    }

    output.finish()?;
    Ok(())
}
