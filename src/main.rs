//! closure-diff: explain why a system rebuild changes what it changes
//!
//! Compares two derivation closures and reports the differences as a tree.

#![allow(clippy::struct_excessive_bools, clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use closure_diff::{
    cli::{self, DiffRequest},
    config::{AppConfig, CONFIG_FILE_NAMES, DEFAULT_NIX_STORE},
    pipeline::exit_codes,
    reports::ReportFormat,
    store::FileCache,
};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "closure-diff")]
#[command(version)]
#[command(about = "Explain why a rebuild changes what it changes", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "With no arguments, the running system is compared against the
system a dry-run rebuild would produce.

EXIT CODES:
    0  Diff completed, or no system updates
    1  Error occurred

EXAMPLES:
    # What would the next rebuild change?
    closure-diff

    # Compare two system recipes, expanding one level below the root
    closure-diff --max-level 1 /nix/store/...-nixos-system-a.drv /nix/store/...-nixos-system-b.drv

    # Hide changes that only stem from fixed-output sources
    closure-diff -q

    # Machine-readable output
    closure-diff -o json > diff.json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    diff: DiffArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Arguments for the default diff command
#[derive(Args)]
struct DiffArgs {
    /// Old root: a recipe, an output, or a symlink to one (default: the running system)
    old: Option<PathBuf>,

    /// New root (default: the system a dry-run rebuild would produce)
    new: Option<PathBuf>,

    /// Depth past which a recipe that changed version is not expanded
    #[arg(long, value_name = "LEVEL")]
    max_level: Option<u32>,

    /// Hide changes caused only by fixed-output sources
    #[arg(short, long)]
    quiet: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<ReportFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long)]
    no_color: bool,

    /// Do not read or write the store query cache
    #[arg(long)]
    no_cache: bool,

    /// Store query executable
    #[arg(long, value_name = "PROGRAM")]
    nix_store: Option<String>,

    /// Ignore references whose path contains PATTERN (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,
}

impl DiffArgs {
    /// Merge the flags into the discovered configuration.
    fn into_request(self, config_path: Option<&Path>) -> (DiffRequest, Option<PathBuf>) {
        let overrides = AppConfig::builder()
            .quiet(self.quiet)
            .output_file(self.output_file)
            .no_color(self.no_color)
            .cache_enabled(!self.no_cache)
            .nix_store(self.nix_store.unwrap_or_else(|| DEFAULT_NIX_STORE.to_string()))
            .ignore_patterns(self.ignore)
            .build();

        let (mut config, loaded_from) =
            AppConfig::from_file_with_overrides(config_path, &overrides);
        // Explicit flags win even when they name the default value
        if let Some(level) = self.max_level {
            config.diff.max_level = level;
        }
        if let Some(format) = self.output {
            config.output.format = format;
        }

        let request = DiffRequest {
            old: self.old,
            new: self.new,
            config,
        };
        (request, loaded_from)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Inspect or clear the store query cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Generate a man page and print it to stdout
    Man,
}

/// Sub-subcommands for the `cache` command
#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache location and entry counts
    Stats,
    /// Delete every cached answer
    Clear,
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .closure-diff.yaml in the current directory
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports stay pipeable
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let Some(command) = cli.command else {
        let (request, loaded_from) = cli.diff.into_request(cli.config.as_deref());
        if let Some(path) = &loaded_from {
            tracing::debug!("Loaded config from {}", path.display());
        }
        let exit_code = cli::run_diff(&request)?;
        if exit_code != exit_codes::SUCCESS {
            std::process::exit(exit_code);
        }
        return Ok(());
    };

    match command {
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "closure-diff", &mut io::stdout());
            Ok(())
        }

        Commands::ConfigSchema { output } => {
            let schema = closure_diff::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) =
                    closure_diff::config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml =
                    serde_yaml_ng::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(())
            }
            ConfigAction::Path => {
                eprintln!("Config file search paths (in order):");
                for dir in closure_diff::config::config_search_dirs() {
                    eprintln!("  {}", dir.display());
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in CONFIG_FILE_NAMES {
                    eprintln!("  {name}");
                }
                eprintln!();
                match closure_diff::config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(())
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".closure-diff.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = closure_diff::config::generate_full_example_config();
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(())
            }
        },

        Commands::Cache { action } => {
            let (config, _) = closure_diff::config::load_or_default(cli.config.as_deref());
            let cache_dir = config
                .store
                .cache_dir
                .unwrap_or_else(closure_diff::pipeline::dirs::query_cache_dir);
            let cache = FileCache::new(
                cache_dir.clone(),
                Duration::from_secs(config.store.cache_ttl_secs),
            )?;
            match action {
                CacheAction::Stats => {
                    let stats = cache.stats();
                    println!("Cache directory: {}", cache_dir.display());
                    println!("Entries:         {}", stats.total_entries);
                    println!("Expired:         {}", stats.expired_entries);
                    println!("Size:            {} bytes", stats.total_size);
                }
                CacheAction::Clear => {
                    cache.clear()?;
                    eprintln!("Cleared {}", cache_dir.display());
                }
            }
            Ok(())
        }

        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buf = Vec::new();
            man.render(&mut buf).context("failed to render man page")?;
            io::stdout().write_all(&buf)?;
            Ok(())
        }
    }
}
