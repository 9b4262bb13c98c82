//! dfawalk - step through a table-driven DFA from the command line
//!
//! Provides one-shot runs, resumable single steps, and an interactive REPL.

mod commands;
mod config;
mod render;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{Config, OutputFormat};
use dfawalk_core::CoreError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dfawalk")]
#[command(about = "Run and step through table-driven deterministic finite automata")]
#[command(version)]
struct Cli {
    /// Definition file (JSON or YAML); overrides --preset
    #[arg(short, long, global = true)]
    definition: Option<PathBuf>,

    /// Bundled preset to run
    #[arg(short, long, global = true)]
    preset: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Only print lines for symbols that change the state
    #[arg(long, global = true)]
    changes_only: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log every engine notification
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive stepping session
    Repl,

    /// Run the whole text through the automaton
    Run {
        /// Input text
        text: String,
    },

    /// Process the single symbol at an index
    Step {
        /// Input text
        text: String,

        /// Index of the symbol to process
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// State to resume from (name or id); defaults to start
        #[arg(short, long)]
        state: Option<String>,
    },

    /// Show the active definition
    Show {
        /// Print the definition document instead of a table
        #[arg(long)]
        raw: bool,
    },

    /// Validate a definition file
    Check {
        /// Definition file (JSON or YAML)
        file: PathBuf,
    },

    /// List bundled presets
    Presets,

    /// Print the effective configuration
    Config {
        /// Write it to this YAML file instead
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "dfawalk=debug,dfawalk_core=trace" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // Load configuration (from file if DFAWALK_CONFIG is set, then env overrides)
    let mut config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("DFAWALK_CONFIG") {
                tracing::debug!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            std::process::exit(1);
        }
    };

    // Command-line flags take precedence; --definition beats --preset, and an
    // explicit --preset beats a path from config or env.
    if let Some(preset) = cli.preset {
        config.definition.preset = preset;
        config.definition.path = None;
    }
    if let Some(path) = cli.definition {
        config.definition.path = Some(path);
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if cli.changes_only {
        config.output.show_index_changes = false;
    }
    if cli.no_color {
        config.output.color = false;
    }

    if let Err(e) = config.validate() {
        eprintln!("{}: {}", "Config error".red(), e);
        std::process::exit(1);
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Some(Commands::Repl) | None => repl::run(&config),
        Some(cmd) => commands::execute(&config, cmd).map(|output| println!("{}", output)),
    };

    if let Err(e) = result {
        match e.downcast_ref::<CoreError>() {
            Some(core) => {
                eprintln!("{} [{}]: {}", "Error".red(), core.error_code(), core);
                // Bad --index/--state values exit like clap usage errors
                std::process::exit(if core.is_run_argument_error() { 2 } else { 1 });
            }
            None => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        }
    }
}
