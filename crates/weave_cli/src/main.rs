//! Weave CLI, the command-line front end for the behavior-graph optimizer.
//!
//! Provides `weave optimize` to clean up an exported graph, `weave validate`
//! to check one without changing it, and `weave passes` to list the cleanup
//! passes.

#![warn(missing_docs)]

mod optimize;
mod passes;
mod pipeline;
mod validate;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use weave_config::LogLevel;

/// Weave, a cleanup optimizer for glTF interactivity behavior graphs.
#[derive(Parser, Debug)]
#[command(name = "weave", version, about = "Behavior graph optimizer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `weave.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Optimize a behavior graph.
    Optimize(OptimizeArgs),
    /// Check a behavior graph for structural errors.
    Validate {
        /// Graph JSON file.
        input: String,
    },
    /// List the cleanup passes in the order they run.
    Passes,
}

/// Arguments for the `weave optimize` subcommand.
#[derive(Parser, Debug)]
pub struct OptimizeArgs {
    /// Graph JSON file.
    pub input: String,

    /// Where to write the optimized graph (default: stdout).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override `optimizer.max_iterations`.
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Pass names to skip, in addition to `optimizer.disabled_passes`.
    #[arg(long, num_args = 1..)]
    pub disable: Vec<String>,

    /// Keep the node order instead of sorting producers first.
    #[arg(long)]
    pub no_sort: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// The log filter used when `RUST_LOG` is unset.
    fn default_filter(&self, configured: LogLevel) -> &'static str {
        if self.verbose {
            LogLevel::Debug.as_filter()
        } else if self.quiet {
            LogLevel::Warn.as_filter()
        } else {
            configured.as_filter()
        }
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
fn init_logging(global: &GlobalArgs, configured: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(global.default_filter(configured)));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(global.color)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let config = match pipeline::load_config(&global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    init_logging(&global, config.log.level);

    let result = match cli.command {
        Command::Optimize(ref args) => optimize::run(args, &config, &global),
        Command::Validate { ref input } => validate::run(input, &global),
        Command::Passes => passes::run(&config),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
