use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nest_config::ConfigLoader;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Nest embeddable interpreter.
///
/// Every invocation drives one isolated interpreter instance. Failed
/// attempts are rolled back and reported with a traceback.
///
/// EXAMPLES:
///     nest run main.nest           Run a program
///     nest eval "1 + 2"            Evaluate one expression
///     nest check main.nest         Check without running
///     nest repl                    Start interactive REPL
///
/// ENVIRONMENT VARIABLES:
///     NEST_DIAGNOSTICS     Set to 'json' for JSON diagnostics by default
///     NEST_HISTORY_FILE    REPL history location (default ~/.nest/history)
///     NEST_NO_HISTORY      Set to disable REPL history
///     NEST_LOG             Log filter for stderr logging (default 'warn')
///     NEST_MAX_CALL_DEPTH  Override interpreter.max_call_depth
///     NEST_TRACE_LIMIT     Override interpreter.trace_limit
#[derive(Parser)]
#[command(name = "nest")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Nest source file
    ///
    /// Executes the file as one attempt. On failure nothing it declared is
    /// kept and the error with its traceback is written to stderr.
    ///
    /// EXAMPLES:
    ///     nest run main.nest              Run a program
    ///     nest run main.nest --json       Output diagnostics as JSON
    #[command(visible_alias = "r")]
    Run {
        /// Path to the Nest source file
        file: String,
        /// Output diagnostics in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a single expression and print its value
    ///
    /// EXAMPLES:
    ///     nest eval "2 * 21"
    ///     nest eval "len(\"nest\")" --json
    #[command(visible_alias = "e")]
    Eval {
        /// Expression source
        expr: String,
        /// Output diagnostics in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Check a Nest source file without running it
    ///
    /// Reports syntax errors and undefined names.
    ///
    /// EXAMPLES:
    ///     nest check main.nest         Check for errors
    ///     nest check main.nest --json  Output as JSON
    #[command(visible_alias = "c")]
    Check {
        /// Path to the Nest source file
        file: String,
        /// Output diagnostics in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive REPL
    ///
    /// Each line is one attempt: a failing line leaves earlier
    /// definitions untouched.
    ///
    /// REPL COMMANDS:
    ///     :help, :h      Show help
    ///     :quit, :q      Exit REPL
    ///     :vars          List defined globals
    ///     :error         Show the last error with its traceback
    Repl {
        /// Disable history persistence
        #[arg(long, env = "NEST_NO_HISTORY")]
        no_history: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("NEST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    let project = ConfigLoader::new()
        .load_from_directory(&std::env::current_dir()?)
        .context("Failed to load interpreter configuration")?;
    let interpreter = project.interpreter;

    match cli.command {
        Commands::Run { file, json } => {
            // Command-line flag overrides environment variable
            let use_json = json || cli_config.default_json;
            commands::run::run(&file, interpreter, use_json)?;
        }
        Commands::Eval { expr, json } => {
            let use_json = json || cli_config.default_json;
            commands::eval::run(&expr, interpreter, use_json)?;
        }
        Commands::Check { file, json } => {
            let use_json = json || cli_config.default_json;
            commands::check::run(&file, interpreter, use_json)?;
        }
        Commands::Repl { no_history } => {
            let disable_history = no_history || cli_config.no_history;
            commands::repl::run(interpreter, disable_history, &cli_config)?;
        }
    }

    Ok(())
}
