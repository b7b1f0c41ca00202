#![forbid(unsafe_code)]

mod cmd;
mod output;
mod session;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use session::Session;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use weighbridge_core::config;
use weighbridge_core::db::lock::LockError;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "wb: weighbridge ticket recorder",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read config from this file instead of the user config directory.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ticket database to use. Overrides WEIGHBRIDGE_DB and config.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "List tickets",
        long_about = "List tickets newest first, with an optional filter, sort order and expanded rows.",
        after_help = "EXAMPLES:\n    # Newest tickets first\n    wb list\n\n    # Drivers matching \"fre\", sorted by license\n    wb list --driver fre --sort license-asc\n\n    # Tickets in January, with weights for ticket 3\n    wb list --from 2024-01-01 --to 2024-02-01 --expand 3\n\n    # Emit machine-readable output\n    wb list --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Show one ticket",
        after_help = "EXAMPLES:\n    # Show ticket 3\n    wb show 3"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Record a new ticket",
        long_about = "Record a new ticket. The date defaults to now; every other field is required.",
        after_help = "EXAMPLES:\n    # Record a ticket\n    wb add --license B2223KK --driver Fredy --inbound 1200 --outbound 1300\n\n    # Record a ticket with an explicit date\n    wb add -l A7223KL -d Budi -i 1000 -o 1400 --date 2024-03-05T10:00:00Z"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        about = "Change the weights of a ticket",
        after_help = "EXAMPLES:\n    # Correct the outbound weight of ticket 3\n    wb edit 3 --outbound 1450"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(about = "List available filters and sort orders")]
    Options,

    #[command(
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    wb completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("WEIGHBRIDGE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "weighbridge=debug,info"
        } else {
            "weighbridge=info,warn"
        })
    });

    let format = env::var("WEIGHBRIDGE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn error_for(err: &anyhow::Error) -> Option<CliError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<LockError>())
        .map(|lock| CliError::new(lock.code(), lock.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    let output =
        output::resolve_output_mode(cli.format, cli.json, config.display.output.as_deref());
    debug!(?output, "resolved output mode");

    match &cli.command {
        Commands::Completions(args) => {
            let mut command = Cli::command();
            return cmd::completions::run_completions(args.shell, &mut command);
        }
        Commands::Options => return cmd::options::run_options(output),
        _ => {}
    }

    let session = match Session::open(config, cli.db.as_deref(), output) {
        Ok(session) => session,
        Err(err) => {
            if let Some(cli_err) = error_for(&err) {
                output::render_error(output, &cli_err)?;
            }
            return Err(err);
        }
    };

    match &cli.command {
        Commands::List(args) => cmd::list::run_list(args, &session).await,
        Commands::Show(args) => cmd::show::run_show(args, &session).await,
        Commands::Add(args) => cmd::add::run_add(args, &session).await,
        Commands::Edit(args) => cmd::edit::run_edit(args, &session).await,
        Commands::Options | Commands::Completions(_) => Ok(()),
    }
}
