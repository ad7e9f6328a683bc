#![forbid(unsafe_code)]

mod cmd;
mod output;
mod structure;

use clap::{CommandFactory, Parser, Subcommand};
use craft_core::{WorkflowStore, config};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "craft: a single-workflow tracker for thinking, shaping, building and shipping",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Use this directory instead of `.craft` (overrides CRAFT_DIR).
    #[arg(long, global = true, value_name = "PATH")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Start a new workflow",
        long_about = "Start a new workflow in the thinking state with the given intent.",
        after_help = "EXAMPLES:\n    # Start with an intent\n    craft start \"Add rate limiting to the public API\"\n\n    # Emit machine-readable output\n    craft start \"Add rate limiting\" --json"
    )]
    Start(cmd::start::StartArgs),

    #[command(
        next_help_heading = "Thinking",
        about = "Show the intent under discussion",
        long_about = "Show the current intent and notes while thinking.",
        after_help = "EXAMPLES:\n    # Review the intent\n    craft think"
    )]
    Think,

    #[command(
        next_help_heading = "Thinking",
        about = "Accept the intent",
        long_about = "Accept the intent and move to shaping, or straight to building with --skip-shaping.",
        after_help = "EXAMPLES:\n    # Accept and shape the work\n    craft accept\n\n    # Small change: skip shaping\n    craft accept --skip-shaping \"one-line fix\""
    )]
    Accept(cmd::accept::AcceptArgs),

    #[command(
        next_help_heading = "Thinking",
        about = "Record a concern about the intent",
        long_about = "Record a concern as a note. The workflow stays in thinking.",
        after_help = "EXAMPLES:\n    # Push back on the intent\n    craft reject \"scope is too broad\""
    )]
    Reject(cmd::reject::RejectArgs),

    #[command(
        next_help_heading = "Shaping",
        about = "Show the shaping documents",
        long_about = "List the pitch and cards in the craft directory and what to do next.",
        after_help = "EXAMPLES:\n    # See what has been shaped\n    craft shape\n\n    # Emit machine-readable output\n    craft shape --json"
    )]
    Shape,

    #[command(
        next_help_heading = "Shaping",
        about = "Approve the structure and start building",
        long_about = "Approve the shaped structure. Requires pitch.md in the craft directory.",
        after_help = "EXAMPLES:\n    # Approve once pitch.md exists\n    craft approve"
    )]
    Approve,

    #[command(
        next_help_heading = "Shaping",
        about = "Request changes to the structure",
        long_about = "Record a revision request as a note. The workflow stays in shaping.",
        after_help = "EXAMPLES:\n    # Ask for changes\n    craft revise \"split the API card in two\""
    )]
    Revise(cmd::revise::ReviseArgs),

    #[command(
        next_help_heading = "Building",
        about = "Mark the work as shipped",
        long_about = "Complete the workflow. Only valid while building.",
        after_help = "EXAMPLES:\n    # Finish the workflow\n    craft ship"
    )]
    Ship,

    #[command(
        next_help_heading = "Read",
        about = "Show workflow status",
        long_about = "Show the state, intent, history, notes and next actions of the workflow.",
        after_help = "EXAMPLES:\n    # Show status\n    craft status\n\n    # Emit machine-readable output\n    craft status --json"
    )]
    Status,

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Abandon the current workflow",
        long_about = "Delete the workflow file after confirmation. Shaping documents are kept.",
        after_help = "EXAMPLES:\n    # Abandon with a prompt\n    craft reset\n\n    # Abandon without asking\n    craft reset --force"
    )]
    Reset(cmd::reset::ResetArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    craft completions bash\n\n    # Generate zsh completions\n    craft completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CRAFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "craft=debug,info"
        } else {
            "craft=info,warn"
        })
    });

    let format = env::var("CRAFT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    if let Commands::Completions(ref args) = cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let project_root = env::current_dir()?;
    let craft_dir = config::craft_dir_from_env(&project_root, cli.dir.as_deref());
    debug!(craft_dir = %craft_dir.display(), "resolved craft directory");
    let store = WorkflowStore::new(craft_dir);

    match cli.command {
        Commands::Start(ref args) => cmd::start::run_start(args, output, &store),
        Commands::Think => cmd::think::run_think(output, &store),
        Commands::Accept(ref args) => cmd::accept::run_accept(args, output, &store),
        Commands::Reject(ref args) => cmd::reject::run_reject(args, output, &store),
        Commands::Shape => cmd::shape::run_shape(output, &store),
        Commands::Approve => cmd::approve::run_approve(output, &store),
        Commands::Revise(ref args) => cmd::revise::run_revise(args, output, &store),
        Commands::Ship => cmd::ship::run_ship(output, &store),
        Commands::Status => cmd::status::run_status(output, &store),
        Commands::Reset(ref args) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            cmd::reset::run_reset(args, output, &store, &mut input)
        }
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = resolve_output_mode(cli.json);

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
