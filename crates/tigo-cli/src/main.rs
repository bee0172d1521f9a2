mod cmd;
mod context;
mod output;
mod prompt;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, rc::RcSubcommand, show::ShowSubcommand};
use context::AppContext;
use std::path::PathBuf;
use tigo_core::TigoError;

#[derive(Parser)]
#[command(
    name = "tigo",
    about = "Scaffold, configure and run tigo servers",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(long, global = true, env = "TIGO_WORKDIR")]
    dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Print debug logs to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and edit the runtime config (.tigorc)
    Rc {
        #[command(subcommand)]
        subcommand: RcSubcommand,
    },

    /// Show project information
    Show {
        #[command(subcommand)]
        subcommand: ShowSubcommand,
    },

    /// Read and edit the CLI config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Start the tigo server
    Start {
        /// Start with node even if pm2 is available
        #[arg(long)]
        directly: bool,
    },

    /// Stop the tigo server
    Stop,

    /// Restart the tigo server with its last start type
    Restart,

    /// Add an official module to the tigo server
    Add {
        /// Module name, installed as @tigojs/<name>
        name: String,
    },

    /// Upgrade an installed module to its latest version
    Upgrade {
        /// Module name, with or without the @tigojs/ scope
        name: String,
    },

    /// Remove a module from the tigo server
    Remove {
        /// Module name, with or without the @tigojs/ scope
        name: String,
    },

    /// Initialize a project from a tigo template
    Init {
        /// Template to use (server)
        template: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let work_dir = root::resolve_work_dir(cli.dir.as_deref());

    let result = AppContext::load(work_dir, cli.yes).and_then(|mut ctx| match cli.command {
        Commands::Rc { subcommand } => cmd::rc::run(&ctx, subcommand),
        Commands::Show { subcommand } => cmd::show::run(&ctx, subcommand),
        Commands::Config { subcommand } => cmd::config::run(&mut ctx, subcommand),
        Commands::Start { directly } => cmd::server::start(&mut ctx, directly),
        Commands::Stop => cmd::server::stop(&mut ctx),
        Commands::Restart => cmd::server::restart(&mut ctx),
        Commands::Add { name } => cmd::add::run(&mut ctx, &name),
        Commands::Upgrade { name } => cmd::upgrade::run(&mut ctx, &name),
        Commands::Remove { name } => cmd::remove::run(&mut ctx, &name),
        Commands::Init { template } => cmd::init::run(&mut ctx, &template),
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// Exit code of the first `TigoError` in the chain; -1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<TigoError>())
        .map(TigoError::exit_code)
        .unwrap_or(-1)
}
