mod cmd;
mod context;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use scopecast_core::paths;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "scopecast",
    about = "Turn a product description into a costed, scheduled delivery estimate",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.scopecast/config.yaml)
    #[arg(long, global = true, env = paths::CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the generation service for a new estimate
    Analyze(cmd::analyze::AnalyzeArgs),

    /// Recompute costs for a saved estimate, with optional rate overrides
    Report(cmd::report::ReportArgs),

    /// Show the week/month timeline of a saved estimate
    Timeline(cmd::timeline::TimelineArgs),

    /// List the role roster estimates are built from
    Roles,

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the HTTP API server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = match context::Context::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze(args) => cmd::analyze::run(&ctx, args, cli.json),
        Commands::Report(args) => cmd::report::run(&ctx, args, cli.json),
        Commands::Timeline(args) => cmd::timeline::run(&ctx, args, cli.json),
        Commands::Roles => cmd::roles::run(&ctx, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&ctx, port),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
