//! Pulse CLI - terminal front end of the analytics dashboard
//!
//! Drives the shared filters, funnel engine and presets against a reporting
//! API, persisting state in a local directory.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    FiltersCommand, FunnelCommand, GlobalArgs, PresetsCommand, ProjectsCommand, WatchCommand,
};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "PULSE_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "PULSE_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the projects of the reporting API
    Projects(ProjectsCommand),
    /// Show and edit the persisted dashboard filters
    Filters(FiltersCommand),
    /// Run funnels with the persisted filters
    Funnel(FunnelCommand),
    /// Manage saved funnel presets of the selected project
    Presets(PresetsCommand),
    /// Re-run a funnel on every refresh signal until Ctrl-C
    Watch(WatchCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise scope the level to our crates
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()?
    } else {
        tracing_subscriber::EnvFilter::try_new(format!(
            "pulse_cli={level},\
             pulse_core={level},\
             pulse_kv={level},\
             pulse_filters={level},\
             pulse_funnels={level},\
             pulse_client={level},\
             h2=warn,\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn",
            level = cli.log_level
        ))?
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .with_writer(std::io::stderr)
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.global.into_config();
    match cli.command {
        Commands::Projects(cmd) => cmd.execute(config),
        Commands::Filters(cmd) => cmd.execute(config),
        Commands::Funnel(cmd) => cmd.execute(config),
        Commands::Presets(cmd) => cmd.execute(config),
        Commands::Watch(cmd) => cmd.execute(config),
    }
}
