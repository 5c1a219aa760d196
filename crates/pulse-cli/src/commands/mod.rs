pub mod filters;
pub mod funnel;
pub mod presets;
pub mod projects;
pub mod session;
pub mod watch;

pub use filters::FiltersCommand;
pub use funnel::FunnelCommand;
pub use presets::PresetsCommand;
pub use projects::ProjectsCommand;
pub use session::GlobalArgs;
pub use watch::WatchCommand;

/// Output format shared by the commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors and formatting
    #[default]
    Text,
    /// JSON output for automation and scripting
    Json,
}
