//! Filter inspection and editing commands

use clap::{Args, Subcommand};
use colored::Colorize;
use pulse_core::{DashboardConfig, ProjectKey};
use pulse_filters::{FilterState, Filters, RefreshInterval};
use tracing::info;

use super::session::Session;
use super::OutputFormat;

#[derive(Args)]
pub struct FiltersCommand {
    #[command(subcommand)]
    pub action: FiltersAction,
}

#[derive(Subcommand)]
pub enum FiltersAction {
    /// Print the persisted filters
    Show {
        /// Output format: text (human-readable) or json (machine-readable)
        #[arg(long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },
    /// Change one or more filters; an empty value clears a text filter
    Set(SetFilters),
    /// Restore every filter to its default
    Reset,
    /// Advance the refresh token, as the refresh button does
    Refresh,
}

#[derive(Args, Default)]
pub struct SetFilters {
    /// Project to report on; an empty value deselects it
    #[arg(long)]
    pub project: Option<String>,

    /// Start of the date range
    #[arg(long)]
    pub from: Option<String>,

    /// End of the date range
    #[arg(long)]
    pub to: Option<String>,

    #[arg(long)]
    pub event: Option<String>,

    #[arg(long)]
    pub user_id: Option<String>,

    #[arg(long)]
    pub anonymous_id: Option<String>,

    /// Enable or disable the auto-refresh timer
    #[arg(long)]
    pub auto_refresh: Option<bool>,

    /// Auto-refresh period: 30s or 60s
    #[arg(long)]
    pub interval: Option<RefreshInterval>,
}

impl SetFilters {
    /// Apply the given flags through the filter setters
    pub fn apply(self, filters: &FilterState) {
        if let Some(project) = self.project {
            filters.set_project_key(ProjectKey::parse(&project));
        }
        if let Some(from) = self.from {
            filters.set_from(from);
        }
        if let Some(to) = self.to {
            filters.set_to(to);
        }
        if let Some(event) = self.event {
            filters.set_event_name(event);
        }
        if let Some(user_id) = self.user_id {
            filters.set_user_id(user_id);
        }
        if let Some(anonymous_id) = self.anonymous_id {
            filters.set_anonymous_id(anonymous_id);
        }
        if let Some(enabled) = self.auto_refresh {
            filters.set_auto_refresh_enabled(enabled);
        }
        if let Some(interval) = self.interval {
            filters.set_auto_refresh_interval(interval);
        }
    }
}

impl FiltersCommand {
    pub fn execute(self, config: DashboardConfig) -> anyhow::Result<()> {
        let session = Session::open(config)?;

        match self.action {
            FiltersAction::Show { output_format } => {
                let filters = session.filters.snapshot();
                match output_format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&filters)?),
                    OutputFormat::Text => print_filters(&filters),
                }
            }
            FiltersAction::Set(set) => {
                set.apply(&session.filters);
                print_filters(&session.filters.snapshot());
            }
            FiltersAction::Reset => {
                session.filters.reset_filters();
                info!("Filters reset");
                println!("{}", "Filters reset to defaults.".green());
            }
            FiltersAction::Refresh => {
                let token = session.filters.trigger_refresh();
                println!("{} {}", "Refresh token:".bright_white().bold(), token);
            }
        }

        Ok(())
    }
}

fn or_any(value: &str) -> String {
    if value.trim().is_empty() {
        "(any)".dimmed().to_string()
    } else {
        value.bright_cyan().to_string()
    }
}

fn print_filters(filters: &Filters) {
    let project = filters
        .project_key
        .as_ref()
        .map(|p| p.as_str().bright_cyan().to_string())
        .unwrap_or_else(|| "(none)".yellow().to_string());
    let auto_refresh = if filters.auto_refresh_enabled {
        format!("every {}", filters.auto_refresh_interval).green()
    } else {
        "off".dimmed()
    };

    println!("{:>14} {}", "Project:".bright_white().bold(), project);
    println!("{:>14} {}", "From:".bright_white().bold(), or_any(&filters.from));
    println!("{:>14} {}", "To:".bright_white().bold(), or_any(&filters.to));
    println!("{:>14} {}", "Event:".bright_white().bold(), or_any(&filters.event_name));
    println!("{:>14} {}", "User:".bright_white().bold(), or_any(&filters.user_id));
    println!(
        "{:>14} {}",
        "Anonymous:".bright_white().bold(),
        or_any(&filters.anonymous_id)
    );
    println!("{:>14} {}", "Refresh:".bright_white().bold(), auto_refresh);
}
