//! Project listing command

use clap::Args;
use colored::Colorize;
use pulse_core::DashboardConfig;

use super::session::Session;
use super::OutputFormat;

#[derive(Args)]
pub struct ProjectsCommand {
    /// Output format: text (human-readable) or json (machine-readable)
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl ProjectsCommand {
    pub fn execute(self, config: DashboardConfig) -> anyhow::Result<()> {
        let session = Session::open(config)?;
        let service = session.funnel_service()?;

        let projects = session
            .runtime
            .block_on(service.list_projects())
            .map_err(|e| anyhow::anyhow!("Failed to list projects: {}", e.user_message()))?;
        let selected = session.filters.snapshot().project_key;

        match self.output_format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            }
            OutputFormat::Text => {
                if projects.is_empty() {
                    println!("{}", "No projects found.".yellow());
                    return Ok(());
                }
                for project in &projects {
                    let marker = if selected.as_ref() == Some(&project.project_key) {
                        "*".bright_green().bold()
                    } else {
                        " ".normal()
                    };
                    let status = if project.is_active {
                        "active".green()
                    } else {
                        "inactive".dimmed()
                    };
                    println!(
                        "{} {:<24} {:<24} {}",
                        marker,
                        project.name.bright_white().bold(),
                        project.project_key.as_str().bright_cyan(),
                        status
                    );
                }
            }
        }

        Ok(())
    }
}
