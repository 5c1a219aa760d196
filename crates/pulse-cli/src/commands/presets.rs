//! Preset management commands

use clap::{Args, Subcommand};
use colored::Colorize;
use pulse_core::DashboardConfig;
use pulse_funnels::{validate_steps, FunnelPreset};

use super::session::Session;
use super::OutputFormat;

#[derive(Args)]
pub struct PresetsCommand {
    #[command(subcommand)]
    pub action: PresetsAction,
}

#[derive(Subcommand)]
pub enum PresetsAction {
    /// List the presets of the selected project
    List {
        /// Output format: text (human-readable) or json (machine-readable)
        #[arg(long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },
    /// Save a step list under a name, replacing a preset with the same name
    Save {
        /// Preset name; "Default" is loaded whenever the project is selected
        name: String,

        /// Comma-separated step names
        #[arg(long, value_delimiter = ',', required = true)]
        steps: Vec<String>,
    },
    /// Delete a preset by name
    Delete { name: String },
}

impl PresetsCommand {
    pub fn execute(self, config: DashboardConfig) -> anyhow::Result<()> {
        let session = Session::open(config)?;
        let project = session.filters.snapshot().project_key;
        let Some(project) = project else {
            anyhow::bail!("No project selected, use `pulse filters set --project <KEY>` first");
        };
        let presets = session.presets();

        match self.action {
            PresetsAction::List { output_format } => {
                let listed = presets.list(Some(&project));
                match output_format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listed)?),
                    OutputFormat::Text => print_presets(&listed),
                }
            }
            PresetsAction::Save { name, steps } => {
                let preset = preset_from_args(&name, steps)?;
                let saved_name = preset.preset_name.clone();
                presets.save(Some(&project), preset);
                println!(
                    "{} {}",
                    "Saved preset".green(),
                    saved_name.bright_cyan().bold()
                );
            }
            PresetsAction::Delete { name } => {
                if !presets.delete(Some(&project), &name) {
                    anyhow::bail!("Preset '{}' not found", name);
                }
                println!("{} {}", "Deleted preset".green(), name.bright_cyan().bold());
            }
        }

        Ok(())
    }
}

/// Only a step list that could run is worth saving
fn preset_from_args(name: &str, steps: Vec<String>) -> anyhow::Result<FunnelPreset> {
    let steps: Vec<String> = steps.into_iter().map(|s| s.trim().to_string()).collect();
    validate_steps(&steps)?;
    Ok(FunnelPreset::new(name, steps)?)
}

fn print_presets(presets: &[FunnelPreset]) {
    if presets.is_empty() {
        println!("{}", "No presets saved for this project.".yellow());
        return;
    }
    for preset in presets {
        println!(
            "{:<20} {}  {}",
            preset.preset_name.bright_white().bold(),
            preset.steps.join(" → "),
            preset
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed()
        );
    }
}
