//! Funnel commands

use clap::{Args, Subcommand};
use colored::Colorize;
use pulse_core::{DashboardConfig, FunnelMode};
use pulse_funnels::{overall_conversion_percent, FunnelPage, FunnelStepResult};
use tracing::debug;

use super::session::Session;
use super::OutputFormat;

#[derive(Args)]
pub struct FunnelCommand {
    #[command(subcommand)]
    pub action: FunnelAction,
}

#[derive(Subcommand)]
pub enum FunnelAction {
    /// Run a funnel once with the persisted filters
    Run(FunnelArgs),
}

/// How the funnel to run is defined
#[derive(Args, Clone)]
pub struct FunnelArgs {
    /// Comma-separated step names, e.g. app_open,login,purchase
    #[arg(long, value_delimiter = ',')]
    pub steps: Option<Vec<String>>,

    /// Start from a saved preset of the selected project
    #[arg(long, conflicts_with = "steps")]
    pub preset: Option<String>,

    /// Count distinct users or processes
    #[arg(long, default_value = "user")]
    pub mode: FunnelMode,

    /// Process to follow in process mode
    #[arg(long)]
    pub process_name: Option<String>,

    /// Output format: text (human-readable) or json (machine-readable)
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl FunnelArgs {
    /// Apply the flags to a freshly mounted page
    pub fn configure(&self, page: &mut FunnelPage) -> anyhow::Result<()> {
        if let Some(name) = &self.preset {
            if !page.load_preset(name) {
                anyhow::bail!("Preset '{}' not found for the selected project", name);
            }
        }
        if let Some(steps) = &self.steps {
            page.replace_steps(steps.clone())?;
        }
        page.set_mode(self.mode);
        if let Some(process_name) = &self.process_name {
            page.set_process_name(process_name.as_str());
        }
        debug!("Funnel steps: {:?}", page.definition().steps());
        Ok(())
    }
}

impl FunnelCommand {
    pub fn execute(self, config: DashboardConfig) -> anyhow::Result<()> {
        let FunnelAction::Run(args) = self.action;

        let session = Session::open(config)?;
        let mut page = session.funnel_page()?;
        args.configure(&mut page)?;

        let outcome = session.runtime.block_on(page.run());
        print_report(&page, args.output_format)?;
        outcome.map_err(|e| anyhow::anyhow!(e.user_message()))
    }
}

/// Render the page's current report, or its banner after a failure
pub fn print_report(page: &FunnelPage, format: OutputFormat) -> anyhow::Result<()> {
    let Some(results) = page.report().data() else {
        if let Some(message) = page.report().error() {
            eprintln!("{} {}", "Error:".bright_red().bold(), message);
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "mode": page.definition().mode(),
                "steps": results,
                "overallConversionPercent": overall_conversion_percent(results),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_table(results, page.definition().mode()),
    }
    Ok(())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_table(results: &[FunnelStepResult], mode: FunnelMode) {
    const BAR_WIDTH: f64 = 30.0;

    println!(
        "{:<24} {:>10} {:>10} {:>10}",
        "Step".bright_white().bold(),
        mode.count_label().bright_white().bold(),
        "Conv.".bright_white().bold(),
        "Drop-off".bright_white().bold()
    );
    for step in results {
        let bar_len = (step.bar_width_percent / 100.0 * BAR_WIDTH).round().max(0.0) as usize;
        println!(
            "{:<24} {:>10} {:>10} {:>10} {}",
            step.event_name,
            step.count,
            percent(step.conversion_rate_percent),
            percent(step.drop_off_percent).red(),
            "█".repeat(bar_len.min(BAR_WIDTH as usize)).bright_cyan()
        );
    }
    println!(
        "{} {:.1}%",
        "Overall conversion:".bright_white().bold(),
        overall_conversion_percent(results)
    );
}
