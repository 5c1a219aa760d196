//! Live funnel view driven by the refresh signal

use clap::Args;
use colored::Colorize;
use pulse_core::DashboardConfig;
use tracing::{info, warn};

use super::funnel::{print_report, FunnelArgs};
use super::session::Session;

#[derive(Args)]
pub struct WatchCommand {
    #[command(flatten)]
    pub funnel: FunnelArgs,
}

impl WatchCommand {
    pub fn execute(self, config: DashboardConfig) -> anyhow::Result<()> {
        let session = Session::open(config)?;
        let mut page = session.funnel_page()?;
        self.funnel.configure(&mut page)?;

        let live = match session.filters.snapshot().desired_schedule() {
            Some(interval) => {
                info!("Auto-refresh every {}", interval);
                true
            }
            None => {
                warn!("Auto-refresh is off or no project is selected, showing a single run");
                false
            }
        };

        let format = self.funnel.output_format;
        let mut subscription = session.filters.subscribe();

        session.runtime.block_on(async {
            loop {
                if let Err(e) = page.run().await {
                    warn!("Funnel run failed: {}", e);
                }
                print_report(&page, format)?;
                if !live {
                    break;
                }

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        println!("{}", "Stopped.".dimmed());
                        break;
                    }
                    next = subscription.refresh_requested() => {
                        if next.is_none() {
                            break;
                        }
                        println!();
                    }
                }
            }
            Ok::<_, anyhow::Error>(())
        })
    }
}
