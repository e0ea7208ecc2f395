//! Usage command - sync and display API quota.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Skip the rate-limit sync and show local defaults.
    #[arg(long)]
    pub no_sync: bool,
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::build(cli).await?;

    if !args.no_sync {
        let synced = ctx.sync_usage().await;
        info!(synced = synced, "Usage sync finished");
    }

    let counters = ctx.meter.snapshot();
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_usage(&counters));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_usage(&counters)?);
        }
    }

    Ok(())
}
