use offline_proxy::{Lifecycle, OfflineWorker, Phase};

use super::super::args::{GlobalArgs, InstallArgs};
use super::activate;
use super::context::Context;
use crate::exit_codes::{INCOMPLETE_INSTALL, SUCCESS};

pub async fn run(args: InstallArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;

    // A new install always starts a fresh worker for this generation.
    let worker = OfflineWorker::from_config(&ctx.config)?;
    let report = worker.on_install().await?;
    ctx.record_phase(Phase::Installed).await?;

    println!(
        "installed {} ({}): {} cached, {} skipped",
        ctx.config.cache_name,
        ctx.config.precache_strategy,
        report.cached.len(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {} ({})", skipped.identity, skipped.reason);
    }

    if args.activate {
        activate::activate(&ctx, &worker).await?;
    }

    Ok(if report.is_complete() {
        SUCCESS
    } else {
        INCOMPLETE_INSTALL
    })
}
