use offline_proxy::{Lifecycle, OfflineWorker, Phase};
use tracing::warn;

use super::super::args::GlobalArgs;
use super::context::Context;
use crate::exit_codes::SUCCESS;

pub async fn run(global: &GlobalArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let worker = ctx.worker().await?;
    activate(&ctx, &worker).await?;
    Ok(SUCCESS)
}

pub(crate) async fn activate(ctx: &Context, worker: &OfflineWorker) -> anyhow::Result<()> {
    let report = worker.on_activate().await?;
    ctx.record_phase(Phase::Active).await?;

    println!("activated {}", ctx.config.cache_name);
    for name in &report.deleted {
        println!("  deleted {}", name);
    }
    for (name, error) in &report.failed {
        warn!(generation = %name, error = %error, "stale generation left behind");
    }
    Ok(())
}
