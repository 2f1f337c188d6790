use offline_proxy::{reap_stale_generations, CacheStorage};
use tracing::warn;

use super::super::args::{GlobalArgs, PurgeArgs};
use super::context::Context;
use super::state;
use crate::exit_codes::SUCCESS;

pub async fn run(args: PurgeArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    if !args.stale && !args.all && args.names.is_empty() {
        anyhow::bail!("nothing to purge: name generations, or pass --stale or --all");
    }

    let ctx = Context::load(global)?;
    let storage = ctx.storage();
    let current = ctx.config.cache_name.as_str();

    let deleted = if args.stale {
        let report = reap_stale_generations(&storage, current).await?;
        for (name, error) in &report.failed {
            warn!(generation = %name, error = %error, "failed to delete generation");
        }
        report.deleted
    } else {
        let targets = if args.all {
            storage.names().await?
        } else {
            args.names
        };

        let mut deleted = Vec::new();
        for name in targets {
            if storage.delete(&name).await? {
                deleted.push(name);
            } else {
                warn!(generation = %name, "no such generation");
            }
        }
        deleted
    };

    // The recorded phase belonged to the generation that is now gone.
    if deleted.iter().any(|name| name == current) {
        state::clear(&ctx.root).await?;
    }

    if deleted.is_empty() {
        println!("nothing deleted");
    }
    for name in &deleted {
        println!("deleted {}", name);
    }
    Ok(SUCCESS)
}
