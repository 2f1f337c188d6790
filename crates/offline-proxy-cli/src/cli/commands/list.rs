use offline_proxy::{Cache, CacheStorage};
use serde::Serialize;

use super::super::args::{GlobalArgs, ListArgs};
use super::context::Context;
use crate::exit_codes::SUCCESS;

#[derive(Debug, Serialize)]
struct GenerationSummary {
    name: String,
    current: bool,
    entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<Vec<String>>,
}

pub async fn run(args: ListArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    if !matches!(args.format.as_str(), "text" | "json") {
        anyhow::bail!("unknown format '{}' (expected text or json)", args.format);
    }

    let ctx = Context::load(global)?;
    let storage = ctx.storage();

    let mut summaries = Vec::new();
    for name in storage.names().await? {
        let keys = storage.open(&name).await?.keys().await?;
        summaries.push(GenerationSummary {
            current: name == ctx.config.cache_name,
            entries: keys.len(),
            keys: args
                .entries
                .then(|| keys.iter().map(ToString::to_string).collect()),
            name,
        });
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(SUCCESS);
    }

    if summaries.is_empty() {
        println!("no cache generations in {}", ctx.root.display());
    }
    for summary in &summaries {
        let marker = if summary.current { "*" } else { " " };
        println!("{} {} ({} entries)", marker, summary.name, summary.entries);
        for key in summary.keys.iter().flatten() {
            println!("    {}", key);
        }
    }
    Ok(SUCCESS)
}
