use std::io::Write;

use offline_proxy::{Lifecycle, ResourceIdentity};

use super::super::args::{FetchArgs, GlobalArgs};
use super::context::Context;
use crate::exit_codes::SUCCESS;

pub async fn run(args: FetchArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let worker = ctx.worker().await?;

    let target = if args.path.starts_with("http://") || args.path.starts_with("https://") {
        ResourceIdentity::parse(&args.path)?
    } else {
        ctx.config.resolve(&args.path)?
    };
    let identity = target.with_method(&args.method)?;

    let routed = worker.on_intercept(&identity).await;

    let mut stdout = std::io::stdout().lock();
    if args.include {
        writeln!(stdout, "{} {}", routed.artifact.status, routed.source)?;
        for (name, value) in &routed.artifact.headers {
            writeln!(stdout, "{}: {}", name, value)?;
        }
        writeln!(stdout)?;
    }
    stdout.write_all(&routed.artifact.body)?;
    stdout.flush()?;

    eprintln!("{} {} {}", routed.artifact.status, routed.source, identity);
    Ok(SUCCESS)
}
