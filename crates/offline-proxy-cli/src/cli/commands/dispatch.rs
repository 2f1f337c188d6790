use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.cmd {
        Command::Install(args) => super::install::run(args, &global).await,
        Command::Activate => super::activate::run(&global).await,
        Command::Fetch(args) => super::fetch::run(args, &global).await,
        Command::List(args) => super::list::run(args, &global).await,
        Command::Purge(args) => super::purge::run(args, &global).await,
        Command::Config => super::config::run(&global),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
