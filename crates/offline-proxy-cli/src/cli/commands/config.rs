use super::super::args::GlobalArgs;
use super::context::load_config;
use crate::exit_codes::SUCCESS;

pub fn run(global: &GlobalArgs) -> anyhow::Result<i32> {
    let config = load_config(global)?;
    // Fails on hard errors, logs contract warnings.
    config.deployment()?;

    print!("{}", serde_yaml::to_string(&config)?);
    Ok(SUCCESS)
}
