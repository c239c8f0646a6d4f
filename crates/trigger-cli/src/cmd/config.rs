use super::Context;
use crate::output::print_json;
use anyhow::Context as _;
use serde::Serialize;
use trigger_core::config::{ConfigWarning, ExplorerConfig};

#[derive(Serialize)]
struct ConfigReport {
    config: ExplorerConfig,
    warnings: Vec<ConfigWarning>,
}

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let config = ExplorerConfig::load(&ctx.root).context("failed to load config")?;
    let warnings = config.validate();

    if ctx.json {
        return print_json(&ConfigReport { config, warnings });
    }

    print!("{}", serde_yaml::to_string(&config)?);
    for w in &warnings {
        println!("warning: {}: {}", w.field, w.message);
    }
    Ok(())
}
