use anyhow::Context;

use scry_demo::{DemoConfig, run};

fn main() -> anyhow::Result<()> {
    scry_observability::init();

    let config = DemoConfig::from_env().context("invalid demo configuration")?;
    tracing::info!(?config, "starting crystal-ball scenario");

    let outcome = run(&config).context("scenario failed")?;
    if !outcome.shattered {
        tracing::warn!(turns = outcome.turns, "the wizard never broke the ball");
    }
    Ok(())
}
