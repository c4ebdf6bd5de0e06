use anyhow::Context;
use tracing_subscriber::EnvFilter;
use wdm_host::run;
use wdm_host::settings::Settings;

fn main() -> anyhow::Result<()> {
    let settings = Settings::new().context("Failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level},wdm_embedded={level}").into()
        }))
        .init();

    run(&settings).context("Node stopped")
}
