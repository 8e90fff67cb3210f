use anyhow::{Context, Result};
use calc_service::config::Config;
use calc_service::{logging, server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let (subscriber, _guards) = logging::build_subscriber(&config.log)?;
    tracing::subscriber::set_global_default(subscriber)
        .context("ロガーを初期化できません")?;

    server::serve(&config).await
}
