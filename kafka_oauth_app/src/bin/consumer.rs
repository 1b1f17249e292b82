#![warn(unused_imports)]
#![deny(clippy::clone_on_copy)]
#![deny(clippy::style)]

use anyhow::Context;
use kafka_oauth_app::app_config::AppConfig;
use kafka_oauth_app::startup::{init_tracing, run_consumer};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();

    let config = AppConfig::build().context("While building app config")?;

    run_consumer(config).await
}
