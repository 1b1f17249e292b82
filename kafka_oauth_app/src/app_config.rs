use anyhow::Context;
use config::{Config, Environment};
use kafka_oauth::configurator::EnvironmentValues;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use tracing::info;

/// Values read from an optional `appsettings` file and the process environment,
/// e.g. `EH_NAME`, `TOPIC`, `CLIENT_ID`, `CLIENT_SECRET`, `TOKEN_ENDPOINT`.
#[derive(Deserialize, Default)]
pub struct AppConfig {
    pub eh_name: Option<String>,
    pub topic: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_endpoint: Option<String>,
    pub group_id: Option<String>,
    pub principal: Option<String>,
    pub imds_endpoint: Option<String>,
    pub rd_kafka_debug: Option<String>,
    pub message_count: Option<usize>,
}

impl AppConfig {
    pub fn build() -> Result<Self, anyhow::Error> {
        Self::build_with(Environment::default())
    }

    fn build_with(environment: Environment) -> Result<Self, anyhow::Error> {
        let config = Config::builder()
            .add_source(config::File::with_name("appsettings").required(false))
            .add_source(environment)
            .build()
            .context("While building config")?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, anyhow::Error> {
        let deserialized_config: Self = config
            .try_deserialize()
            .context("While deserializing config")?;

        info!("App config: {deserialized_config:?}");

        Ok(deserialized_config)
    }
}

impl Debug for AppConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("eh_name", &self.eh_name)
            .field("topic", &self.topic)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("token_endpoint", &self.token_endpoint)
            .field("group_id", &self.group_id)
            .field("principal", &self.principal)
            .field("imds_endpoint", &self.imds_endpoint)
            .field("rd_kafka_debug", &self.rd_kafka_debug)
            .field("message_count", &self.message_count)
            .finish()
    }
}

impl From<&AppConfig> for EnvironmentValues {
    fn from(value: &AppConfig) -> Self {
        Self {
            eh_name: value.eh_name.clone(),
            topic: value.topic.clone(),
            client_id: value.client_id.clone(),
            client_secret: value.client_secret.clone(),
            token_endpoint: value.token_endpoint.clone(),
            group_id: value.group_id.clone(),
            principal: value.principal.clone(),
            imds_endpoint: value.imds_endpoint.clone(),
            rd_kafka_debug: value.rd_kafka_debug.clone(),
        }
    }
}
