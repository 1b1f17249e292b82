//! Turns environment values into broker-client settings.
//!
//! Direct client credentials (client id, secret and token endpoint present) are handed to
//! librdkafka's built-in OIDC support. Anything else falls back to the platform
//! managed identity, fetched by [`TokenRefreshBridge`](crate::auth::TokenRefreshBridge)
//! whenever librdkafka asks for a fresh token.

use crate::auth::{ClientCredentials, CredentialSource, ManagedIdentity, DEFAULT_IMDS_ENDPOINT};
use crate::connection_settings::{ClientRole, ConnectionSettings};
use crate::error::ConfigError;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DOMAIN_SUFFIX: &str = "servicebus.windows.net";
pub const KAFKA_PORT: u16 = 9093;
pub const DEFAULT_GROUP_ID: &str = "kafka-oauth-getting-started";
pub const DEFAULT_PRINCIPAL: &str = "kafka-oauth";

/// Raw values as read from the process environment or settings file.
#[derive(Debug, Default, Clone)]
pub struct EnvironmentValues {
    pub eh_name: Option<String>,
    pub topic: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_endpoint: Option<String>,
    pub group_id: Option<String>,
    pub principal: Option<String>,
    pub imds_endpoint: Option<String>,
    pub rd_kafka_debug: Option<String>,
}

/// Everything the token refresh bridge needs, captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRegistration {
    pub source: CredentialSource,
    pub namespace: String,
    pub principal: String,
    pub metadata_endpoint: String,
}

pub fn bootstrap_servers(namespace: &str) -> String {
    format!("{namespace}.{DOMAIN_SUFFIX}:{KAFKA_PORT}")
}

pub fn resource_uri(namespace: &str) -> String {
    format!("https://{namespace}.{DOMAIN_SUFFIX}/")
}

pub fn scope(namespace: &str) -> String {
    format!("https://{namespace}.{DOMAIN_SUFFIX}/.default")
}

pub fn build(
    env: &EnvironmentValues,
    role: ClientRole,
) -> Result<(ConnectionSettings, Option<RefreshRegistration>), ConfigError> {
    let namespace = present(&env.eh_name);
    let topic = present(&env.topic);
    let client_id = present(&env.client_id);
    let client_secret = present(&env.client_secret);
    let token_endpoint = present(&env.token_endpoint);

    let mut missing = vec![];
    if namespace.is_none() {
        missing.push("EH_NAME");
    }
    if topic.is_none() {
        missing.push("TOPIC");
    }

    let (Some(namespace), Some(topic)) = (namespace, topic) else {
        return Err(ConfigError::MissingRequired(missing));
    };

    let direct_credentials = client_secret.zip(token_endpoint);
    if direct_credentials.is_some() && client_id.is_none() {
        warn!("CLIENT_SECRET and TOKEN_ENDPOINT are set without CLIENT_ID, using managed identity");
    }

    let mut settings = ConnectionSettings {
        role,
        topic: topic.to_owned(),
        properties: BTreeMap::new(),
        credential_source: CredentialSource::ManagedIdentity(ManagedIdentity {
            resource_uri: resource_uri(namespace),
            client_id: client_id.map(str::to_owned),
        }),
    };

    settings
        .set("bootstrap.servers", bootstrap_servers(namespace))
        .set("security.protocol", "SASL_SSL")
        .set("sasl.mechanism", "OAUTHBEARER");

    match role {
        ClientRole::Consumer => {
            settings
                .set(
                    "group.id",
                    present(&env.group_id).unwrap_or(DEFAULT_GROUP_ID),
                )
                .set("auto.offset.reset", "earliest")
                .set("enable.partition.eof", "true");
        }
        ClientRole::Producer => {
            settings.set("acks", "all");
        }
    }

    if let Some(debug_contexts) = present(&env.rd_kafka_debug) {
        settings.set("debug", debug_contexts);
    }

    let registration = match (direct_credentials, client_id) {
        (Some((client_secret, token_endpoint)), Some(client_id)) => {
            let credentials = ClientCredentials {
                client_id: client_id.to_owned(),
                client_secret: client_secret.to_owned(),
                token_endpoint: token_endpoint.to_owned(),
                scope: scope(namespace),
            };
            settings
                .set("sasl.oauthbearer.method", "oidc")
                .set("sasl.oauthbearer.client.id", credentials.client_id.as_str())
                .set("sasl.oauthbearer.client.secret", credentials.client_secret.as_str())
                .set(
                    "sasl.oauthbearer.token.endpoint.url",
                    credentials.token_endpoint.as_str(),
                )
                .set("sasl.oauthbearer.scope", credentials.scope.as_str());
            settings.credential_source = CredentialSource::ClientCredentials(credentials);
            None
        }
        _ => Some(RefreshRegistration {
            source: settings.credential_source.clone(),
            namespace: namespace.to_owned(),
            principal: present(&env.principal)
                .unwrap_or(DEFAULT_PRINCIPAL)
                .to_owned(),
            metadata_endpoint: present(&env.imds_endpoint)
                .unwrap_or(DEFAULT_IMDS_ENDPOINT)
                .to_owned(),
        }),
    };

    info!(
        "Using {} credentials for {:?} on topic {}",
        settings.credential_source.kind(),
        role,
        settings.topic
    );
    debug!("Connection settings: {settings:?}");

    Ok((settings, registration))
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
