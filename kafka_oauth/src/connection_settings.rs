use crate::auth::CredentialSource;
use rdkafka::ClientConfig;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClientRole {
    Consumer,
    Producer,
}

/// librdkafka properties for one client plus the credential source they were derived from.
pub struct ConnectionSettings {
    pub role: ClientRole,
    pub topic: String,
    pub properties: BTreeMap<String, String>,
    pub credential_source: CredentialSource,
}

impl ConnectionSettings {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.properties.insert(key.to_owned(), value.into());
        self
    }
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let properties = self
            .properties
            .iter()
            .map(|(key, value)| {
                let value = if key.contains("secret") { "***" } else { value.as_str() };
                (key.as_str(), value)
            })
            .collect::<BTreeMap<_, _>>();

        f.debug_struct("ConnectionSettings")
            .field("role", &self.role)
            .field("topic", &self.topic)
            .field("properties", &properties)
            .field("credential_source", &self.credential_source)
            .finish()
    }
}

impl From<&ConnectionSettings> for ClientConfig {
    fn from(value: &ConnectionSettings) -> Self {
        let mut config = ClientConfig::new();
        for (key, property) in &value.properties {
            config.set(key, property);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClientCredentials;

    #[test]
    fn debug_hides_client_secret() {
        let mut settings = ConnectionSettings {
            role: ClientRole::Producer,
            topic: "hub1".to_owned(),
            properties: BTreeMap::new(),
            credential_source: CredentialSource::ClientCredentials(ClientCredentials {
                client_id: "c1".to_owned(),
                client_secret: "s1-very-secret".to_owned(),
                token_endpoint: "https://x/token".to_owned(),
                scope: "https://ns.servicebus.windows.net/.default".to_owned(),
            }),
        };
        settings.set("sasl.oauthbearer.client.secret", "s1-very-secret");

        let printed = format!("{settings:?}");

        assert!(!printed.contains("s1-very-secret"));
        assert!(printed.contains("https://x/token"));
    }

    #[test]
    fn properties_are_copied_into_client_config() {
        let mut settings = ConnectionSettings {
            role: ClientRole::Consumer,
            topic: "hub1".to_owned(),
            properties: BTreeMap::new(),
            credential_source: CredentialSource::ManagedIdentity(crate::auth::ManagedIdentity {
                resource_uri: "https://ns.servicebus.windows.net/".to_owned(),
                client_id: None,
            }),
        };
        settings
            .set("bootstrap.servers", "ns.servicebus.windows.net:9093")
            .set("group.id", "group");

        let config = ClientConfig::from(&settings);

        assert_eq!(config.get("bootstrap.servers"), Some("ns.servicebus.windows.net:9093"));
        assert_eq!(config.get("group.id"), Some("group"));
    }
}
