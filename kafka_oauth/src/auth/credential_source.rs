use std::fmt::{Debug, Formatter};

/// Where bearer tokens come from. Chosen once at startup.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    ClientCredentials(ClientCredentials),
    ManagedIdentity(ManagedIdentity),
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_endpoint: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedIdentity {
    pub resource_uri: String,
    /// Selects a user-assigned identity; the system identity is used when absent.
    pub client_id: Option<String>,
}

impl CredentialSource {
    pub fn kind(&self) -> &'static str {
        match self {
            CredentialSource::ClientCredentials(_) => "client credentials",
            CredentialSource::ManagedIdentity(_) => "managed identity",
        }
    }
}

impl Debug for CredentialSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::ClientCredentials(credentials) => {
                f.debug_tuple("ClientCredentials").field(credentials).finish()
            }
            CredentialSource::ManagedIdentity(identity) => {
                f.debug_tuple("ManagedIdentity").field(identity).finish()
            }
        }
    }
}

impl Debug for ClientCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("token_endpoint", &self.token_endpoint)
            .field("scope", &self.scope)
            .finish()
    }
}
