use crate::auth::credential::Credential;
use crate::auth::credential_fetcher::{CredentialFetcher, HttpCredentialFetcher};
use crate::auth::credential_source::CredentialSource;
use crate::auth::jwt;
use crate::auth::token_sink::{BearerToken, TokenSink};
use crate::configurator::RefreshRegistration;
use anyhow::Context;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::runtime::Handle;
use tracing::{error, info, warn};

/// Lifetime assumed for tokens whose response and claims carry no expiry.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 5 * 60;

/// Answers the broker client's token refresh requests with freshly fetched credentials.
///
/// Holds only configuration captured at startup, so concurrent refresh requests
/// from librdkafka threads do not interfere with each other.
pub struct TokenRefreshBridge<F> {
    fetcher: F,
    source: CredentialSource,
    principal: String,
}

impl<F: CredentialFetcher> TokenRefreshBridge<F> {
    pub fn new(fetcher: F, registration: RefreshRegistration) -> Self {
        Self {
            fetcher,
            source: registration.source,
            principal: registration.principal,
        }
    }

    pub fn on_refresh_requested<S: TokenSink + ?Sized>(
        &self,
        sink: &S,
        _oauthbearer_config: Option<&str>,
    ) {
        if let Err(reason) = self.check_source() {
            warn!("Token refresh skipped: {reason}");
            sink.set_token_failure(&reason);
            return;
        }

        let credential = match self.fetcher.fetch(&self.source) {
            Ok(credential) => credential,
            Err(e) => {
                let reason = format!("{:#}", anyhow::Error::new(e));
                error!("Failed to retrieve token: {reason}");
                sink.set_token_failure(&reason);
                return;
            }
        };

        let token = self.to_bearer_token(credential, Utc::now());
        let expires_at_ms = token.expires_at_ms;

        if let Err(reason) = sink.set_token(token) {
            error!("Setting refreshed token failed: {reason}");
            sink.set_token_failure(&reason);
            return;
        }

        info!("Token refreshed, expires at {expires_at_ms} ms");
    }

    fn check_source(&self) -> Result<(), String> {
        match &self.source {
            CredentialSource::ManagedIdentity(identity) if identity.resource_uri.trim().is_empty() => {
                Err("Managed identity resource is not set (EH_NAME missing)".to_owned())
            }
            CredentialSource::ClientCredentials(credentials)
                if credentials.token_endpoint.trim().is_empty() =>
            {
                Err("Token endpoint is not set (TOKEN_ENDPOINT missing)".to_owned())
            }
            _ => Ok(()),
        }
    }

    fn to_bearer_token(&self, credential: Credential, now: DateTime<Utc>) -> BearerToken {
        let expires_at = credential
            .expires_at
            .or_else(|| jwt::expiry(&credential.access_token))
            .unwrap_or(now + TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECS));

        BearerToken {
            value: credential.access_token,
            expires_at_ms: expires_at.timestamp_millis(),
            principal: credential.principal.unwrap_or_else(|| self.principal.clone()),
        }
    }
}

impl TokenRefreshBridge<HttpCredentialFetcher> {
    pub fn with_http_fetcher(
        registration: RefreshRegistration,
        runtime: Handle,
    ) -> Result<Self, anyhow::Error> {
        let fetcher = HttpCredentialFetcher::new(registration.metadata_endpoint.clone(), runtime)
            .context("While creating credential fetcher")?;

        Ok(Self::new(fetcher, registration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ManagedIdentity;
    use crate::error::FetchError;
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFetcher {
        result: fn() -> Result<Credential, FetchError>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn new(result: fn() -> Result<Credential, FetchError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CredentialFetcher for StubFetcher {
        fn fetch(&self, _source: &CredentialSource) -> Result<Credential, FetchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            (self.result)()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        tokens: RefCell<Vec<BearerToken>>,
        failures: RefCell<Vec<String>>,
        reject_with: Option<&'static str>,
    }

    impl TokenSink for RecordingSink {
        fn set_token(&self, token: BearerToken) -> Result<(), String> {
            if let Some(reason) = self.reject_with {
                return Err(reason.to_owned());
            }
            self.tokens.borrow_mut().push(token);
            Ok(())
        }

        fn set_token_failure(&self, reason: &str) {
            self.failures.borrow_mut().push(reason.to_owned());
        }
    }

    fn registration(resource_uri: &str) -> RefreshRegistration {
        RefreshRegistration {
            source: CredentialSource::ManagedIdentity(ManagedIdentity {
                resource_uri: resource_uri.to_owned(),
                client_id: Some("c1".to_owned()),
            }),
            namespace: "ns".to_owned(),
            principal: "principal".to_owned(),
            metadata_endpoint: "http://127.0.0.1:1/token".to_owned(),
        }
    }

    fn ok_token() -> Result<Credential, FetchError> {
        Ok(Credential::new("abc123".to_owned()))
    }

    fn parse_failure() -> Result<Credential, FetchError> {
        Err(FetchError::Parse("response has no access_token field".to_owned()))
    }

    #[test]
    fn fetch_failure_is_reported_once_and_no_token_is_set() {
        let bridge = TokenRefreshBridge::new(
            StubFetcher::new(parse_failure),
            registration("https://ns.servicebus.windows.net/"),
        );
        let sink = RecordingSink::default();

        bridge.on_refresh_requested(&sink, None);

        let failures = sink.failures.borrow();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("access_token"));
        assert!(sink.tokens.borrow().is_empty());
    }

    #[test]
    fn fetched_token_is_set_with_default_expiry() {
        let bridge = TokenRefreshBridge::new(
            StubFetcher::new(ok_token),
            registration("https://ns.servicebus.windows.net/"),
        );
        let sink = RecordingSink::default();
        let before = Utc::now();

        bridge.on_refresh_requested(&sink, None);

        let tokens = sink.tokens.borrow();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, "abc123");
        assert_eq!(tokens[0].principal, "principal");
        let expected = (before + TimeDelta::seconds(DEFAULT_TOKEN_LIFETIME_SECS)).timestamp_millis();
        assert!(tokens[0].expires_at_ms >= expected);
        assert!(tokens[0].expires_at_ms < expected + 60_000);
        assert!(sink.failures.borrow().is_empty());
    }

    #[test]
    fn response_expiry_is_preferred() {
        let bridge = TokenRefreshBridge::new(
            StubFetcher::new(ok_token),
            registration("https://ns.servicebus.windows.net/"),
        );
        let expires_at = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        let credential = Credential {
            expires_at: Some(expires_at),
            principal: Some("identity".to_owned()),
            ..Credential::new("abc123".to_owned())
        };

        let token = bridge.to_bearer_token(credential, Utc::now());

        assert_eq!(token.expires_at_ms, 1_900_000_000_000);
        assert_eq!(token.principal, "identity");
    }

    #[test]
    fn missing_resource_fails_without_fetching() {
        let fetcher = StubFetcher::new(ok_token);
        let bridge = TokenRefreshBridge::new(fetcher, registration(""));
        let sink = RecordingSink::default();

        bridge.on_refresh_requested(&sink, None);

        assert_eq!(bridge.fetcher.calls.load(Ordering::Relaxed), 0);
        assert_eq!(sink.failures.borrow().len(), 1);
        assert!(sink.tokens.borrow().is_empty());
    }

    #[test]
    fn rejected_set_is_surfaced_as_failure() {
        let bridge = TokenRefreshBridge::new(
            StubFetcher::new(ok_token),
            registration("https://ns.servicebus.windows.net/"),
        );
        let sink = RecordingSink {
            reject_with: Some("Token value contains characters not allowed in a bearer token"),
            ..RecordingSink::default()
        };

        bridge.on_refresh_requested(&sink, None);

        assert_eq!(
            sink.failures.borrow().as_slice(),
            ["Token value contains characters not allowed in a bearer token"]
        );
    }
}
