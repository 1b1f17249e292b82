use crate::auth::{BearerToken, CredentialFetcher, TokenRefreshBridge, TokenSink};
use chrono::Utc;
use rdkafka::client::OAuthToken;
use std::cell::RefCell;
use std::error::Error;

/// How a client context answers librdkafka's OAUTHBEARER refresh callback.
///
/// `ENABLED` decides whether the callback is registered with librdkafka at all.
pub trait RefreshHandler: Send + Sync + 'static {
    const ENABLED: bool;

    fn generate_token(&self, oauthbearer_config: Option<&str>) -> Result<OAuthToken, Box<dyn Error>>;
}

/// librdkafka fetches tokens itself through `sasl.oauthbearer.method=oidc`.
pub struct BrokerManagedRefresh;

impl RefreshHandler for BrokerManagedRefresh {
    const ENABLED: bool = false;

    fn generate_token(&self, _oauthbearer_config: Option<&str>) -> Result<OAuthToken, Box<dyn Error>> {
        Err("Token refresh is handled by librdkafka's OIDC support".into())
    }
}

impl<F: CredentialFetcher + 'static> RefreshHandler for TokenRefreshBridge<F> {
    const ENABLED: bool = true;

    fn generate_token(&self, oauthbearer_config: Option<&str>) -> Result<OAuthToken, Box<dyn Error>> {
        let generated = GeneratedToken::default();
        self.on_refresh_requested(&generated, oauthbearer_config);
        generated.into_result()
    }
}

/// Collects the bridge's answer for one callback invocation. rdkafka sets the token
/// on `Ok` and reports the message through `rd_kafka_oauthbearer_set_token_failure` on `Err`.
#[derive(Default)]
pub struct GeneratedToken {
    outcome: RefCell<Option<Result<OAuthToken, String>>>,
}

impl GeneratedToken {
    pub fn into_result(self) -> Result<OAuthToken, Box<dyn Error>> {
        match self.outcome.into_inner() {
            Some(Ok(token)) => Ok(token),
            Some(Err(reason)) => Err(reason.into()),
            None => Err("Token refresh produced neither a token nor a failure".into()),
        }
    }
}

impl TokenSink for GeneratedToken {
    fn set_token(&self, token: BearerToken) -> Result<(), String> {
        token.validate(Utc::now())?;

        *self.outcome.borrow_mut() = Some(Ok(OAuthToken {
            token: token.value,
            principal_name: token.principal,
            lifetime_ms: token.expires_at_ms,
        }));

        Ok(())
    }

    fn set_token_failure(&self, reason: &str) {
        *self.outcome.borrow_mut() = Some(Err(reason.to_owned()));
    }
}
