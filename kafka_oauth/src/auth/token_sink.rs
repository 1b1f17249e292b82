use chrono::{DateTime, Utc};

/// A token ready to be handed to the broker client.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at_ms: i64,
    pub principal: String,
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field(
                "value",
                &format_args!("{}...", crate::auth::token_prefix(&self.value)),
            )
            .field("expires_at_ms", &self.expires_at_ms)
            .field("principal", &self.principal)
            .finish()
    }
}

impl BearerToken {
    /// Applies the checks librdkafka runs when a token is set.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), String> {
        if self.value.is_empty() {
            return Err("Token value must not be empty".to_owned());
        }

        // RFC 7628: 1*( ALPHA / DIGIT / "-" / "." / "_" / "~" / "+" / "/" ) *"="
        let body = self.value.trim_end_matches('=');
        if body.is_empty()
            || !body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '+' | '/'))
        {
            return Err("Token value contains characters not allowed in a bearer token".to_owned());
        }

        if self.principal.is_empty() {
            return Err("Principal name must not be empty".to_owned());
        }

        if self.expires_at_ms <= now.timestamp_millis() {
            return Err(format!(
                "Token has already expired (expiry {} ms)",
                self.expires_at_ms
            ));
        }

        Ok(())
    }
}

/// The broker client's token-set and token-failure operations.
pub trait TokenSink {
    fn set_token(&self, token: BearerToken) -> Result<(), String>;

    fn set_token_failure(&self, reason: &str);
}
