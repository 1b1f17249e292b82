use chrono::{DateTime, Utc};
use std::fmt::{Debug, Formatter};

/// Number of leading token characters that may appear in logs.
pub const VISIBLE_TOKEN_PREFIX: usize = 10;

/// A bearer credential obtained by a single fetch.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// `None` when the token response did not say when the token expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub principal: Option<String>,
}

impl Credential {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            expires_at: None,
            principal: None,
        }
    }

    pub fn token_prefix(&self) -> &str {
        token_prefix(&self.access_token)
    }
}

pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(VISIBLE_TOKEN_PREFIX) {
        Some((index, _)) => &token[..index],
        None => token,
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field(
                "access_token",
                &format_args!(
                    "{}... ({} chars)",
                    self.token_prefix(),
                    self.access_token.len()
                ),
            )
            .field("expires_at", &self.expires_at)
            .field("principal", &self.principal)
            .finish()
    }
}
