use crate::auth::credential::Credential;
use crate::error::FetchError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Token endpoint and metadata service response. Fields other than these are ignored,
/// and lifetime values of an unexpected shape are treated as absent.
#[derive(Deserialize)]
pub struct OidcToken {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<Value>,
    #[serde(default)]
    pub expires_on: Option<Value>,
}

/// The metadata service sends numbers as strings, token endpoints usually don't.
fn whole_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Reads the OAuth error fields of a rejected token request.
pub fn error_description(body: &str) -> Option<String> {
    let document = serde_json::from_str::<Value>(body).ok()?;
    ["error_description", "error"]
        .into_iter()
        .find_map(|field| document.get(field)?.as_str().map(str::to_owned))
}

impl OidcToken {
    /// `expires_on` wins over `expires_in`.
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if let Some(expires_on) = self.expires_on.as_ref().and_then(whole_seconds) {
            return DateTime::from_timestamp(expires_on, 0);
        }

        let expires_in = self.expires_in.as_ref().and_then(whole_seconds)?;
        now.checked_add_signed(TimeDelta::try_seconds(expires_in)?)
    }

    pub fn into_credential(self, now: DateTime<Utc>) -> Result<Credential, FetchError> {
        let expires_at = self.expires_at(now);
        let access_token = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| FetchError::Parse("response has no access_token field".to_owned()))?;

        Ok(Credential {
            access_token,
            expires_at,
            principal: None,
        })
    }
}

pub fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<Credential, FetchError> {
    let token = serde_json::from_str::<OidcToken>(body)
        .map_err(|e| FetchError::Parse(format!("response is not a token document: {e}")))?;

    token.into_credential(now)
}
