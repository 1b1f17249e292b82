use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Reads the `exp` claim of a JWT without verifying it. Opaque tokens yield `None`.
pub fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim = serde_json::from_slice::<ExpiryClaim>(&bytes).ok()?;

    DateTime::from_timestamp(claim.exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            BASE64_URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
            BASE64_URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn reads_exp_claim() {
        let token = jwt_with_payload(r#"{"aud":"https://ns.servicebus.windows.net","exp":1700003600}"#);

        assert_eq!(expiry(&token), DateTime::from_timestamp(1_700_003_600, 0));
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        assert_eq!(expiry("abc123"), None);
        assert_eq!(expiry("a.b.c.d"), None);
    }

    #[test]
    fn payload_without_exp_has_no_expiry() {
        let token = jwt_with_payload(r#"{"sub":"someone"}"#);

        assert_eq!(expiry(&token), None);
    }
}
