//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// The four credential strings issued for an application and user
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// Names of the credential fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// RFC 3986 percent-encoding
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Build the `Authorization` header for a request
///
/// `params` are the query or form parameters of the request, unencoded.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    authorization_header_with(credentials, method, url, params, &nonce, &timestamp)
}

/// Deterministic variant of [`authorization_header`]
pub fn authorization_header_with(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params = [
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(credentials, method, url, params, &oauth_params);

    let mut fields: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    fields.push(format!("oauth_signature=\"{}\"", encode(&signature)));

    format!("OAuth {}", fields.join(", "))
}

fn sign(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(String, String)],
    oauth_params: &[(&str, &str)],
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_token_secret)
    );

    // HMAC accepts keys of any length
    let mut mac = match HmacSha1::new_from_slice(signing_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_credentials() -> Credentials {
        Credentials::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        )
    }

    #[test]
    fn test_reference_signature() {
        let params = vec![
            ("include_entities".to_string(), "true".to_string()),
            (
                "status".to_string(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".to_string(),
            ),
        ];
        let header = authorization_header_with(
            &reference_credentials(),
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
            "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            "1318622958",
        );

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
    }

    #[test]
    fn test_nonce_changes() {
        let creds = reference_credentials();
        let a = authorization_header(&creds, "GET", "https://example.com", &[]);
        let b = authorization_header(&creds, "GET", "https://example.com", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_fields() {
        let creds = Credentials::new("key", " ", "", "secret");
        assert_eq!(creds.missing_fields(), vec!["consumer_secret", "access_token"]);
        assert!(reference_credentials().missing_fields().is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", reference_credentials());
        assert!(!debug.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(debug.contains("<redacted>"));
    }
}
