/// Identity provider boundary
///
/// Logins present an opaque token minted by a third-party identity provider.
/// The [`IdentityVerifier`] trait is the seam: the production implementation
/// calls the provider's account-lookup endpoint over HTTPS, and tests swap in
/// [`StaticVerifier`] with a fixed token set.
///
/// Verification fails closed. A provider outage, a rejected token, and an
/// unusable response all leave the caller unauthenticated; the distinction
/// only survives into the logs.
///
/// # Example
///
/// ```
/// use taskhive_shared::auth::identity::{IdentityVerifier, StaticVerifier, VerifiedIdentity};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = StaticVerifier::new().with_token("valid-token", VerifiedIdentity {
///     external_uid: "uid-1".to_string(),
///     email: "ada@example.com".to_string(),
///     display_name: Some("Ada".to_string()),
///     avatar_url: None,
/// });
///
/// let identity = verifier.verify("valid-token").await?;
/// assert_eq!(identity.email, "ada@example.com");
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Request timeout for provider calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity asserted by the provider for a verified token
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// The provider's stable user ID
    pub external_uid: String,

    /// Email the provider verified
    pub email: String,

    /// Display name, when the provider has one
    pub display_name: Option<String>,

    /// Avatar URL, when the provider has one
    pub avatar_url: Option<String>,
}

/// Error type for identity verification
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The token was rejected, or the provider's answer was unusable
    ///
    /// Deliberately carries no detail; the reason is logged, not returned.
    #[error("Identity token could not be verified")]
    Rejected,

    /// The provider could not be reached
    #[error("Identity provider unreachable: {0}")]
    Unavailable(String),
}

/// Verifies third-party identity tokens
///
/// Implementations must be shareable across request handlers.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Exchanges an identity token for the identity it asserts
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Rejected`] for tokens the provider does not
    /// vouch for and [`IdentityError::Unavailable`] when the provider cannot
    /// be reached.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Account record in the provider's lookup response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderAccount {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<ProviderAccount>,
}

fn identity_from_account(account: ProviderAccount) -> Result<VerifiedIdentity, IdentityError> {
    // An identity without an email cannot be mapped to a user account
    let email = match account.email {
        Some(email) if !email.is_empty() => email,
        _ => {
            tracing::debug!(external_uid = %account.local_id, "Provider account has no email");
            return Err(IdentityError::Rejected);
        }
    };

    Ok(VerifiedIdentity {
        external_uid: account.local_id,
        email,
        display_name: account.display_name,
        avatar_url: account.photo_url,
    })
}

/// Production verifier calling the provider's account-lookup REST endpoint
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    verify_url: String,
    api_key: Option<String>,
}

impl HttpIdentityVerifier {
    /// Creates a verifier for the given lookup endpoint
    ///
    /// The API key, when present, is sent as the `key` query parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        verify_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            verify_url: verify_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let mut request = self
            .client
            .post(&self.verify_url)
            .json(&serde_json::json!({ "idToken": token }));

        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Provider rejected identity token");
            return Err(IdentityError::Rejected);
        }

        let body: LookupResponse = response.json().await.map_err(|e| {
            tracing::debug!(reason = %e, "Provider lookup response was unparsable");
            IdentityError::Rejected
        })?;

        let account = body.users.into_iter().next().ok_or_else(|| {
            tracing::debug!("Provider lookup response contained no account");
            IdentityError::Rejected
        })?;

        identity_from_account(account)
    }
}

/// Verifier accepting a fixed token set; for tests and local development
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    identities: HashMap<String, VerifiedIdentity>,
}

impl StaticVerifier {
    /// Creates a verifier that rejects everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token the verifier will accept
    pub fn with_token(mut self, token: impl Into<String>, identity: VerifiedIdentity) -> Self {
        self.identities.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or(IdentityError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_identity() -> VerifiedIdentity {
        VerifiedIdentity {
            external_uid: "uid-1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: Some("Ada".to_string()),
            avatar_url: Some("https://cdn.example.com/ada.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_static_verifier_accepts_known_token() {
        let verifier = StaticVerifier::new().with_token("good", sample_identity());

        let identity = verifier.verify("good").await.expect("Should verify");
        assert_eq!(identity.external_uid, "uid-1");
        assert_eq!(identity.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_static_verifier_rejects_unknown_token() {
        let verifier = StaticVerifier::new().with_token("good", sample_identity());

        let result = verifier.verify("bad").await;
        assert!(matches!(result, Err(IdentityError::Rejected)));
    }

    #[test]
    fn test_lookup_response_parsing() {
        let body = r#"{
            "kind": "identitytoolkit#GetAccountInfoResponse",
            "users": [{
                "localId": "uid-42",
                "email": "grace@example.com",
                "displayName": "Grace",
                "photoUrl": "https://cdn.example.com/grace.png"
            }]
        }"#;

        let parsed: LookupResponse = serde_json::from_str(body).unwrap();
        let identity = identity_from_account(parsed.users.into_iter().next().unwrap()).unwrap();

        assert_eq!(identity.external_uid, "uid-42");
        assert_eq!(identity.email, "grace@example.com");
        assert_eq!(identity.display_name.as_deref(), Some("Grace"));
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://cdn.example.com/grace.png")
        );
    }

    #[test]
    fn test_account_without_email_is_rejected() {
        let account = ProviderAccount {
            local_id: "uid-7".to_string(),
            email: None,
            display_name: None,
            photo_url: None,
        };
        assert!(matches!(
            identity_from_account(account),
            Err(IdentityError::Rejected)
        ));

        let account = ProviderAccount {
            local_id: "uid-7".to_string(),
            email: Some(String::new()),
            display_name: None,
            photo_url: None,
        };
        assert!(matches!(
            identity_from_account(account),
            Err(IdentityError::Rejected)
        ));
    }

    #[test]
    fn test_rejected_error_is_opaque() {
        assert_eq!(
            IdentityError::Rejected.to_string(),
            "Identity token could not be verified"
        );
    }
}
