use serde::Deserialize;
use std::collections::BTreeSet;

/// Scope granted to third-party providers for the payments endpoint.
pub const DEFAULT_PAYMENTS_SCOPE: &str = "payments-api/payments.tpp";

/// Claims attached to a request by the upstream gateway.
///
/// Gateways disagree on spelling, so `clientId`/`scp` are accepted as well.
/// Anything missing stays `None`/empty and is denied by [`authorize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationClaims {
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(default, alias = "scp", deserialize_with = "scope_set")]
    pub scope: BTreeSet<String>,
}

impl AuthorizationClaims {
    /// Builds claims from a client id and a whitespace-separated scope string.
    pub fn new(client_id: Option<&str>, scope: Option<&str>) -> Self {
        Self {
            client_id: client_id.map(str::to_string),
            scope: split_scopes(scope.unwrap_or_default()),
        }
    }
}

fn split_scopes(raw: &str) -> BTreeSet<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

fn scope_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(split_scopes(raw.as_deref().unwrap_or_default()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Allows iff the client id matches exactly and `required_scope` is one of
/// the granted scopes. Empty requirements never match.
pub fn authorize(
    claims: &AuthorizationClaims,
    required_client_id: &str,
    required_scope: &str,
) -> Decision {
    if required_client_id.is_empty() || required_scope.is_empty() {
        return Decision::Deny;
    }
    let client_matches = claims.client_id.as_deref() == Some(required_client_id);
    if client_matches && claims.scope.contains(required_scope) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// The fixed client/scope requirement of one endpoint.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub client_id: String,
    pub scope: String,
}

impl AccessPolicy {
    pub fn new(client_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            scope: scope.into(),
        }
    }

    pub fn check(&self, claims: &AuthorizationClaims) -> Decision {
        authorize(claims, &self.client_id, &self.scope)
    }
}
