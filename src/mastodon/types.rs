//! Wire shapes of the Mastodon-compatible REST API.

use serde::Deserialize;

/// A status as returned by `GET /api/v1/accounts/:id/statuses`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub id: String,
    pub created_at: String,
    /// HTML body.
    #[serde(default)]
    pub content: String,
    /// Plain-text source; most instances only fill it for deleted or edited statuses.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// The authenticated account, from `GET /api/v1/accounts/verify_credentials`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiAccount {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Response of `POST /api/v1/apps`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiApplication {
    pub client_id: String,
    pub client_secret: String,
}

/// Response of `POST /oauth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}
