use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::ApiError;
use super::text::html_to_text;
use super::types::{ApiAccount, ApiApplication, ApiStatus, TokenResponse};
use crate::config::{Config, InstanceScheme};
use crate::constants::{OAUTH_SCOPE, USER_AGENT};
use crate::db::{App, Status, StatusId};
use crate::sync::{FeedClient, PageCursor};

/// Longest body excerpt included in logs when a response fails to decode.
const BODY_EXCERPT_LEN: usize = 512;

/// HTTP client for Mastodon-compatible instances.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct MastodonClient {
    http: Client,
    scheme: InstanceScheme,
}

impl MastodonClient {
    /// Build a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_options(config.instance_scheme, config.http_timeout)
    }

    /// Build a client with an explicit scheme and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn with_options(scheme: InstanceScheme, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, scheme })
    }

    /// Base URL of an instance, e.g. `https://mastodon.social`.
    #[must_use]
    pub fn instance_url(&self, host: &str) -> String {
        format!("{}://{host}", self.scheme.as_str())
    }

    /// Fetch one page of an account's statuses, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Auth`] when the token is rejected, [`ApiError::Transient`]
    /// for network and server failures, and [`ApiError::Parse`] when the body or
    /// any timestamp in it cannot be decoded. A partially valid page is rejected whole.
    pub async fn account_statuses(
        &self,
        host: &str,
        token: &str,
        account_id: &str,
        cursor: &PageCursor,
    ) -> Result<Vec<Status>, ApiError> {
        let url = format!(
            "{}/api/v1/accounts/{}/statuses",
            self.instance_url(host),
            urlencoding::encode(account_id)
        );

        let mut request = self.http.get(&url).bearer_auth(token);
        request = match cursor {
            PageCursor::Latest => request,
            PageCursor::After(id) => request.query(&[("min_id", id.as_str())]),
            PageCursor::Before(id) => request.query(&[("max_id", id.as_str())]),
        };

        debug!(host, account_id, cursor = ?cursor, "Fetching statuses page");
        let page: Vec<ApiStatus> = self.send_json(request).await?;

        page.into_iter()
            .map(|status| convert_status(status, host, account_id))
            .collect()
    }

    /// Look up the account the token belongs to.
    ///
    /// # Errors
    ///
    /// See [`MastodonClient::account_statuses`].
    pub async fn verify_credentials(&self, host: &str, token: &str) -> Result<ApiAccount, ApiError> {
        let url = format!(
            "{}/api/v1/accounts/verify_credentials",
            self.instance_url(host)
        );
        self.send_json(self.http.get(&url).bearer_auth(token)).await
    }

    /// Register this service as an OAuth application on an instance.
    ///
    /// # Errors
    ///
    /// See [`MastodonClient::account_statuses`].
    pub async fn register_app(
        &self,
        host: &str,
        client_name: &str,
        redirect_uri: &str,
    ) -> Result<App, ApiError> {
        let url = format!("{}/api/v1/apps", self.instance_url(host));
        let request = self.http.post(&url).form(&[
            ("client_name", client_name),
            ("redirect_uris", redirect_uri),
            ("scopes", OAUTH_SCOPE),
        ]);

        let registered: ApiApplication = self.send_json(request).await?;
        Ok(App {
            host: host.to_string(),
            client_id: registered.client_id,
            client_secret: registered.client_secret,
        })
    }

    /// Build the URL the browser is sent to for authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` does not form a valid URL.
    pub fn authorize_url(
        &self,
        app: &App,
        redirect_uri: &str,
        state: &str,
    ) -> Result<url::Url, url::ParseError> {
        let mut url = url::Url::parse(&format!("{}/oauth/authorize", self.instance_url(&app.host)))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &app.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", OAUTH_SCOPE)
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// See [`MastodonClient::account_statuses`].
    pub async fn exchange_code(
        &self,
        app: &App,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, ApiError> {
        let url = format!("{}/oauth/token", self.instance_url(&app.host));
        let request = self.http.post(&url).form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", OAUTH_SCOPE),
        ]);
        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_request(&e))?;

        let status = response.status();
        let url = response.url().clone();

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ApiError::Auth(format!("{status} from {url}")));
        }
        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(url = %url, "Instance rate limited the request");
            }
            return Err(ApiError::Transient(format!("{status} from {url}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_request(&e))?;

        serde_json::from_slice(&body).map_err(|e| {
            let excerpt: String = String::from_utf8_lossy(&body)
                .chars()
                .take(BODY_EXCERPT_LEN)
                .collect();
            warn!(url = %url, body = %excerpt, "Failed to decode instance response");
            ApiError::Parse(format!("{url}: {e}"))
        })
    }
}

#[async_trait]
impl FeedClient for MastodonClient {
    async fn fetch_page(
        &self,
        host: &str,
        credential: &str,
        account_id: &str,
        cursor: &PageCursor,
    ) -> Result<Vec<Status>, ApiError> {
        self.account_statuses(host, credential, account_id, cursor)
            .await
    }
}

/// Translate a wire status into the stored shape, normalising time to UTC.
fn convert_status(status: ApiStatus, host: &str, account_id: &str) -> Result<Status, ApiError> {
    let created_at = DateTime::parse_from_rfc3339(&status.created_at)
        .map_err(|e| {
            ApiError::Parse(format!(
                "status {} has invalid created_at '{}': {e}",
                status.id, status.created_at
            ))
        })?
        .with_timezone(&Utc);

    let text = match status.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => html_to_text(&status.content),
    };

    Ok(Status {
        id: StatusId::from(status.id),
        host: host.to_string(),
        account_id: account_id.to_string(),
        text,
        url: status.url.or(status.uri).unwrap_or_default(),
        created_at,
        visibility: status.visibility,
    })
}
