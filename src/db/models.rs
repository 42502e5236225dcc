use std::cmp::Ordering;
use std::fmt;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote-assigned status identifier.
///
/// Instances mint ids as unsigned decimal strings that grow with time, so
/// ordering is numeric: a shorter id is always older, and ids of equal
/// length compare lexicographically. `ORDER BY length(id), id` in SQL
/// yields the same ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(String);

impl StatusId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for StatusId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for StatusId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StatusId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StatusId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A mirrored status, normalised to UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub host: String,
    pub account_id: String,
    pub text: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub visibility: Option<String>,
}

/// Raw `status` row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusRow {
    pub id: String,
    pub host: String,
    pub account_id: String,
    pub text: String,
    pub url: String,
    pub created_at: String,
    pub visibility: Option<String>,
}

impl TryFrom<StatusRow> for Status {
    type Error = anyhow::Error;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .with_context(|| format!("Invalid created_at on status {}: {}", row.id, row.created_at))?
            .with_timezone(&Utc);

        Ok(Self {
            id: StatusId(row.id),
            host: row.host,
            account_id: row.account_id,
            text: row.text,
            url: row.url,
            created_at,
            visibility: row.visibility,
        })
    }
}

/// A mirrored account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub host: String,
    pub username: String,
    /// Set once the backward sync reached the account's first post.
    #[sqlx(rename = "all_fetched")]
    pub fully_backfilled: bool,
}

/// OAuth client credentials registered with an instance.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct App {
    pub host: String,
    pub client_id: String,
    pub client_secret: String,
}

/// A signed-in browser session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub access_token: String,
    pub host: String,
    pub account_id: String,
    pub username: String,
    pub created_at: String,
    pub expires_at: String,
}

/// Data for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub access_token: String,
    pub host: String,
    pub account_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_id_orders_numerically() {
        assert!(StatusId::from("9") < StatusId::from("10"));
        assert!(StatusId::from("109") < StatusId::from("110"));
        assert!(StatusId::from("111") > StatusId::from("99"));
        assert_eq!(StatusId::from("42").cmp(&StatusId::from("42")), Ordering::Equal);

        let mut ids: Vec<StatusId> = ["11", "2", "100", "1"].into_iter().map(StatusId::from).collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(StatusId::as_str).collect();
        assert_eq!(sorted, vec!["1", "2", "11", "100"]);
    }

    #[test]
    fn test_status_row_conversion_normalises_to_utc() {
        let row = StatusRow {
            id: "1".to_string(),
            host: "example.social".to_string(),
            account_id: "7".to_string(),
            text: "hello".to_string(),
            url: "https://example.social/@a/1".to_string(),
            created_at: "2024-01-01T09:00:00+09:00".to_string(),
            visibility: Some("public".to_string()),
        };

        let status = Status::try_from(row).unwrap();
        assert_eq!(status.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_status_row_conversion_rejects_bad_timestamp() {
        let row = StatusRow {
            id: "1".to_string(),
            host: "example.social".to_string(),
            account_id: "7".to_string(),
            text: String::new(),
            url: String::new(),
            created_at: "yesterday".to_string(),
            visibility: None,
        };

        assert!(Status::try_from(row).is_err());
    }
}
