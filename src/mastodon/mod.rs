//! Client for Mastodon-compatible instances: the statuses feed and the OAuth dance.

mod client;
mod error;
mod text;
mod types;

pub use client::MastodonClient;
pub use error::ApiError;
pub use text::html_to_text;
pub use types::{ApiAccount, ApiApplication, ApiStatus, TokenResponse};
