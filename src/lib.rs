//! Fediverse timeline mirror library.
//!
//! Signs a user in to their Mastodon-compatible instance, mirrors their own
//! posts into SQLite in both directions, and serves the mirrored history as
//! searchable HTML pages.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod auth;
pub mod components;
pub mod config;
pub mod constants;
pub mod db;
pub mod mastodon;
pub mod sync;
pub mod web;
