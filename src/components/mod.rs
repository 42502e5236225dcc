//! Maud HTML components for the web UI.
//!
//! - `layout`: Base page layout and navigation
//! - `alert`: Notices shown above page content
//! - `card`: Status cards and lists
//! - `pagination`: Page navigation controls

pub mod alert;
pub mod card;
pub mod layout;
pub mod pagination;

pub use alert::{Alert, AlertVariant};
pub use card::{EmptyState, StatusCard, StatusList, DISPLAY_TIME_FORMAT};
pub use layout::BaseLayout;
pub use pagination::Pagination;

/// Re-export maud for convenience
pub use maud::{html, Markup, PreEscaped, DOCTYPE};
