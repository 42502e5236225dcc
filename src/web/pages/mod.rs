//! Maud-based page templates for the web UI.
//!
//! Each page module exports a render function that produces the complete HTML.

pub mod home;
pub mod login;
pub mod user;

pub use home::{render_home_page, HomePageParams};
pub use login::render_login_page;
pub use user::render_user_page;
