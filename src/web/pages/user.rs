//! Public listing of one mirrored account.

use chrono::FixedOffset;
use maud::{html, Markup};

use crate::components::{BaseLayout, Pagination, StatusList};
use crate::db::Status;

#[must_use]
pub fn render_user_page(
    username: &str,
    host: &str,
    statuses: &[Status],
    page: usize,
    has_next: bool,
    offset: FixedOffset,
    signed_in_as: Option<&str>,
) -> Markup {
    let handle = format!("{username}@{host}");
    let base_url = format!(
        "/users/{}/{}",
        urlencoding::encode(host),
        urlencoding::encode(username)
    );
    // The total is not counted here; offering one page past the current is enough
    let total_pages = if has_next { page + 2 } else { page + 1 };

    let content = html! {
        h1 { (handle) }
        (StatusList::new(statuses, offset).with_empty_message("No posts mirrored for this account."))
        (Pagination::new(page, total_pages, &base_url))
    };

    BaseLayout::new(&handle, signed_in_as).render(content)
}
