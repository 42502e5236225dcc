//! Pagination component for navigating through multi-page listings.

use maud::{html, Markup, Render};
use urlencoding::encode;

/// Previous / page numbers / next controls.
///
/// Pages are 0-indexed internally and displayed 1-indexed. Renders nothing
/// when there is only one page.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    /// Base URL for page links (query params will be appended)
    pub base_url: String,
    /// Search query to preserve in links
    pub query: Option<String>,
}

impl Pagination {
    #[must_use]
    pub fn new(current_page: usize, total_pages: usize, base_url: &str) -> Self {
        Self {
            current_page,
            total_pages,
            base_url: base_url.to_string(),
            query: None,
        }
    }

    /// Total pages needed for `total_items` at `per_page` each.
    #[must_use]
    pub fn pages_for(total_items: i64, per_page: i64) -> usize {
        if total_items <= 0 || per_page <= 0 {
            return 0;
        }
        usize::try_from((total_items + per_page - 1) / per_page).unwrap_or(usize::MAX)
    }

    /// Preserve a search query in pagination links. Empty queries are dropped.
    #[must_use]
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.filter(|q| !q.is_empty()).map(String::from);
        self
    }

    fn build_url(&self, page_num: usize) -> String {
        let mut params = Vec::new();

        if let Some(ref q) = self.query {
            params.push(format!("q={}", encode(q)));
        }

        if page_num > 0 {
            params.push(format!("page={page_num}"));
        }

        if params.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}?{}", self.base_url, params.join("&"))
        }
    }

    #[must_use]
    pub fn should_display(&self) -> bool {
        self.total_pages > 1
    }
}

impl Render for Pagination {
    fn render(&self) -> Markup {
        if !self.should_display() {
            return html! {};
        }

        let current = self.current_page;
        let total = self.total_pages;

        let start = current.saturating_sub(2);
        let end = (current + 3).min(total);

        html! {
            nav class="pagination" {
                @if current > 0 {
                    a href=(self.build_url(current - 1)) { "\u{00ab} Previous" }
                } @else {
                    span class="disabled" { "\u{00ab} Previous" }
                }

                @if start > 0 {
                    a href=(self.build_url(0)) { "1" }
                    @if start > 1 {
                        span { "..." }
                    }
                }

                @for page_num in start..end {
                    @if page_num == current {
                        span class="current" { (page_num + 1) }
                    } @else {
                        a href=(self.build_url(page_num)) { (page_num + 1) }
                    }
                }

                @if end < total {
                    @if end < total - 1 {
                        span { "..." }
                    }
                    a href=(self.build_url(total - 1)) { (total) }
                }

                @if current + 1 < total {
                    a href=(self.build_url(current + 1)) { "Next \u{00bb}" }
                } @else {
                    span class="disabled" { "Next \u{00bb}" }
                }
            }
        }
    }
}
