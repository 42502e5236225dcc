//! Card components for displaying mirrored statuses.

use chrono::FixedOffset;
use maud::{html, Markup, Render};

use crate::db::Status;

/// Format used for status timestamps on every page.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A single status, with its timestamp shown in the configured offset.
#[derive(Debug, Clone)]
pub struct StatusCard<'a> {
    pub status: &'a Status,
    pub offset: FixedOffset,
}

impl<'a> StatusCard<'a> {
    #[must_use]
    pub const fn new(status: &'a Status, offset: FixedOffset) -> Self {
        Self { status, offset }
    }
}

impl Render for StatusCard<'_> {
    fn render(&self) -> Markup {
        let status = self.status;
        let local = status.created_at.with_timezone(&self.offset);
        let timestamp = html! {
            time datetime=(status.created_at.to_rfc3339()) {
                (local.format(DISPLAY_TIME_FORMAT).to_string())
            }
        };

        html! {
            article class="status" id=(format!("status-{}", status.id)) {
                p { (status.text) }
                p class="meta" {
                    @if let Some(href) = web_link(&status.url) {
                        a href=(href) rel="noopener noreferrer" { (timestamp) }
                    } @else {
                        (timestamp)
                    }
                    @if let Some(visibility) = &status.visibility {
                        " · " span class="visibility" { (visibility) }
                    }
                }
            }
        }
    }
}

/// The URL as given if it is an absolute `http` or `https` link.
///
/// Status URLs come from remote instances, so anything else (`javascript:`,
/// `data:`, relative paths) is not linked.
fn web_link(raw: &str) -> Option<&str> {
    let parsed = url::Url::parse(raw).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(raw)
}

/// A list of status cards, or an empty state when there are none.
#[derive(Debug, Clone)]
pub struct StatusList<'a> {
    pub statuses: &'a [Status],
    pub offset: FixedOffset,
    pub empty_message: &'a str,
}

impl<'a> StatusList<'a> {
    #[must_use]
    pub const fn new(statuses: &'a [Status], offset: FixedOffset) -> Self {
        Self {
            statuses,
            offset,
            empty_message: "No posts yet.",
        }
    }

    #[must_use]
    pub const fn with_empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }
}

impl Render for StatusList<'_> {
    fn render(&self) -> Markup {
        if self.statuses.is_empty() {
            return EmptyState::new(self.empty_message).render();
        }

        html! {
            section class="status-list" {
                @for status in self.statuses {
                    (StatusCard::new(status, self.offset))
                }
            }
        }
    }
}

/// Placeholder shown when a listing has nothing to show.
#[derive(Debug, Clone)]
pub struct EmptyState<'a> {
    pub message: &'a str,
}

impl<'a> EmptyState<'a> {
    #[must_use]
    pub const fn new(message: &'a str) -> Self {
        Self { message }
    }
}

impl Render for EmptyState<'_> {
    fn render(&self) -> Markup {
        html! {
            p class="empty-state" { (self.message) }
        }
    }
}
