//! Signed-in home page: the account's mirrored posts with search and sync controls.

use chrono::FixedOffset;
use maud::{html, Markup};

use crate::components::{Alert, BaseLayout, Pagination, StatusList};
use crate::db::Status;

/// Everything the home page shows.
#[derive(Debug)]
pub struct HomePageParams<'a> {
    /// `username@host` of the signed-in account.
    pub handle: &'a str,
    pub statuses: &'a [Status],
    pub query: &'a str,
    /// 0-indexed.
    pub page: usize,
    pub total_pages: usize,
    pub total_statuses: i64,
    pub fully_backfilled: bool,
    /// Set after a backward sync found nothing left to fetch.
    pub show_all_fetched_notice: bool,
    pub offset: FixedOffset,
}

#[must_use]
pub fn render_home_page(params: &HomePageParams<'_>) -> Markup {
    let empty_message = if params.query.is_empty() {
        "No posts mirrored yet. Fetch newer posts to start."
    } else {
        "No posts match this search."
    };

    let content = html! {
        h1 { (params.handle) }

        @if params.show_all_fetched_notice {
            (Alert::info("Every older post has already been fetched.").with_title("Done."))
        }

        div class="sync-actions" {
            form method="post" action="/statuses/sync/newer" {
                button type="submit" { "Fetch newer posts" }
            }
            @if !params.fully_backfilled {
                form method="post" action="/statuses/sync/older" {
                    button type="submit" { "Fetch older posts" }
                }
            }
        }

        form method="get" action="/" class="search" {
            input type="search" name="q" value=(params.query) placeholder="Search posts";
            button type="submit" { "Search" }
        }

        p class="meta" {
            (params.total_statuses) " posts"
            @if params.fully_backfilled {
                " · full history mirrored"
            }
        }

        (StatusList::new(params.statuses, params.offset).with_empty_message(empty_message))
        (Pagination::new(params.page, params.total_pages, "/").with_query(Some(params.query)))
    };

    BaseLayout::new("Home", Some(params.handle)).render(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>(statuses: &'a [Status]) -> HomePageParams<'a> {
        HomePageParams {
            handle: "alice@example.social",
            statuses,
            query: "",
            page: 0,
            total_pages: 1,
            total_statuses: 0,
            fully_backfilled: false,
            show_all_fetched_notice: false,
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    #[test]
    fn test_home_shows_both_sync_buttons_until_backfilled() {
        let html = render_home_page(&params(&[])).into_string();
        assert!(html.contains(r#"action="/statuses/sync/newer""#));
        assert!(html.contains(r#"action="/statuses/sync/older""#));
        assert!(html.contains("No posts mirrored yet"));
    }

    #[test]
    fn test_home_hides_older_button_when_backfilled() {
        let mut p = params(&[]);
        p.fully_backfilled = true;
        let html = render_home_page(&p).into_string();
        assert!(!html.contains(r#"action="/statuses/sync/older""#));
        assert!(html.contains("full history mirrored"));
    }

    #[test]
    fn test_home_all_fetched_notice_and_query() {
        let mut p = params(&[]);
        p.show_all_fetched_notice = true;
        p.query = "rust";
        let html = render_home_page(&p).into_string();
        assert!(html.contains("Every older post has already been fetched."));
        assert!(html.contains(r#"value="rust""#));
        assert!(html.contains("No posts match this search."));
    }
}
