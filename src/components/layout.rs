//! Base layout components for the web UI.
//!
//! This module provides the main page layout structure including
//! the HTML skeleton, navigation, and footer.

use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Critical theme initialization script that runs in <head> to prevent flash of wrong theme.
/// Must be inline (not external) to execute before body renders.
const THEME_INIT_SCRIPT: &str = r"(function() {
    if (window.matchMedia('(prefers-color-scheme: dark)').matches) {
        document.documentElement.setAttribute('data-theme', 'dark');
    }
})();";

/// Minimal inline styles so pages are readable without a static asset pipeline.
const BASE_STYLE: &str = r"
body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 0 auto; padding: 0 1rem; }
nav ul { display: flex; gap: 1rem; list-style: none; padding: 0; }
nav { display: flex; justify-content: space-between; align-items: center; }
article.status { border-bottom: 1px solid #8884; padding: 0.75rem 0; white-space: pre-wrap; }
article.success { color: #2a7; } article.error { color: #c33; } article.info { color: #37a; }
.pagination { display: flex; gap: 0.5rem; margin: 1rem 0; }
.pagination .current { font-weight: bold; }
.pagination .disabled { opacity: 0.5; }
.meta { font-size: 0.85em; opacity: 0.8; }
.sync-actions { display: flex; gap: 0.5rem; }
";

/// Base page layout builder.
///
/// Navigation reflects whether someone is signed in; pass the signed-in
/// `user@host` handle, or `None` for anonymous pages.
///
/// # Example
///
/// ```ignore
/// use maud::html;
/// use crate::components::layout::BaseLayout;
///
/// let content = html! { h1 { "Hello World" } };
/// let page = BaseLayout::new("My Page", Some("alice@example.social"))
///     .render(content);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLayout<'a> {
    title: &'a str,
    signed_in_as: Option<&'a str>,
}

impl<'a> BaseLayout<'a> {
    #[must_use]
    pub fn new(title: &'a str, signed_in_as: Option<&'a str>) -> Self {
        Self {
            title,
            signed_in_as,
        }
    }

    /// Render the complete HTML page with the given content.
    ///
    /// The content will be placed inside the `<main class="container">` element.
    #[must_use]
    pub fn render(self, content: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" data-theme="light" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    meta name="color-scheme" content="light dark";
                    meta name="robots" content="noindex";
                    title { (self.title) " - Timeline Mirror" }
                    style { (PreEscaped(BASE_STYLE)) }
                    script { (PreEscaped(THEME_INIT_SCRIPT)) }
                }
                body {
                    (self.render_header())
                    main class="container" {
                        (content)
                    }
                    (Self::render_footer())
                }
            }
        }
    }

    fn render_header(&self) -> Markup {
        html! {
            header class="container" {
                nav {
                    ul {
                        li {
                            a href="/" {
                                strong class="site-logo" { "Timeline Mirror" }
                            }
                        }
                    }
                    ul {
                        (self.render_auth_nav())
                    }
                }
            }
        }
    }

    fn render_auth_nav(&self) -> Markup {
        match self.signed_in_as {
            Some(handle) => html! {
                li { span class="handle" { (handle) } }
                li { a href="/logout" { "Logout" } }
            },
            None => html! {
                li { a href="/login" { "Login" } }
            },
        }
    }

    fn render_footer() -> Markup {
        html! {
            footer class="container" {
                small {
                    "Timeline Mirror " (env!("CARGO_PKG_VERSION"))
                }
            }
        }
    }
}
