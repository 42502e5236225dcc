//! Instance sign-in page.

use maud::{html, Markup};

use crate::components::{Alert, BaseLayout};

/// Render the login page, optionally with an error from a failed sign-in.
#[must_use]
pub fn render_login_page(error: Option<&str>) -> Markup {
    let content = html! {
        div class="auth-container" {
            h1 { "Login" }

            @if let Some(e) = error {
                (Alert::error(e))
            }

            form method="post" action="/sign_in" {
                label for="host" { "Instance" }
                input
                    type="text"
                    id="host"
                    name="host"
                    placeholder="mastodon.social"
                    autocomplete="off"
                    required;
                button type="submit" { "Sign in" }
            }
            p class="meta" {
                "You will be sent to your instance to authorize read access."
            }
        }
    };

    BaseLayout::new("Login", None).render(content)
}
