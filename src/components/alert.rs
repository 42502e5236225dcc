//! Alert components for notices shown above page content.

use maud::{html, Markup, Render};

/// Alert variant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Success,
    Error,
    Info,
}

impl AlertVariant {
    /// CSS class for the alert article element.
    #[must_use]
    pub const fn article_class(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// An alert message component.
///
/// ```ignore
/// use crate::components::alert::Alert;
///
/// let alert = Alert::info("All posts have been fetched.");
/// ```
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub variant: AlertVariant,
    pub title: Option<&'a str>,
    pub message: &'a str,
}

impl<'a> Alert<'a> {
    #[must_use]
    pub const fn new(variant: AlertVariant, message: &'a str) -> Self {
        Self {
            variant,
            title: None,
            message,
        }
    }

    #[must_use]
    pub const fn success(message: &'a str) -> Self {
        Self::new(AlertVariant::Success, message)
    }

    #[must_use]
    pub const fn error(message: &'a str) -> Self {
        Self::new(AlertVariant::Error, message)
    }

    #[must_use]
    pub const fn info(message: &'a str) -> Self {
        Self::new(AlertVariant::Info, message)
    }

    #[must_use]
    pub const fn with_title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }
}

impl Render for Alert<'_> {
    fn render(&self) -> Markup {
        html! {
            article class=(self.variant.article_class()) role="alert" {
                @if let Some(title) = self.title {
                    strong { (title) }
                    " "
                }
                (self.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_variants() {
        assert_eq!(
            Alert::success("ok").render().into_string(),
            r#"<article class="success" role="alert">ok</article>"#
        );
        assert!(Alert::error("bad")
            .render()
            .into_string()
            .contains(r#"class="error""#));
    }

    #[test]
    fn test_alert_with_title() {
        let html = Alert::info("Everything is fetched.")
            .with_title("Done.")
            .render()
            .into_string();
        assert!(html.contains("<strong>Done.</strong> Everything is fetched."));
    }

    #[test]
    fn test_alert_escapes_message() {
        let html = Alert::error("<b>boom</b>").render().into_string();
        assert!(html.contains("&lt;b&gt;boom&lt;/b&gt;"));
    }
}
