use scraper::{Html, Node};

/// Flatten status HTML into searchable plain text.
///
/// Paragraphs are separated by a blank line and `<br>` becomes a newline.
/// Entities are decoded by the parser.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => match element.name() {
                "br" => out.push('\n'),
                "p" if !out.is_empty() => {
                    let trimmed = out.trim_end_matches([' ', '\n']).len();
                    out.truncate(trimmed);
                    out.push_str("\n\n");
                }
                _ => {}
            },
            _ => {}
        }
    }

    out.trim().to_string()
}
