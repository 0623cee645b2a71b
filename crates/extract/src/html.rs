//! Descriptions arrive as HTML fragments (`<p>`, `<b>`, `<br>`) from most
//! sources. They're stored as Markdown.

#[cfg(feature = "markdown")]
use html2md::rewrite_html as html_to_markdown;

#[cfg(not(feature = "markdown"))]
use crate::consts::HTML_TAG_REGEX;

/// Convert a description to Markdown, or `None` if nothing is left.
pub fn description_to_markdown(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let text = match raw.contains('<') {
        true => convert(raw),
        false => raw.to_string(),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(feature = "markdown")]
fn convert(html: &str) -> String {
    html_to_markdown(html, true)
}

#[cfg(not(feature = "markdown"))]
fn convert(html: &str) -> String {
    HTML_TAG_REGEX.replace_all(html, "").into_owned()
}
