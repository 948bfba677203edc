//! Newsletter content helpers
//!
//! Markup handling needed around external calls: reducing HTML to text for
//! the AI reviewer and embedding the stylesheet before handing HTML to the
//! email provider. Neither changes what the backend stores.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .expect("static regex")
});
static BLOCK_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(p|div|h[1-6]|li|ul|ol|tr|table|section|article|header|footer|blockquote)\b[^>]*>")
        .expect("static regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f\v]+").expect("static regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("static regex")
});
static STYLESHEET_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]*href=["'][^"']*newsletter\.css["'][^>]*>"#).expect("static regex")
});

/// Reduce newsletter HTML to readable text
///
/// Scripts, styles and comments are dropped, block elements become paragraph
/// breaks, common entities are decoded and blank lines collapse.
pub fn html_to_text(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, "");
    let with_breaks = BLOCK_BOUNDARY.replace_all(&without_code, "\n");
    let without_tags = TAG.replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);

    decoded
        .lines()
        .map(|line| INLINE_SPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn decode_entities(text: &str) -> String {
    // Single pass, so "&amp;lt;" decodes to "&lt;" and not "<"
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name.strip_prefix('#') {
                Some(number) => {
                    let code = match number.strip_prefix(|c: char| c == 'x' || c == 'X') {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
                None => named_entity(name),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "middot" => '\u{00B7}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "deg" => '\u{00B0}',
        "times" => '\u{00D7}',
        "euro" => '\u{20AC}',
        "pound" => '\u{00A3}',
        "cent" => '\u{00A2}',
        _ => return None,
    };
    Some(c)
}

/// Prepare newsletter HTML for an email client
///
/// Removes the external `newsletter.css` link and embeds `css` as a style
/// block in the head. With no stylesheet the link is still removed.
pub fn prepare_email_html(html: &str, css: Option<&str>) -> String {
    let without_link = STYLESHEET_LINK.replace_all(html, "").into_owned();

    let css = match css.map(str::trim) {
        Some(css) if !css.is_empty() => css,
        _ => return without_link,
    };

    let style = format!("<style type=\"text/css\">{}</style>", css);
    if let Some(pos) = find_ascii_case_insensitive(&without_link, "</head>") {
        let mut out = String::with_capacity(without_link.len() + style.len());
        out.push_str(&without_link[..pos]);
        out.push_str(&style);
        out.push_str(&without_link[pos..]);
        out
    } else {
        format!("{}{}", style, without_link)
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Read the email stylesheet, logging and returning `None` if it is unavailable
pub async fn load_stylesheet(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(css) => Some(css),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Newsletter stylesheet not available, sending without it");
            None
        }
    }
}

/// Build the editorial review prompt around the newsletter text
pub fn review_prompt(text_content: &str) -> String {
    format!(
        "Please review this newsletter content for quality and provide constructive feedback. \
Focus ONLY on the content, writing quality, and reader value - ignore any formatting or HTML.

Newsletter Content:
{}

Provide feedback on:
- Content accuracy and relevance
- Writing clarity and engagement
- Value to newsletter readers
- Suggestions for improvement

Keep your review concise and actionable.",
        text_content
    )
}
