//! Hashtag extraction and rendering.

use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("hashtag regex is valid"));

/// Returns the lower-cased tags in `text`, de-duplicated, in order of first appearance.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for cap in HASHTAG_REGEX.captures_iter(text) {
        let tag = cap[1].to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Escapes `text` for HTML and turns every hashtag into a link to its tag page.
pub fn linkify_hashtags(text: &str) -> String {
    // Text-only escaping emits named entities (`&lt;`, `&amp;`), never `&#..;`,
    // so no '#' is introduced for the regex to pick up.
    let escaped = html_escape::encode_text(text);
    HASHTAG_REGEX
        .replace_all(&escaped, |cap: &regex::Captures<'_>| {
            format!(
                "<a class=\"hashtag\" href=\"/hashtag/{}\">#{}</a>",
                cap[1].to_lowercase(),
                &cap[1]
            )
        })
        .into_owned()
}
