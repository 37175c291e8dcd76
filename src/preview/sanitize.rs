//! Allow-list filter for post bodies rendered as markup.

use ammonia::Builder;
use std::collections::{HashMap, HashSet};

/// Formatting tags a post body may keep. Anything else is unwrapped to its text.
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "i", "img", "li", "ol", "p", "pre", "s", "span", "strike", "strong", "u", "ul",
];

/// Tags whose content is dropped along with the tag.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "embed", "iframe", "noscript", "object", "script", "style", "template", "textarea", "title",
];

/// Only web and mail targets survive; relative URLs pass through.
const URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn set(items: &[&'static str]) -> HashSet<&'static str> {
    items.iter().copied().collect()
}

fn post_body_cleaner() -> Builder<'static> {
    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", set(&["href"]));
    tag_attributes.insert("img", set(&["src", "alt"]));

    let mut builder = Builder::default();
    builder
        .tags(set(ALLOWED_TAGS))
        .clean_content_tags(set(DROPPED_WITH_CONTENT))
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .url_schemes(set(URL_SCHEMES))
        .link_rel(Some("noopener noreferrer"));
    builder
}

/// Reduce stored post markup to a safe formatting subset before it is injected into
/// the page.
///
/// Unknown tags are unwrapped, script-like elements are removed with their content,
/// and links or images may only point at web, mail or relative URLs.
pub(crate) fn sanitize_markup(markup: &str) -> String {
    post_body_cleaner().clean(markup).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_survives() {
        let html = "<p>Hello <strong>world</strong><br/>next</p>";
        assert_eq!(sanitize_markup(html), "<p>Hello <strong>world</strong><br>next</p>");
    }

    #[test]
    fn test_scripts_removed_with_content() {
        let html = "<p>a</p><script>alert('x')</script><SCRIPT src=x></SCRIPT><p>b</p>";
        assert_eq!(sanitize_markup(html), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_event_handlers_and_styles_stripped() {
        let html = r#"<p onclick="steal()" style="color:red">hi</p><img src="https://x/p.png" onerror="boom()">"#;
        assert_eq!(
            sanitize_markup(html),
            r#"<p>hi</p><img src="https://x/p.png">"#
        );
    }

    #[test]
    fn test_script_urls_dropped() {
        let html = r#"<a href=" JavaScript:alert(1)">x</a><a href="/author?username=ann">y</a>"#;
        assert_eq!(
            sanitize_markup(html),
            r#"<a rel="noopener noreferrer">x</a><a href="/author?username=ann" rel="noopener noreferrer">y</a>"#
        );
    }

    #[test]
    fn test_data_urls_dropped_mail_links_kept() {
        assert_eq!(
            sanitize_markup(r#"<img src="data:text/html;base64,xx" alt="pic">"#),
            r#"<img alt="pic">"#
        );
        assert_eq!(
            sanitize_markup(r#"<a href="mailto:a@b.c">mail</a>"#),
            r#"<a href="mailto:a@b.c" rel="noopener noreferrer">mail</a>"#
        );
    }

    #[test]
    fn test_unknown_tags_unwrapped() {
        assert_eq!(
            sanitize_markup("<section><mark>kept</mark></section>"),
            "kept"
        );
    }

    #[test]
    fn test_quoted_gt_does_not_end_tag() {
        let out = sanitize_markup(r#"<a href="https://x/?q=a>b">link</a>"#);
        assert!(out.starts_with(r#"<a href="https://x/?q=a"#));
        assert!(out.ends_with(r#" rel="noopener noreferrer">link</a>"#));
    }

    #[test]
    fn test_comments_and_stray_brackets() {
        assert_eq!(sanitize_markup("a<!-- hidden -->b"), "ab");
        assert_eq!(sanitize_markup("1 < 2"), "1 &lt; 2");
        assert_eq!(sanitize_markup("ok<p class=\"x"), "ok");
    }
}
