mod sanitize;

pub(crate) use sanitize::sanitize_markup;

/// Max characters of plain text shown in list views.
pub(crate) const PREVIEW_LEN: usize = 200;

const ELLIPSIS: &str = "...";

/// Plain-text excerpt of stored markup for list views.
///
/// Line-break tags become `\n`, every other tag-like run is dropped, and the result is
/// cut to [`PREVIEW_LEN`] characters with `...` appended only when something was cut.
/// Entities such as `&amp;` are left untouched.
pub(crate) fn preview_text(markup: &str) -> String {
    let clean = strip_tags(markup);
    if clean.chars().count() <= PREVIEW_LEN {
        return clean;
    }
    let mut out: String = clean.chars().take(PREVIEW_LEN).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Replace `<br>` variants with newlines, then delete remaining tags.
pub(crate) fn strip_tags(markup: &str) -> String {
    remove_tags(&replace_line_breaks(markup))
}

fn replace_line_breaks(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match line_break_len(tail) {
            Some(len) => {
                out.push('\n');
                rest = &tail[len..];
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// A tag is `<` plus at least one non-`>` character, through the next `>`. An
/// unterminated tag swallows the rest of the input.
fn remove_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail[1..].chars().next() {
            Some(c) if c != '>' => match tail.find('>') {
                Some(end) => rest = &tail[end + 1..],
                None => rest = "",
            },
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Byte length of a leading `<br>`, `<br/>`, `<BR />` (optional whitespace), if any.
fn line_break_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'<' || !bytes[1..3].eq_ignore_ascii_case(b"br") {
        return None;
    }

    let mut i = 3;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'/' {
        i += 1;
    }
    (i < bytes.len() && bytes[i] == b'>').then_some(i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_breaks_any_casing() {
        assert_eq!(preview_text("a<br>b<BR/>c<Br />d<bR  >e"), "a\nb\nc\nd\ne");
    }

    #[test]
    fn test_tags_removed() {
        assert_eq!(
            preview_text(r#"<p>Hello <strong class="x">world</strong></p>"#),
            "Hello world"
        );
    }

    #[test]
    fn test_br_with_attributes_is_just_a_tag() {
        assert_eq!(preview_text(r#"a<br class="x">b"#), "ab");
    }

    #[test]
    fn test_breaks_replaced_before_tags_stripped() {
        // The break inside the open tag becomes a newline, so the tag runs to the later `>`.
        assert_eq!(preview_text("a<b<br>c>d"), "ad");
        assert_eq!(preview_text("x<br<br>y"), "x");
        assert_eq!(strip_tags("<p>one<br/>two</p>"), "one\ntwo");
    }

    #[test]
    fn test_unterminated_tag_drops_tail() {
        assert_eq!(preview_text("keep <img src=x"), "keep ");
    }

    #[test]
    fn test_bare_angle_brackets_kept() {
        assert_eq!(preview_text("a <> b"), "a <> b");
        assert_eq!(preview_text("end<"), "end<");
    }

    #[test]
    fn test_entities_not_decoded() {
        assert_eq!(preview_text("<p>Fish &amp; chips</p>"), "Fish &amp; chips");
    }

    #[test]
    fn test_short_text_unchanged_without_ellipsis() {
        let s = "x".repeat(PREVIEW_LEN);
        assert_eq!(preview_text(&s), s);
        assert_eq!(preview_text(""), "");
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let s = "y".repeat(PREVIEW_LEN + 1);
        let out = preview_text(&s);
        assert_eq!(out, format!("{}...", "y".repeat(PREVIEW_LEN)));
    }

    #[test]
    fn test_bound_applies_after_stripping() {
        // Long markup whose text fits.
        let markup = format!("<div class=\"{}\">short</div>", "c".repeat(500));
        assert_eq!(preview_text(&markup), "short");
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let s = "é".repeat(PREVIEW_LEN + 5);
        let out = preview_text(&s);
        assert_eq!(out.chars().count(), PREVIEW_LEN + ELLIPSIS.len());
        assert!(out.starts_with(&"é".repeat(PREVIEW_LEN)));
    }
}
