//! Description cleanup.
//!
//! Enzyme names in published listings carry inline HTML such as
//! `<i>N</i>-acetyl` or `Fe<sup>3+</sup>`, and HTML entities such as
//! `&alpha;` or `&#946;`.

use html_escape::decode_html_entities;

/// Legacy spellings of a dash that appear in older exports.
const DASH_VARIANTS: &[&str] = &["&amp;#151;", "&#151;", "\u{e2}\u{80}\u{94}"];

/// Removes tags and decodes entities in a description.
///
/// A `<` that does not open a tag (for example `a <-> b`) is kept.
pub fn strip_markup(text: &str) -> String {
    let mut normalized = text.to_string();
    for dash in DASH_VARIANTS {
        if normalized.contains(dash) {
            normalized = normalized.replace(dash, "-");
        }
    }

    decode_html_entities(&remove_tags(&normalized))
        .trim()
        .to_string()
}

fn remove_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let opens_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');

        match tail.find('>') {
            Some(end) if opens_tag => rest = &tail[end + 1..],
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_markup("<i>N</i>-acetylglucosamine kinase"),
            "N-acetylglucosamine kinase"
        );
        assert_eq!(strip_markup("Fe<sup>3+</sup> reductase"), "Fe3+ reductase");
        assert_eq!(strip_markup("plain text"), "plain text");
    }

    #[test]
    fn test_keeps_bare_angle_brackets() {
        assert_eq!(strip_markup("A <-> B"), "A <-> B");
        assert_eq!(strip_markup("x < y"), "x < y");
        assert_eq!(strip_markup("trailing <b"), "trailing <b");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(strip_markup("NAD(P)H &amp; FAD"), "NAD(P)H & FAD");
        assert_eq!(strip_markup("&lt;i&gt;"), "<i>");
        assert_eq!(strip_markup("&#945;-amylase"), "\u{3b1}-amylase");
        assert_eq!(strip_markup("&#x3B2;-galactosidase"), "\u{3b2}-galactosidase");
        assert_eq!(strip_markup("AT&T"), "AT&T");
    }

    #[test]
    fn test_decode_named_greek_entities() {
        assert_eq!(
            strip_markup("&alpha;-amylase &beta;-galactosidase"),
            "\u{3b1}-amylase \u{3b2}-galactosidase"
        );
        assert_eq!(
            strip_markup("&Delta;<sup>4</sup>-3-oxosteroid 5&beta;-reductase"),
            "\u{394}4-3-oxosteroid 5\u{3b2}-reductase"
        );
    }

    #[test]
    fn test_legacy_dash() {
        assert_eq!(strip_markup("acting on CH&#151;OH"), "acting on CH-OH");
        assert_eq!(strip_markup("acting on CH&amp;#151;OH"), "acting on CH-OH");
    }
}
