//! HTML snapshot parsing and paste sanitizing.
//!
//! Snapshots are the editor's own serialized markup, so a small XML parser is
//! enough once HTML's void elements and named entities are rewritten into
//! their XML-compatible forms.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

use crate::dom::{Dom, NodeId};
use crate::error::SnapshotError;

/// Wrapper element that turns a fragment into a single-rooted document.
const FRAGMENT_ROOT: &str = "letterpress-fragment";

static VOID_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(br|hr|img|input|meta|link|wbr)(\s[^<>]*?)?\s*/?>").unwrap()
});

static NAMED_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z][a-zA-Z0-9]*);").unwrap());

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").unwrap());

/// C0 controls other than tab, line feed and carriage return. XML has no
/// way to carry them.
static CONTROL_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());

/// Named entities the browser emits in `innerHTML`, mapped to code points.
const ENTITIES: &[(&str, u32)] = &[
    ("nbsp", 0xa0),
    ("copy", 0xa9),
    ("reg", 0xae),
    ("trade", 0x2122),
    ("ndash", 0x2013),
    ("mdash", 0x2014),
    ("lsquo", 0x2018),
    ("rsquo", 0x2019),
    ("ldquo", 0x201c),
    ("rdquo", 0x201d),
    ("hellip", 0x2026),
    ("euro", 0x20ac),
    ("middot", 0xb7),
    ("laquo", 0xab),
    ("raquo", 0xbb),
];

/// Drop the control characters a snapshot could not carry.
pub fn strip_control_chars(text: &str) -> Cow<'_, str> {
    CONTROL_CHAR.replace_all(text, "")
}

/// Rewrite HTML void elements and named entities into well-formed XML.
fn to_xml(src: &str) -> String {
    let src = strip_control_chars(src);
    let voids = VOID_ELEMENT.replace_all(&src, |caps: &Captures| {
        let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        format!("<{}{}/>", caps[1].to_ascii_lowercase(), attrs)
    });
    NAMED_ENTITY
        .replace_all(&voids, |caps: &Captures| {
            let name = &caps[1];
            match name {
                "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
                _ => match ENTITIES.iter().find(|(n, _)| *n == name) {
                    Some((_, code)) => format!("&#{code};"),
                    // Unknown names survive as literal text.
                    None => format!("&amp;{name};"),
                },
            }
        })
        .into_owned()
}

/// Parse an HTML fragment into detached nodes of `dom`, in source order.
///
/// Comments and processing instructions are dropped; tag and attribute
/// names are lowercased.
pub fn parse_fragment(dom: &mut Dom, src: &str) -> Result<Vec<NodeId>, SnapshotError> {
    let wrapped = format!("<{FRAGMENT_ROOT}>{}</{FRAGMENT_ROOT}>", to_xml(src));
    let doc = match roxmltree::Document::parse(&wrapped) {
        Ok(doc) => doc,
        Err(err) => {
            let pos = err.pos();
            return Err(SnapshotError::parse(
                err.to_string(),
                wrapped.clone(),
                pos.row as usize,
                pos.col as usize,
            ));
        }
    };
    let nodes = doc
        .root_element()
        .children()
        .filter_map(|child| import_node(dom, child))
        .collect();
    Ok(nodes)
}

fn import_node(dom: &mut Dom, node: roxmltree::Node<'_, '_>) -> Option<NodeId> {
    if node.is_text() {
        return node.text().map(|text| dom.create_text(text));
    }
    if !node.is_element() {
        return None;
    }
    let el = dom.create_element(node.tag_name().name());
    for attr in node.attributes() {
        dom.set_attr(el, &attr.name().to_ascii_lowercase(), attr.value());
    }
    for child in node.children() {
        if let Some(id) = import_node(dom, child) {
            dom.append_child(el, id);
        }
    }
    Some(el)
}

/// Strip anything shaped like a tag.
pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Reduce clipboard text to what the paste pipeline inserts: tags and
/// control characters removed, each line break collapsed to a single space.
pub fn sanitize_paste(text: &str) -> String {
    let stripped = strip_tags(text);
    let spaced = LINE_BREAK.replace_all(&stripped, " ");
    strip_control_chars(&spaced).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(src: &str) -> String {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, src).unwrap();
        nodes.into_iter().map(|n| dom.outer_html(n)).collect()
    }

    #[test]
    fn test_parse_void_elements() {
        assert_eq!(
            round_trip(r#"<p>a<br>b<BR/>c</p><hr class="x"><img src="u.jpg" alt="y">"#),
            r#"<p>a<br>b<br>c</p><hr class="x"><img src="u.jpg" alt="y">"#
        );
    }

    #[test]
    fn test_parse_entities() {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, "<p>a&nbsp;b &amp; &bogus;</p>").unwrap();
        assert_eq!(dom.text_content(nodes[0]), "a\u{a0}b & &bogus;");
    }

    #[test]
    fn test_parse_drops_comments_and_lowercases() {
        assert_eq!(
            round_trip("<DIV Class=\"k\"><!-- note -->x</DIV>"),
            "<div class=\"k\">x</div>"
        );
    }

    #[test]
    fn test_parse_keeps_fragment_order() {
        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, "one<b>two</b>three").unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|&n| !dom.is_connected(n)));
    }

    #[test]
    fn test_parse_error_has_span() {
        let mut dom = Dom::new();
        let err = parse_fragment(&mut dom, "<p><b>x</p>").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }));
    }

    #[test]
    fn test_sanitize_paste() {
        assert_eq!(
            sanitize_paste("<b>Hello</b>\r\nthere\nyou<br/>all"),
            "Hello there youall"
        );
        assert_eq!(sanitize_paste("a < b"), "a < b");
    }

    #[test]
    fn test_control_chars_are_dropped() {
        assert_eq!(sanitize_paste("page\u{0C}break\u{0}"), "pagebreak");
        assert_eq!(strip_control_chars("a\tb\u{1B}c\u{7F}"), "a\tbc\u{7F}");

        let mut dom = Dom::new();
        let nodes = parse_fragment(&mut dom, "<p>form\u{0C}feed</p>").unwrap();
        assert_eq!(dom.outer_html(nodes[0]), "<p>formfeed</p>");
    }

    #[test]
    fn test_sanitize_ignores_markup_already_removed() {
        let inputs = [
            "<p>one</p>\n<p>two</p>",
            "a<<b>>c",
            "<span style=\"x\">q</span>\r\r",
            "plain",
        ];
        for input in inputs {
            assert_eq!(sanitize_paste(input), sanitize_paste(&strip_tags(input)));
        }
    }
}
