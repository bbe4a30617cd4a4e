//! Node roles.
//!
//! Roles are derived from the tag name and a family of `__se__format__*` marker classes.
//! `classify` computes every role in one scan of the class attribute; the `is_*` predicates
//! are thin views over it. Missing, removed and non-element nodes classify as nothing.
use html::{Dom, NodeId};

const FORMAT_REPLACE_PREFIX: &str = "__se__format__replace_";
const FORMAT_FREE_PREFIX: &str = "__se__format__free_";
const FORMAT_FREE_CLOSURE_PREFIX: &str = "__se__format__free__closure_";
const FORMAT_RANGE_PREFIX: &str = "__se__format__range_";
const FORMAT_RANGE_CLOSURE_PREFIX: &str = "__se__format__range__closure_";

pub const WYSIWYG_CLASS: &str = "se-wrapper-wysiwyg";
const COMPONENT_CLASS: &str = "se-component";
const ISLAND_MARKERS: [&str; 2] = ["katex", "__se__tag"];

/// The single "format-ish" role of a node, most specific first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatRole {
    ClosureRange,
    Range,
    ClosureFree,
    Free,
    Line,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roles {
    pub format: bool,
    pub range_format: bool,
    pub closure_range_format: bool,
    pub free_format: bool,
    pub closure_free_format: bool,
    pub component: bool,
    pub text_style: bool,
    pub list: bool,
    pub list_cell: bool,
    pub table: bool,
    pub table_cell: bool,
    pub line_break: bool,
    pub anchor: bool,
    pub media: bool,
    pub wysiwyg_root: bool,
    pub non_editable: bool,
    pub island: bool,
}

impl Roles {
    pub fn format_role(&self) -> Option<FormatRole> {
        if self.closure_range_format {
            Some(FormatRole::ClosureRange)
        } else if self.range_format {
            Some(FormatRole::Range)
        } else if self.closure_free_format {
            Some(FormatRole::ClosureFree)
        } else if self.free_format {
            Some(FormatRole::Free)
        } else if self.format {
            Some(FormatRole::Line)
        } else {
            None
        }
    }
}

#[derive(Default)]
struct ClassMarkers {
    replace: bool,
    free: bool,
    free_closure: bool,
    range: bool,
    range_closure: bool,
    wysiwyg: bool,
}

// A marker needs at least one character after its prefix.
fn has_marker(token: &str, prefix: &str) -> bool {
    token.len() > prefix.len() && token.starts_with(prefix)
}

fn class_markers(dom: &Dom, id: NodeId) -> ClassMarkers {
    let mut markers = ClassMarkers::default();
    for token in dom.class_tokens(id) {
        markers.replace |= has_marker(token, FORMAT_REPLACE_PREFIX);
        markers.free |= has_marker(token, FORMAT_FREE_PREFIX);
        markers.free_closure |= has_marker(token, FORMAT_FREE_CLOSURE_PREFIX);
        markers.range |= has_marker(token, FORMAT_RANGE_PREFIX);
        markers.range_closure |= has_marker(token, FORMAT_RANGE_CLOSURE_PREFIX);
        markers.wysiwyg |= token == WYSIWYG_CLASS;
    }
    markers
}

fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub fn is_text_style_tag(tag: &str) -> bool {
    matches!(
        tag,
        "strong"
            | "span"
            | "font"
            | "b"
            | "var"
            | "i"
            | "em"
            | "u"
            | "ins"
            | "s"
            | "strike"
            | "del"
            | "sub"
            | "sup"
            | "mark"
            | "a"
            | "label"
            | "code"
    )
}

pub fn is_media_tag(tag: &str) -> bool {
    matches!(tag, "img" | "iframe" | "audio" | "video" | "canvas")
}

/// All roles of `id` in one pass.
pub fn classify(dom: &Dom, id: NodeId) -> Roles {
    let Some(tag) = dom.tag_name(id) else {
        return Roles::default();
    };
    let markers = class_markers(dom, id);
    let class = dom.attr(id, "class").unwrap_or("");

    let wysiwyg_root = markers.wysiwyg || tag == "body";
    let component = class.contains(COMPONENT_CLASS) || matches!(tag, "table" | "hr");
    let structural = !component && !wysiwyg_root;

    let line_tag = matches!(tag, "p" | "div" | "pre" | "li" | "th" | "td") || is_heading(tag);
    let free_format = structural && (tag == "pre" || markers.free);

    Roles {
        format: structural && (line_tag || markers.replace || markers.free),
        range_format: markers.range
            || matches!(
                tag,
                "blockquote" | "ol" | "ul" | "figcaption" | "table" | "thead" | "tbody" | "tr"
                    | "th" | "td"
            ),
        closure_range_format: markers.range_closure || matches!(tag, "th" | "td"),
        free_format,
        closure_free_format: markers.free_closure,
        component,
        text_style: is_text_style_tag(tag),
        list: matches!(tag, "ol" | "ul"),
        list_cell: tag == "li",
        table: matches!(tag, "table" | "thead" | "tbody" | "tr" | "th" | "td"),
        table_cell: matches!(tag, "th" | "td"),
        line_break: tag == "br",
        anchor: tag == "a",
        media: is_media_tag(tag),
        wysiwyg_root,
        non_editable: dom.attr(id, "contenteditable") == Some("false"),
        island: ISLAND_MARKERS.iter().any(|m| class.contains(m)),
    }
}

pub fn format_role(dom: &Dom, id: NodeId) -> Option<FormatRole> {
    classify(dom, id).format_role()
}

/// A line: `p`, `div`, headings, `pre`, `li` and table cells, or a node carrying a line
/// marker class. Never a component or the wysiwyg root.
pub fn is_format(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).format
}

/// A block that wraps lines and components.
pub fn is_range_format(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).range_format
}

/// A range block the caret cannot leave with Enter or Backspace (table cells).
pub fn is_closure_range_format(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).closure_range_format
}

/// A line whose internal breaks are `<br>` rather than new lines.
pub fn is_free_format(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).free_format
}

pub fn is_closure_free_format(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).closure_free_format
}

pub fn is_component(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).component
}

pub fn is_text_style(dom: &Dom, id: NodeId) -> bool {
    dom.tag_name(id).is_some_and(is_text_style_tag)
}

pub fn is_list(dom: &Dom, id: NodeId) -> bool {
    dom.tag_name(id).is_some_and(|t| matches!(t, "ol" | "ul"))
}

pub fn is_list_cell(dom: &Dom, id: NodeId) -> bool {
    dom.has_tag(id, "li")
}

pub fn is_table(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).table
}

pub fn is_table_cell(dom: &Dom, id: NodeId) -> bool {
    dom.tag_name(id).is_some_and(|t| matches!(t, "th" | "td"))
}

pub fn is_break(dom: &Dom, id: NodeId) -> bool {
    dom.has_tag(id, "br")
}

pub fn is_anchor(dom: &Dom, id: NodeId) -> bool {
    dom.has_tag(id, "a")
}

pub fn is_media(dom: &Dom, id: NodeId) -> bool {
    dom.tag_name(id).is_some_and(is_media_tag)
}

pub fn is_non_editable(dom: &Dom, id: NodeId) -> bool {
    dom.is_element(id) && dom.attr(id, "contenteditable") == Some("false")
}

pub fn is_wysiwyg_root(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).wysiwyg_root
}

/// Inert decoration (`katex` math, `__se__tag` chips) the structural checker never edits.
pub fn is_island(dom: &Dom, id: NodeId) -> bool {
    classify(dom, id).island
}

/// Nodes carried over untouched when text styling is applied: any non-text node that is
/// non-editable or is not a text-style element.
pub fn is_ignore_node_change(dom: &Dom, id: NodeId) -> bool {
    dom.is_live(id) && !dom.is_text(id) && (is_non_editable(dom, id) || !is_text_style(dom, id))
}

/// Elements that never hold text.
pub fn is_not_text_node(dom: &Dom, id: NodeId) -> bool {
    let Some(tag) = dom.tag_name(id) else {
        return false;
    };
    is_component(dom, id)
        || matches!(
            tag,
            "br" | "input" | "select" | "canvas" | "img" | "iframe" | "audio" | "video"
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::parse_fragment;

    fn first(html: &str) -> (Dom, NodeId) {
        let dom = parse_fragment(html);
        let id = dom.children(dom.document())[0];
        (dom, id)
    }

    #[test]
    fn format_covers_lines_and_marker_classes() {
        for html in ["<p></p>", "<h3></h3>", "<pre></pre>", "<td></td>", "<span class=\"x __se__format__replace_q\"></span>"] {
            let (dom, id) = first(html);
            assert!(is_format(&dom, id), "expected format for {html}");
        }
        let (dom, id) = first("<span class=\"__se__format__replace_\"></span>");
        assert!(!is_format(&dom, id), "bare prefix is not a marker");
    }

    #[test]
    fn format_excludes_components_and_root() {
        let (dom, id) = first(r#"<div class="se-component"></div>"#);
        assert!(!is_format(&dom, id));
        assert!(is_component(&dom, id));
        let (dom, id) = first(r#"<div class="se-wrapper-wysiwyg"></div>"#);
        assert!(!is_format(&dom, id));
        assert!(is_wysiwyg_root(&dom, id));
    }

    #[test]
    fn closure_variants_are_layered() {
        let (dom, td) = first("<td></td>");
        let roles = classify(&dom, td);
        assert!(roles.range_format && roles.closure_range_format && roles.format);
        assert_eq!(roles.format_role(), Some(FormatRole::ClosureRange));

        let (dom, div) = first(r#"<div class="__se__format__free__closure_note"></div>"#);
        let roles = classify(&dom, div);
        assert!(roles.free_format && roles.closure_free_format && roles.format);
        assert_eq!(roles.format_role(), Some(FormatRole::ClosureFree));
    }

    #[test]
    fn format_role_precedence() {
        let cases = [
            ("<blockquote></blockquote>", Some(FormatRole::Range)),
            ("<pre></pre>", Some(FormatRole::Free)),
            ("<p></p>", Some(FormatRole::Line)),
            ("<span></span>", None),
            ("<table></table>", Some(FormatRole::Range)),
        ];
        for (html, expected) in cases {
            let (dom, id) = first(html);
            assert_eq!(format_role(&dom, id), expected, "{html}");
        }
    }

    #[test]
    fn text_nodes_classify_as_nothing() {
        let (dom, text) = first("plain");
        assert_eq!(classify(&dom, text), Roles::default());
        assert!(!is_ignore_node_change(&dom, text));
        assert!(!is_not_text_node(&dom, text));
    }

    #[test]
    fn component_matches_class_substring_and_tags() {
        for html in ["<hr>", "<table></table>", r#"<figure class="se-component se-image-container"></figure>"#] {
            let (dom, id) = first(html);
            assert!(is_component(&dom, id), "{html}");
            assert!(is_not_text_node(&dom, id), "{html}");
        }
    }

    #[test]
    fn island_and_editability() {
        let (dom, id) = first(r#"<span class="katex-display" contenteditable="false"></span>"#);
        assert!(is_island(&dom, id));
        assert!(is_non_editable(&dom, id));
        assert!(is_ignore_node_change(&dom, id));

        let (dom, id) = first("<strong></strong>");
        assert!(!is_ignore_node_change(&dom, id));
        let (dom, id) = first("<p></p>");
        assert!(is_ignore_node_change(&dom, id));
    }

    #[test]
    fn simple_tag_predicates() {
        let dom = parse_fragment("<ul><li><a><img></a><br></li></ul>");
        let ul = dom.children(dom.document())[0];
        let li = dom.children(ul)[0];
        let a = dom.children(li)[0];
        let img = dom.children(a)[0];
        let br = dom.children(li)[1];
        assert!(is_list(&dom, ul) && !is_list(&dom, li));
        assert!(is_list_cell(&dom, li));
        assert!(is_anchor(&dom, a) && is_text_style(&dom, a));
        assert!(is_media(&dom, img));
        assert!(is_break(&dom, br));
        assert!(!is_table(&dom, li) && !is_table_cell(&dom, li));
    }
}
