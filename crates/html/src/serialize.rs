use crate::dom::{Dom, NodeData, NodeId};
use crate::tokenizer::is_void_element;

enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// Serialized children of `id`.
pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, *child, &mut out);
    }
    out
}

/// Serialized `id` including its own tags.
pub fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

fn is_rawtext(name: &str) -> bool {
    matches!(name, "script" | "style")
}

// Explicit stack: editor content can nest deeper than the call stack tolerates.
fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let mut stack = vec![Step::Open(id)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Close(id) => {
                if let Some(name) = dom.tag_name(id) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
                continue;
            }
            Step::Open(id) => id,
        };
        match dom.data(id) {
            None => {}
            Some(NodeData::Document) => {
                stack.extend(dom.children(id).iter().rev().map(|c| Step::Open(*c)));
            }
            Some(NodeData::Text(text)) => {
                let raw = dom
                    .parent(id)
                    .and_then(|p| dom.tag_name(p))
                    .is_some_and(is_rawtext);
                if raw {
                    out.push_str(text);
                } else {
                    escape_text_into(text, out);
                }
            }
            Some(NodeData::Comment(text)) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Some(NodeData::Element { name, attributes }) => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        escape_attr_into(value, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(name) {
                    continue;
                }
                stack.push(Step::Close(id));
                stack.extend(dom.children(id).iter().rev().map(|c| Step::Open(*c)));
            }
        }
    }
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_builder::parse_fragment;

    fn round_trip(html: &str) -> String {
        let dom = parse_fragment(html);
        inner_html(&dom, dom.document())
    }

    #[test]
    fn serialize_round_trips_well_formed_markup() {
        let html = r#"<p class="a b">x <b>y</b></p><ul><li>1</li></ul>"#;
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn serialize_void_elements_have_no_end_tag() {
        assert_eq!(round_trip("<p>a<br/>b<img src=x></p>"), r#"<p>a<br>b<img src="x"></p>"#);
    }

    #[test]
    fn serialize_escapes_text_and_attributes() {
        assert_eq!(
            round_trip(r#"<a title="&quot;q&quot; &amp;">1 &lt; 2&nbsp;</a>"#),
            r#"<a title="&quot;q&quot; &amp;">1 &lt; 2&nbsp;</a>"#
        );
    }

    #[test]
    fn serialize_keeps_valueless_attributes_bare() {
        assert_eq!(round_trip("<details open>x</details>"), "<details open>x</details>");
    }

    #[test]
    fn serialize_script_body_is_not_escaped() {
        assert_eq!(
            round_trip("<script>a < b && c</script>"),
            "<script>a < b && c</script>"
        );
    }

    #[test]
    fn serialize_comments_verbatim() {
        assert_eq!(round_trip("a<!-- note -->b"), "a<!-- note -->b");
    }

    #[test]
    fn outer_html_includes_own_tags() {
        let dom = parse_fragment("<div><p>x</p></div>");
        let div = dom.children(dom.document())[0];
        let p = dom.children(div)[0];
        assert_eq!(outer_html(&dom, p), "<p>x</p>");
        assert_eq!(inner_html(&dom, div), "<p>x</p>");
    }
}
