use crate::dom::{Dom, NodeData, NodeId};
use std::fmt::Write;

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

fn first_styles(style: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (k, v)) in style.iter().take(3).enumerate() {
        if i != 0 {
            out.push(' ');
        }
        let _ = write!(&mut out, "{k}: {v};");
    }
    out
}

fn push_preview(out: &mut String, s: &str) {
    for (i, ch) in s.chars().enumerate() {
        if i == PREVIEW_CHARS {
            out.push('…');
            break;
        }
        out.push(match ch {
            '\n' => ' ',
            '\u{200B}' => '␣',
            other => other,
        });
    }
}

/// Indented one-line-per-node view of the subtree at `root`, at most `cap` lines.
///
/// Whitespace-only text is skipped; zero-width spaces render as `␣` so placeholder text is
/// visible.
pub fn outline(dom: &Dom, root: NodeId, cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        if out.len() == cap {
            break;
        }
        let mut line = INDENT_STEP.repeat(depth);
        match dom.data(id) {
            None => continue,
            Some(NodeData::Document) => line.push_str("#document"),
            Some(NodeData::Element { name, .. }) => {
                let _ = write!(&mut line, "<{name}");
                for key in ["id", "class", "contenteditable"] {
                    if let Some(value) = dom.attr(id, key).filter(|v| !v.is_empty()) {
                        let _ = write!(&mut line, r#" {key}="{value}""#);
                    }
                }
                line.push('>');
                let styles = first_styles(&dom.style_declarations(id));
                if !styles.is_empty() {
                    let _ = write!(&mut line, "  /* {styles} */");
                }
            }
            Some(NodeData::Text(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                line.push('"');
                push_preview(&mut line, trimmed);
                line.push('"');
            }
            Some(NodeData::Comment(text)) => {
                line.push_str("<!-- ");
                push_preview(&mut line, text);
                line.push_str(" -->");
            }
        }
        out.push(line);
        stack.extend(dom.children(id).iter().rev().map(|c| (*c, depth + 1)));
    }
    out
}
