use crate::dom::{Dom, DomError, NodeId};
use crate::tokenizer::tokenize;
use crate::types::{Token, TokenStream};
use std::sync::Arc;

/// Parse an HTML fragment into a fresh tree under its document root.
pub fn parse_fragment(html: &str) -> Dom {
    let mut dom = Dom::new();
    let root = dom.document();
    // The document root accepts any child and a fresh tree has no cycles to reject.
    if let Err(err) = parse_fragment_into(&mut dom, root, html) {
        log::debug!(target: "html.builder", "fragment build stopped early: {err}");
    }
    dom
}

/// Parse `html` and append the result to `parent`. Returns the new top-level nodes.
///
/// Nesting is kept exactly as written: an end tag closes the nearest open element with the
/// same name (and everything opened after it); an end tag with no open match is ignored.
pub fn parse_fragment_into(
    dom: &mut Dom,
    parent: NodeId,
    html: &str,
) -> Result<Vec<NodeId>, DomError> {
    let stream = tokenize(html);
    build_into(dom, parent, &stream)
}

fn build_into(
    dom: &mut Dom,
    parent: NodeId,
    stream: &TokenStream,
) -> Result<Vec<NodeId>, DomError> {
    let atoms = stream.atoms();
    let mut open_elements: Vec<NodeId> = Vec::new();
    let mut top_level = Vec::new();

    for token in stream.iter() {
        let current = open_elements.last().copied().unwrap_or(parent);
        let created = match token {
            Token::Doctype(_) => continue,
            Token::Comment(text) => dom.create_comment(text),
            Token::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                dom.create_text(text)
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let mut resolved: Vec<(Arc<str>, Option<String>)> =
                    Vec::with_capacity(attributes.len());
                for (k, v) in attributes {
                    let key = atoms.resolve(*k);
                    // First occurrence wins on duplicate attribute names.
                    if resolved.iter().any(|(existing, _)| &**existing == key) {
                        continue;
                    }
                    resolved.push((Arc::from(key), v.clone()));
                }
                let element = dom.create_element_with(atoms.resolve(*name), resolved);
                dom.append_child(current, element)?;
                if current == parent {
                    top_level.push(element);
                }
                if !*self_closing {
                    open_elements.push(element);
                }
                continue;
            }
            Token::EndTag(name) => {
                let target = atoms.resolve(*name);
                if let Some(pos) = open_elements
                    .iter()
                    .rposition(|open| dom.has_tag(*open, target))
                {
                    open_elements.truncate(pos);
                }
                continue;
            }
        };
        dom.append_child(current, created)?;
        if current == parent {
            top_level.push(created);
        }
    }

    log::trace!(
        target: "html.builder",
        "built {} top-level nodes, {} left open",
        top_level.len(),
        open_elements.len()
    );
    Ok(top_level)
}
