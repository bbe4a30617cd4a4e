//! Per-element cleanup for elements that survived the tag filters: attribute filtering and
//! text-style tag renaming.
//!
//! Attribute lists are pipe-delimited name patterns compiled the way tag lists are, as an
//! anchored case-insensitive alternation. A list of `*` matches every name.
use crate::classify::is_island;
use crate::error::ConfigError;
use crate::query::{get_descendants_outside_islands, Traverse};
use crate::whitelist::split_tag_list;
use html::{Dom, DomError, NodeId};
use regex::Regex;
use std::collections::BTreeMap;

pub const DEFAULT_ATTRIBUTE_WHITELIST: &str =
    "contenteditable|colspan|rowspan|target|href|download|rel|src|alt|class|type|controls";
const ALL_TAGS: &str = "all";
const SPAN_STYLE_PROPERTIES: [&str; 4] = ["font-family", "font-size", "color", "background-color"];
const EDITOR_CLASS_PREFIXES: [&str; 3] = ["__se__", "se-", "katex"];

#[derive(Clone, Debug)]
enum Names {
    Nothing,
    Everything,
    Listed(Regex),
}

impl Names {
    fn compile(option: &'static str, tag: &str, list: &str) -> Result<Self, ConfigError> {
        if list.trim() == "*" {
            return Ok(Names::Everything);
        }
        let entries = split_tag_list(list);
        if entries.is_empty() {
            return Ok(Names::Nothing);
        }
        let alternation: Vec<String> = entries.iter().map(|e| format!("(?:{e})")).collect();
        Regex::new(&format!("(?i)^(?:{})$", alternation.join("|")))
            .map(Names::Listed)
            .map_err(|source| ConfigError::InvalidAttributePattern {
                option,
                tag: tag.to_string(),
                source,
            })
    }

    fn contains(&self, name: &str) -> bool {
        match self {
            Names::Nothing => false,
            Names::Everything => true,
            Names::Listed(re) => re.is_match(name),
        }
    }
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

/// `javascript:` URLs, with whitespace and control characters inside the scheme ignored.
fn is_script_url(value: &str) -> bool {
    const SCHEME: &str = "javascript:";
    let head: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .take(SCHEME.len())
        .collect();
    head.eq_ignore_ascii_case(SCHEME)
}

/// Class tokens the editor itself relies on, or `None` when there are none.
fn editor_classes(class: &str) -> Option<String> {
    let kept: Vec<&str> = class
        .split_ascii_whitespace()
        .filter(|token| EDITOR_CLASS_PREFIXES.iter().any(|p| token.starts_with(p)))
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

/// Compiled attribute allow and deny lists.
#[derive(Clone, Debug)]
pub struct AttributePolicy {
    whitelist: Names,
    tag_whitelist: BTreeMap<String, Names>,
    blacklist: Names,
    tag_blacklist: BTreeMap<String, Names>,
}

impl AttributePolicy {
    /// `whitelist` and `blacklist` map lowercased tag names (or `all`) to attribute lists.
    /// Without a whitelist `all` entry the default attribute list applies.
    pub fn new(
        whitelist: &BTreeMap<String, String>,
        blacklist: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let general = match whitelist.get(ALL_TAGS).map(|l| l.trim()) {
            Some("*") => "*".to_string(),
            Some(list) if !list.is_empty() => format!("{list}|{DEFAULT_ATTRIBUTE_WHITELIST}"),
            _ => DEFAULT_ATTRIBUTE_WHITELIST.to_string(),
        };
        let per_tag = |option, lists: &BTreeMap<String, String>| {
            lists
                .iter()
                .filter(|(tag, _)| tag.as_str() != ALL_TAGS)
                .map(|(tag, list)| Ok((tag.clone(), Names::compile(option, tag, list)?)))
                .collect::<Result<BTreeMap<_, _>, ConfigError>>()
        };
        Ok(Self {
            whitelist: Names::compile("attribute_whitelist", ALL_TAGS, &general)?,
            tag_whitelist: per_tag("attribute_whitelist", whitelist)?,
            blacklist: match blacklist.get(ALL_TAGS) {
                Some(list) => Names::compile("attribute_blacklist", ALL_TAGS, list)?,
                None => Names::Nothing,
            },
            tag_blacklist: per_tag("attribute_blacklist", blacklist)?,
        })
    }

    fn is_blacklisted(&self, tag: &str, name: &str) -> bool {
        self.tag_blacklist.get(tag).unwrap_or(&self.blacklist).contains(name)
    }

    /// Whether attribute `name="value"` of a `tag` element survives as written.
    ///
    /// Event handlers and `javascript:` links never do; `id` and `name` survive on anchors.
    pub fn allows(&self, tag: &str, name: &str, value: &str) -> bool {
        if is_event_handler(name) || self.is_blacklisted(tag, name) {
            return false;
        }
        if (name.eq_ignore_ascii_case("href") || name.eq_ignore_ascii_case("src")) && is_script_url(value) {
            return false;
        }
        self.tag_whitelist.get(tag).unwrap_or(&self.whitelist).contains(name)
            || (tag == "a" && matches!(name, "id" | "name"))
    }

    /// Font and color declarations of a span whose `style` is not whitelisted outright.
    fn span_style(&self, dom: &Dom, id: NodeId) -> Option<String> {
        let declarations: Vec<String> = dom
            .style_declarations(id)
            .into_iter()
            .filter(|(property, value)| {
                let value = value.to_ascii_lowercase();
                SPAN_STYLE_PROPERTIES.contains(&property.as_str())
                    && !value.contains("inherit")
                    && !value.contains("initial")
            })
            .map(|(property, value)| format!("{property}: {value}"))
            .collect();
        (!declarations.is_empty()).then(|| declarations.join("; "))
    }

    /// Filter the attributes of one element. Namespaced elements are left to the tag filters.
    pub fn filter_element(&self, dom: &mut Dom, id: NodeId) -> Result<(), DomError> {
        let Some(tag) = dom.tag_name(id).map(str::to_string) else {
            return Err(DomError::WrongNodeKind(id));
        };
        if tag.contains(':') {
            return Ok(());
        }

        let span_style = match dom.attr(id, "style") {
            Some(style)
                if tag == "span"
                    && !self.allows(&tag, "style", style)
                    && !self.is_blacklisted(&tag, "style") =>
            {
                self.span_style(dom, id)
            }
            _ => None,
        };
        let class = dom
            .attr(id, "class")
            .filter(|value| self.allows(&tag, "class", value))
            .and_then(editor_classes);

        // Rewritten attributes stay where they were.
        let before = dom.attributes(id).len();
        dom.retain_attributes(id, |name, value| {
            if name.eq_ignore_ascii_case("class") {
                class.is_some()
            } else if name.eq_ignore_ascii_case("style") && span_style.is_some() {
                true
            } else {
                self.allows(&tag, name, value.unwrap_or(""))
            }
        })?;
        if let Some(class) = class {
            dom.set_attr(id, "class", &class)?;
        }
        if let Some(style) = span_style {
            dom.set_attr(id, "style", &style)?;
        }
        let after = dom.attributes(id).len();
        if after < before {
            log::trace!(target: "editor.elements", "dropped {} attribute(s) from <{tag}> {id}", before - after);
        }
        Ok(())
    }
}

/// Filter attributes on every element under `root`. Island contents are skipped; an
/// element only counts as an island after its own attributes were filtered.
pub fn filter_attributes(dom: &mut Dom, root: NodeId, policy: &AttributePolicy) {
    let mut stack: Vec<NodeId> = dom.children(root).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if !dom.is_element(node) {
            continue;
        }
        if let Err(err) = policy.filter_element(dom, node) {
            log::debug!(target: "editor.elements", "attributes of {node} left as is: {err}");
        }
        if !is_island(dom, node) {
            stack.extend(dom.children(node).iter().rev().copied());
        }
    }
}

/// Rename text-style elements under `root` per `renames` (`(from, to)` pairs), keeping
/// their attributes and content. Returns how many elements were renamed.
pub fn convert_style_tags(dom: &mut Dom, root: NodeId, renames: &[(String, String)]) -> usize {
    if renames.is_empty() {
        return 0;
    }
    let mut renamed = 0;
    for node in get_descendants_outside_islands(dom, root, Traverse::Elements, |_| true) {
        let Some(to) = dom
            .tag_name(node)
            .and_then(|tag| renames.iter().find(|(from, _)| from == tag))
            .map(|(_, to)| to.clone())
        else {
            continue;
        };
        match dom.rename(node, &to) {
            Ok(()) => renamed += 1,
            Err(err) => log::debug!(target: "editor.elements", "kept {node}: {err}"),
        }
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::{inner_html, parse_fragment};

    fn lists(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn filtered(html: &str, policy: &AttributePolicy) -> String {
        let mut dom = parse_fragment(html);
        let root = dom.document();
        filter_attributes(&mut dom, root, policy);
        inner_html(&dom, root)
    }

    fn default_policy() -> AttributePolicy {
        AttributePolicy::new(&BTreeMap::new(), &BTreeMap::new()).unwrap()
    }

    #[test]
    fn default_list_drops_handlers_and_unknown_attributes() {
        assert_eq!(
            filtered(
                r#"<p onclick="x()" title="t"><a href="/x" target="_blank" onmouseover="y()">a</a></p>"#,
                &default_policy()
            ),
            r#"<p><a href="/x" target="_blank">a</a></p>"#
        );
    }

    #[test]
    fn script_urls_are_dropped() {
        assert_eq!(
            filtered(
                r#"<a href=" JavaScript :alert(1)">a</a><img src="java&#x09;script:x" alt="i">"#,
                &default_policy()
            ),
            r#"<a>a</a><img alt="i">"#
        );
        assert!(default_policy().allows("a", "href", "https://example.com/javascript:"));
    }

    #[test]
    fn classes_keep_editor_tokens_only() {
        assert_eq!(
            filtered(
                r#"<div class="mine se-component other"><p class="lead">x</p></div>"#,
                &default_policy()
            ),
            r#"<div class="se-component"><p>x</p></div>"#
        );
    }

    #[test]
    fn anchors_keep_id_and_name() {
        assert_eq!(
            filtered(r#"<a id="top" name="n" rel="x">a</a><p id="p">b</p>"#, &default_policy()),
            r#"<a id="top" name="n" rel="x">a</a><p>b</p>"#
        );
    }

    #[test]
    fn span_style_keeps_font_and_color_only() {
        assert_eq!(
            filtered(
                r#"<span style="color: red; position: fixed; font-size: 12px; background-color: inherit">a</span><p style="color: red">b</p>"#,
                &default_policy()
            ),
            r#"<span style="color: red; font-size: 12px">a</span><p>b</p>"#
        );
    }

    #[test]
    fn per_tag_lists_replace_the_general_ones() {
        let policy = AttributePolicy::new(
            &lists(&[("all", "title|on[a-z]+"), ("img", "src|width")]),
            &lists(&[("all", "rel"), ("a", "target")]),
        )
        .unwrap();
        assert_eq!(
            filtered(
                r#"<p title="t" onclick="x()" class="se-a"><img src="a.png" width="3" alt="a"><a href="/" rel="r" target="t">l</a></p>"#,
                &policy
            ),
            r#"<p title="t" class="se-a"><img src="a.png" width="3"><a href="/" rel="r">l</a></p>"#
        );
    }

    #[test]
    fn star_whitelist_still_drops_handlers() {
        let policy = AttributePolicy::new(&lists(&[("all", "*")]), &BTreeMap::new()).unwrap();
        assert_eq!(
            filtered(r#"<p data-x="1" onload="x()">a</p>"#, &policy),
            r#"<p data-x="1">a</p>"#
        );
    }

    #[test]
    fn island_contents_are_not_filtered() {
        assert_eq!(
            filtered(
                r#"<span class="katex" title="t"><span class="mord" title="m">x</span></span>"#,
                &default_policy()
            ),
            r#"<span class="katex"><span class="mord" title="m">x</span></span>"#
        );
    }

    #[test]
    fn bad_attribute_pattern_names_the_tag() {
        let err = AttributePolicy::new(&lists(&[("img", "src|(")]), &BTreeMap::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAttributePattern { option: "attribute_whitelist", ref tag, .. } if tag == "img"
        ));
    }

    #[test]
    fn style_tags_are_renamed_in_place() {
        let mut dom = parse_fragment(
            r#"<p><b class="se-x">a<i>b</i></b><s>c</s><span class="katex"><b>k</b></span></p>"#,
        );
        let root = dom.document();
        let renames = vec![
            ("b".to_string(), "strong".to_string()),
            ("i".to_string(), "em".to_string()),
            ("s".to_string(), "del".to_string()),
        ];
        assert_eq!(convert_style_tags(&mut dom, root, &renames), 3);
        assert_eq!(
            inner_html(&dom, root),
            r#"<p><strong class="se-x">a<em>b</em></strong><del>c</del><span class="katex"><b>k</b></span></p>"#
        );
    }
}
