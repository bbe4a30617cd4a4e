//! Editor options and the derived tag lists.
use crate::classify::is_text_style_tag;
use crate::error::ConfigError;
use crate::whitelist::split_tag_list;
use serde::Deserialize;
use std::collections::BTreeMap;

const REQUIRED_FORMAT_LINE: &str = "div";
const REQUIRED_ELEMENT_WHITELIST: &str = "br|div";
const DEFAULT_ELEMENT_WHITELIST: &str = "p|pre|blockquote|h1|h2|h3|h4|h5|h6|ol|ul|li|hr|figure|figcaption|img|iframe|audio|video|source|table|thead|tbody|tr|th|td|a|b|strong|var|i|em|u|ins|s|span|strike|del|sub|sup|code|svg|path|details|summary";
const DEFAULT_FORMAT_LINE: &str = "p|h[1-6]|li|th|td|details";
const DEFAULT_FORMAT_BR_LINE: &str = "pre";
const DEFAULT_FORMAT_BLOCK: &str = "blockquote|ol|ul|figcaption|table|thead|tbody|tr|details";
const DEFAULT_FORMAT_CLOSURE_BLOCK: &str = "th|td";
const DEFAULT_LINE: &str = "p";

/// Tags that bold, underline, italic, strike, subscript and superscript are written as.
/// `b`, `i`, `ins`, `s` and friends are renamed to these.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TextTags {
    pub bold: String,
    pub underline: String,
    pub italic: String,
    pub strike: String,
    pub sub: String,
    pub sup: String,
}

impl Default for TextTags {
    fn default() -> Self {
        Self {
            bold: "strong".to_string(),
            underline: "u".to_string(),
            italic: "em".to_string(),
            strike: "del".to_string(),
            sub: "sub".to_string(),
            sup: "sup".to_string(),
        }
    }
}

/// User-facing options. The element and format fields are pipe-delimited tag lists.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Extra allowed tags, or `*` to allow every tag.
    pub element_whitelist: String,
    pub element_blacklist: String,
    pub format_line: String,
    pub format_br_line: String,
    pub format_block: String,
    pub format_closure_block: String,
    pub format_closure_br_line: String,
    /// Tag used for new lines and placeholder lines.
    pub default_line: String,
    /// Attribute names kept, keyed by tag. The `all` entry extends the default list for
    /// tags without an entry of their own; `*` keeps every attribute.
    pub attribute_whitelist: BTreeMap<String, String>,
    /// Attribute names dropped, keyed by tag. The `all` entry covers tags without an entry.
    pub attribute_blacklist: BTreeMap<String, String>,
    pub text_tags: TextTags,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            element_whitelist: String::new(),
            element_blacklist: String::new(),
            format_line: String::new(),
            format_br_line: String::new(),
            format_block: String::new(),
            format_closure_block: String::new(),
            format_closure_br_line: String::new(),
            default_line: DEFAULT_LINE.to_string(),
            attribute_whitelist: BTreeMap::new(),
            attribute_blacklist: BTreeMap::new(),
            text_tags: TextTags::default(),
        }
    }
}

/// Options after composition: the lists the filters are compiled from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub whitelist: String,
    pub blacklist: String,
    pub format_line: String,
    pub format_br_line: String,
    pub format_block: String,
    pub format_closure_block: String,
    pub format_closure_br_line: String,
    pub default_line: String,
    /// Attribute lists with lowercased tag keys.
    pub attribute_whitelist: BTreeMap<String, String>,
    pub attribute_blacklist: BTreeMap<String, String>,
    /// `(from, to)` text-style renames. Tags the user whitelisted by name keep their name.
    pub style_tags: Vec<(String, String)>,
}

fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Defaults joined with the user list, minus anything blacklisted.
fn format_list(defaults: &str, user: &str, blacklist: &[String]) -> Vec<String> {
    split_tag_list(&format!("{defaults}|{user}"))
        .into_iter()
        .filter(|tag| !blacklist.contains(tag))
        .collect()
}

fn lowercase_keys(map: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(tag, list)| (tag.trim().to_ascii_lowercase(), list.clone()))
        .collect()
}

impl TextTags {
    /// Renames from every text-style spelling to the configured tag, minus no-ops, `exempt`
    /// tags and renames to a blacklisted tag.
    fn style_tags(&self, exempt: &[String], blacklist: &[String]) -> Result<Vec<(String, String)>, ConfigError> {
        let styles = [
            ("bold", &self.bold, ["strong", "b", ""]),
            ("underline", &self.underline, ["u", "ins", ""]),
            ("italic", &self.italic, ["em", "i", ""]),
            ("strike", &self.strike, ["del", "strike", "s"]),
            ("sub", &self.sub, ["sub", "", ""]),
            ("sup", &self.sup, ["sup", "", ""]),
        ];
        let mut renames = Vec::new();
        for (style, tag, spellings) in styles {
            let to = tag.trim().to_ascii_lowercase();
            if !is_text_style_tag(&to) {
                return Err(ConfigError::InvalidTextTag { style, tag: tag.clone() });
            }
            if blacklist.contains(&to) {
                log::warn!(target: "editor.options", "{style} tag <{to}> is blacklisted; not converting to it");
                continue;
            }
            for from in spellings.into_iter().filter(|f| !f.is_empty()) {
                if from != to && !exempt.iter().any(|e| e == from) {
                    renames.push((from.to_string(), to.clone()));
                }
            }
        }
        Ok(renames)
    }
}

impl Options {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Compose the effective lists.
    ///
    /// The whitelist is the default element whitelist, the user whitelist and every format
    /// list, minus the blacklist. The default line tag can never be blacklisted; it is
    /// dropped from the blacklist with a warning.
    pub fn resolve(&self) -> Result<ResolvedOptions, ConfigError> {
        let default_line = match self.default_line.trim() {
            "" => DEFAULT_LINE.to_string(),
            tag if is_tag_name(tag) => tag.to_ascii_lowercase(),
            tag => return Err(ConfigError::InvalidDefaultLine(tag.to_string())),
        };

        let blacklist: Vec<String> = split_tag_list(&self.element_blacklist)
            .into_iter()
            .filter(|tag| {
                let keep = *tag != default_line;
                if !keep {
                    log::warn!(
                        target: "editor.options",
                        "default line <{default_line}> cannot be blacklisted; removed from element_blacklist"
                    );
                }
                keep
            })
            .collect();

        let closure_br_line = format_list("", &self.format_closure_br_line, &blacklist);
        let br_line = format_list(
            DEFAULT_FORMAT_BR_LINE,
            &format!("{}|{}", self.format_br_line, closure_br_line.join("|")),
            &blacklist,
        );
        let line = format_list(
            &format!("{REQUIRED_FORMAT_LINE}|{DEFAULT_FORMAT_LINE}"),
            &format!("{}|{}", self.format_line, br_line.join("|")),
            &blacklist,
        );
        let closure_block =
            format_list(DEFAULT_FORMAT_CLOSURE_BLOCK, &self.format_closure_block, &blacklist);
        let block = format_list(
            DEFAULT_FORMAT_BLOCK,
            &format!("{}|{}", self.format_block, closure_block.join("|")),
            &blacklist,
        );

        let user_whitelist = split_tag_list(&self.element_whitelist);
        let style_tags = self.text_tags.style_tags(&user_whitelist, &blacklist)?;
        let style_targets: Vec<&str> = style_tags.iter().map(|(_, to)| to.as_str()).collect();

        let whitelist = if self.element_whitelist.trim() == "*" {
            "*".to_string()
        } else {
            let composed = [
                REQUIRED_ELEMENT_WHITELIST,
                DEFAULT_ELEMENT_WHITELIST,
                &default_line,
                &self.element_whitelist,
                &line.join("|"),
                &br_line.join("|"),
                &closure_block.join("|"),
                &closure_br_line.join("|"),
                &style_targets.join("|"),
            ]
            .join("|");
            split_tag_list(&composed)
                .into_iter()
                .filter(|tag| !blacklist.contains(tag))
                .collect::<Vec<_>>()
                .join("|")
        };

        Ok(ResolvedOptions {
            whitelist,
            blacklist: blacklist.join("|"),
            format_line: line.join("|"),
            format_br_line: br_line.join("|"),
            format_block: block.join("|"),
            format_closure_block: closure_block.join("|"),
            format_closure_br_line: closure_br_line.join("|"),
            default_line,
            attribute_whitelist: lowercase_keys(&self.attribute_whitelist),
            attribute_blacklist: lowercase_keys(&self.attribute_blacklist),
            style_tags,
        })
    }
}
