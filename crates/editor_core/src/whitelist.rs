//! Textual tag filtering applied to raw HTML before it is parsed.
//!
//! The `regex` crate has no look-ahead, so a filter is two regexes: a generic tag scanner
//! that captures the tag name, and an anchored alternation `^(?:p|b|h[1-6])$` that decides
//! whether that name is listed.
use crate::error::ConfigError;
use regex::{Captures, Regex};
use std::borrow::Cow;

// The name runs to the first space, `/` or `>` so `<p_x>` is judged as `p_x`, not `p`.
const TAG_PATTERN: &str = r"</?([A-Za-z][^\s/>]*)[^>]*>";
const COMMENT_PATTERN: &str = r"(?s)<!--.*?-->";
const RAW_BLOCK_PATTERN: &str = r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>";
const OFFICE_BLOCK_PATTERN: &str = r"(?i)<[a-z0-9]+:[a-z0-9]+[^>/]*>[^>]*</[a-z0-9]+:[a-z0-9]+>";
const COMMENT_MARKER: &str = "//";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Strip tags whose name is not listed.
    Allow,
    /// Strip tags whose name is listed.
    Deny,
}

/// A compiled pipe-delimited tag list.
#[derive(Clone, Debug)]
pub struct TagFilter {
    mode: Mode,
    /// `None` lists everything (`*`) for an allow list and nothing for an empty deny list.
    names: Option<Regex>,
    tag: Regex,
    comments_allowed: bool,
}

fn compile(option: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidTagPattern { option, source })
}

/// Lowercased, deduplicated entries of a pipe list. Empty entries are dropped.
pub fn split_tag_list(list: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for entry in list.split('|').map(str::trim).filter(|e| !e.is_empty()) {
        let entry = entry.to_ascii_lowercase();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries
}

fn names_pattern(option: &'static str, entries: &[String]) -> Result<Option<Regex>, ConfigError> {
    let alternation: Vec<String> = entries
        .iter()
        .filter(|e| e.as_str() != COMMENT_MARKER)
        .map(|e| format!("(?:{e})"))
        .collect();
    if alternation.is_empty() {
        return Ok(None);
    }
    compile(option, &format!("(?i)^(?:{})$", alternation.join("|"))).map(Some)
}

impl TagFilter {
    /// Keep listed tags and strip every other tag. `*` keeps everything.
    pub fn whitelist(list: &str) -> Result<Self, ConfigError> {
        let entries = split_tag_list(list);
        let everything = list.trim() == "*";
        let names = if everything {
            None
        } else {
            match names_pattern("element_whitelist", &entries)? {
                Some(re) => Some(re),
                // An allow list that lists nothing still rejects every tag.
                None => Some(compile("element_whitelist", "^$")?),
            }
        };
        Ok(Self {
            mode: Mode::Allow,
            names,
            tag: compile("element_whitelist", TAG_PATTERN)?,
            comments_allowed: everything || entries.iter().any(|e| e == COMMENT_MARKER),
        })
    }

    /// Strip listed tags and keep every other tag.
    pub fn blacklist(list: &str) -> Result<Self, ConfigError> {
        let entries = split_tag_list(list);
        Ok(Self {
            mode: Mode::Deny,
            names: names_pattern("element_blacklist", &entries)?,
            tag: compile("element_blacklist", TAG_PATTERN)?,
            comments_allowed: true,
        })
    }

    /// Whether an element named `name` survives this filter.
    pub fn allows(&self, name: &str) -> bool {
        let listed = self.names.as_ref().map(|re| re.is_match(name));
        match self.mode {
            Mode::Allow => listed.unwrap_or(true),
            Mode::Deny => !listed.unwrap_or(false),
        }
    }

    /// Whether HTML comments survive. Only an allow list of `*` or one holding `//` keeps them.
    pub fn allows_comments(&self) -> bool {
        self.comments_allowed
    }

    /// Remove rejected start and end tags, keeping the content between them.
    pub fn strip<'h>(&self, html: &'h str) -> Cow<'h, str> {
        if self.mode == Mode::Deny && self.names.is_none() {
            return Cow::Borrowed(html);
        }
        self.tag.replace_all(html, |caps: &Captures<'_>| {
            if self.allows(&caps[1]) {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
    }
}

/// Compiled filter that strips every tag whose name is not in `list`.
pub fn build_whitelist_pattern(list: &str) -> Result<TagFilter, ConfigError> {
    TagFilter::whitelist(list)
}

/// Elements no configuration can admit: document metadata, scripts and namespaced
/// Office markup such as `o:p`.
pub fn is_always_disallowed(name: &str) -> bool {
    name.contains(':') || matches!(name, "meta" | "script" | "link" | "style")
}

/// The full textual pre-filter: raw blocks, Office blocks, comments, then the allow and
/// deny lists.
#[derive(Clone, Debug)]
pub struct TagPolicy {
    whitelist: TagFilter,
    blacklist: TagFilter,
    raw_blocks: Regex,
    office_blocks: Regex,
    comments: Regex,
}

impl TagPolicy {
    pub fn new(whitelist: &str, blacklist: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            whitelist: TagFilter::whitelist(whitelist)?,
            blacklist: TagFilter::blacklist(blacklist)?,
            raw_blocks: compile("element_whitelist", RAW_BLOCK_PATTERN)?,
            office_blocks: compile("element_whitelist", OFFICE_BLOCK_PATTERN)?,
            comments: compile("element_whitelist", COMMENT_PATTERN)?,
        })
    }

    /// Whether an element named `name` may exist in the tree.
    pub fn allows(&self, name: &str) -> bool {
        !is_always_disallowed(name) && self.whitelist.allows(name) && self.blacklist.allows(name)
    }

    pub fn is_blacklisted(&self, name: &str) -> bool {
        !self.blacklist.allows(name)
    }

    pub fn allows_comments(&self) -> bool {
        self.whitelist.allows_comments()
    }

    pub fn strip<'h>(&self, html: &'h str) -> Cow<'h, str> {
        let mut out = self.raw_blocks.replace_all(html, "");
        out = chain(out, |s| self.office_blocks.replace_all(s, ""));
        if !self.allows_comments() {
            out = chain(out, |s| self.comments.replace_all(s, ""));
        }
        out = chain(out, |s| self.whitelist.strip(s));
        out = chain(out, |s| self.blacklist.strip(s));
        if let Cow::Owned(stripped) = &out {
            log::trace!(target: "editor.whitelist", "stripped {} bytes", html.len() - stripped.len());
        }
        out
    }
}

// Runs one more pass, staying borrowed while nothing changes.
fn chain<'h>(current: Cow<'h, str>, pass: impl FnOnce(&str) -> Cow<'_, str>) -> Cow<'h, str> {
    let changed = match pass(&current) {
        Cow::Owned(next) => Some(next),
        Cow::Borrowed(_) => None,
    };
    changed.map_or(current, Cow::Owned)
}
