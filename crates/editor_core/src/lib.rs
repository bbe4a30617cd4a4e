//! Normalization engine for a contenteditable rich-text surface.
//!
//! Nodes are classified into roles ([`classify`]), walked within the editable root
//! ([`query`]), addressed by child-index paths ([`path`]), merged with path remapping
//! ([`merge`]) and repaired structurally ([`fixer`]); [`elements`] filters attributes and
//! renames text-style tags. [`Normalizer`] bundles the compiled filters with those passes;
//! [`editable::Editable`] is an editing surface built on it.
pub mod classify;
pub mod editable;
pub mod elements;
pub mod error;
pub mod fixer;
pub mod merge;
pub mod options;
pub mod path;
pub mod query;
pub mod unicode;
pub mod whitelist;

pub use crate::editable::{Caret, Editable, SavedSelection, Selection};
pub use crate::elements::AttributePolicy;
pub use crate::error::ConfigError;
pub use crate::fixer::{Violation, ViolationKind};
pub use crate::options::{Options, ResolvedOptions, TextTags};
pub use crate::path::{NodePath, TextMerge};
pub use crate::whitelist::{TagFilter, TagPolicy, build_whitelist_pattern};

use html::{Dom, NodeId};
use std::borrow::Cow;

/// Resolved options and compiled filters, built once and shared by every pass.
#[derive(Clone, Debug)]
pub struct Normalizer {
    options: ResolvedOptions,
    policy: TagPolicy,
    attributes: AttributePolicy,
}

impl Normalizer {
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        let options = options.resolve()?;
        let policy = TagPolicy::new(&options.whitelist, &options.blacklist)?;
        let attributes =
            AttributePolicy::new(&options.attribute_whitelist, &options.attribute_blacklist)?;
        log::debug!(
            target: "editor.options",
            "normalizer ready: default line <{}>, {} whitelisted, {} blacklisted",
            options.default_line,
            options.whitelist.split('|').count(),
            options.blacklist.split('|').filter(|t| !t.is_empty()).count()
        );
        Ok(Self {
            options,
            policy,
            attributes,
        })
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn policy(&self) -> &TagPolicy {
        &self.policy
    }

    pub fn default_line(&self) -> &str {
        &self.options.default_line
    }

    pub fn attributes(&self) -> &AttributePolicy {
        &self.attributes
    }

    /// Repair `root`'s subtree in place. Returns the number of fixes applied.
    pub fn fix_structure(&self, dom: &mut Dom, root: NodeId) -> usize {
        fixer::fix_structure(dom, root, &self.policy, &self.options.default_line)
    }

    /// Report violations under `root` without changing anything.
    pub fn check_structure(&self, dom: &Dom, root: NodeId) -> Vec<Violation> {
        fixer::collect_violations(dom, root, &self.policy)
    }

    /// Drop attributes the attribute lists reject from every element under `root`.
    pub fn filter_attributes(&self, dom: &mut Dom, root: NodeId) {
        elements::filter_attributes(dom, root, &self.attributes);
    }

    /// Rename text-style elements (`b`, `i`, `strike`, ...) to the configured text tags.
    pub fn convert_style_tags(&self, dom: &mut Dom, root: NodeId) -> usize {
        elements::convert_style_tags(dom, root, &self.options.style_tags)
    }

    /// Every tree-level pass on a freshly parsed `root`: attributes first, since classes
    /// decide roles, then structure, then tag renames. Returns the structural fix count.
    pub fn normalize_tree(&self, dom: &mut Dom, root: NodeId) -> usize {
        self.filter_attributes(dom, root);
        let fixes = self.fix_structure(dom, root);
        self.convert_style_tags(dom, root);
        fixes
    }

    /// Textual pre-filter: drops script and style blocks, Office markup, disallowed comments
    /// and tags outside the whitelist or inside the blacklist.
    pub fn strip_disallowed<'h>(&self, html: &'h str) -> Cow<'h, str> {
        self.policy.strip(html)
    }

    /// Strip, parse, normalize and serialize `html`. With `require_format`, top-level
    /// inline runs are wrapped in default lines.
    pub fn clean(&self, html: &str, require_format: bool) -> String {
        let stripped = self.strip_disallowed(html);
        let mut dom = html::parse_fragment(&stripped);
        let root = dom.document();
        self.normalize_tree(&mut dom, root);
        if require_format {
            if let Err(err) = fixer::wrap_orphan_inline(&mut dom, root, self.default_line()) {
                log::debug!(target: "editor.fixer", "orphan wrap skipped: {err}");
            }
        }
        html::inner_html(&dom, root)
    }
}
