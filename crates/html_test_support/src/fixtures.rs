//! Golden fixer cases stored as TOML or JSON manifests.
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const FIXER_CASES_FORMAT_V1: &str = "editor-fixer-cases-v1";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
struct FixerManifest {
    format: String,
    cases: Vec<FixerCase>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixerCase {
    pub id: String,
    pub input: String,
    pub expected: String,
    /// Extra element whitelist for this case.
    #[serde(default)]
    pub whitelist: Option<String>,
    #[serde(default)]
    pub blacklist: Option<String>,
    /// Wrap top-level inline runs in default lines.
    #[serde(default)]
    pub require_format: bool,
}

/// Load a manifest, panicking with the path on any problem. The format is picked by file
/// extension (`.toml` or `.json`).
pub fn load_fixer_cases(path: &Path) -> Vec<FixerCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read fixer cases {path:?}: {err}"));
    let manifest: FixerManifest = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse fixer cases TOML {path:?}: {err}")),
        Some("json") => serde_json::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse fixer cases JSON {path:?}: {err}")),
        other => panic!("unsupported fixer case extension {other:?} for {path:?}"),
    };
    assert_eq!(
        manifest.format, FIXER_CASES_FORMAT_V1,
        "unsupported fixer case manifest format in {path:?}"
    );
    let mut seen = BTreeSet::new();
    for case in &manifest.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate fixer case id in {path:?}: {}",
            case.id
        );
    }
    manifest.cases
}
