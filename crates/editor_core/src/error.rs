use thiserror::Error;

/// Setup-time failures. Content problems never surface here; the fixer corrects those.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("[editor.options] invalid tag pattern in {option}: {source}")]
    InvalidTagPattern {
        option: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("[editor.options] invalid attribute pattern in {option} for {tag:?}: {source}")]
    InvalidAttributePattern {
        option: &'static str,
        tag: String,
        #[source]
        source: regex::Error,
    },

    #[error("[editor.options] text tag {tag:?} for {style} is not a text-style element")]
    InvalidTextTag { style: &'static str, tag: String },

    #[error("[editor.options] default line tag {0:?} is not a valid tag name")]
    InvalidDefaultLine(String),

    #[error("[editor.options] could not parse options: {0}")]
    Parse(#[from] toml::de::Error),
}
