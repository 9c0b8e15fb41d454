//! Front matter extraction and parsing.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

/// Key/value metadata parsed from a front matter block.
pub type Metadata = BTreeMap<String, Value>;

/// Opening `---` line, YAML block, closing `---` line.
static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)??---[ \t]*(?:\r?\n|\z)")
        .expect("front matter pattern is valid")
});

static OPENING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A---[ \t]*(?:\r?\n|\z)").expect("opening pattern is valid"));

/// Split a document into its metadata and the remaining body.
///
/// A document without a leading `---` line has no metadata and the whole
/// source is returned as the body.
pub fn extract_frontmatter(source: &str) -> Result<(Metadata, &str), FrontmatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    if !OPENING.is_match(source) {
        return Ok((Metadata::new(), source));
    }

    let Some(captures) = FRONTMATTER.captures(source) else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = &source[captures.get(0).map_or(0, |m| m.end())..];

    Ok((parse_metadata(yaml)?, body))
}

/// Parse a YAML block into metadata. An empty block yields empty metadata.
pub fn parse_metadata(yaml: &str) -> Result<Metadata, FrontmatterError> {
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    match value {
        Value::Null => Ok(Metadata::new()),
        Value::Mapping(_) => serde_yaml::from_value(value)
            .map_err(|e| FrontmatterError::InvalidYaml(e.to_string())),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),

    #[error("Front matter must be a mapping of keys to values")]
    NotAMapping,
}
