//! Content document discovery and loading.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use walkdir::WalkDir;

use crate::frontmatter::{extract_frontmatter, Metadata};
use crate::markdown::render_markdown;

/// Sequence position given to documents without an `order` key.
pub const DEFAULT_ORDER: f64 = 99.0;

/// A single Markdown page with its metadata and converted body.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    /// Path segment in the output tree, taken from the file stem
    pub slug: String,

    /// Front matter fields, passed through to templates verbatim
    pub metadata: Metadata,

    /// Markdown body without the front matter
    pub body: String,

    /// Body converted to HTML at load time
    pub html: String,

    /// Effective `order` value
    pub order: f64,

    /// Index in discovery order, used as the tie-breaker when sorting
    pub position: usize,

    /// File the document was read from
    pub source_path: PathBuf,
}

impl ContentDocument {
    /// Parse a document from its source text.
    pub fn parse(path: &Path, source: &str, position: usize) -> Result<Self, ContentError> {
        let (metadata, body) = extract_frontmatter(source).map_err(|e| ContentError::Parse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let order = match metadata.get("order") {
            None | Some(Value::Null) => DEFAULT_ORDER,
            Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_ORDER),
            Some(_) => {
                return Err(ContentError::InvalidOrder {
                    file: path.to_path_buf(),
                })
            }
        };

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ContentError::Parse {
                file: path.to_path_buf(),
                message: "file name is not valid UTF-8".to_string(),
            })?
            .to_string();
        check_slug(&slug).map_err(|message| ContentError::Parse {
            file: path.to_path_buf(),
            message: message.to_string(),
        })?;

        Ok(Self {
            slug,
            html: render_markdown(body),
            body: body.to_string(),
            metadata,
            order,
            position,
            source_path: path.to_path_buf(),
        })
    }

    /// Look up a front matter field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// The `title` field, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }
}

/// A slug must name exactly one directory below the output root.
///
/// Rejects names that resolve to the root itself or its parent, contain a
/// separator, or start with a dot.
fn check_slug(slug: &str) -> Result<(), &'static str> {
    if slug.is_empty() {
        return Err("file name gives an empty slug");
    }
    if slug.starts_with('.') {
        return Err("slug may not start with '.'");
    }
    if slug.contains(['/', '\\']) {
        return Err("slug may not contain a path separator");
    }
    Ok(())
}

/// Load every Markdown document directly inside `dir`, in sequence order.
///
/// Files are discovered in file-name order, which fixes the tie-breaking
/// position of documents sharing the same `order`. Subdirectories are not
/// descended into. The first malformed document aborts the load. Slugs that
/// differ only in case collide, since they share an output directory on
/// case-insensitive filesystems.
pub fn load_documents(dir: &Path) -> Result<Vec<ContentDocument>, ContentError> {
    let mut documents = Vec::new();
    let mut slugs: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ContentError::Read {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();

        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }

        let source = fs::read_to_string(path).map_err(|e| ContentError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = ContentDocument::parse(path, &source, documents.len())?;

        if let Some(first) = slugs.insert(doc.slug.to_lowercase(), path.to_path_buf()) {
            return Err(ContentError::DuplicateSlug {
                slug: doc.slug,
                first,
                second: path.to_path_buf(),
            });
        }

        tracing::debug!("Loaded {} from {}", doc.slug, path.display());
        documents.push(doc);
    }

    sort_documents(&mut documents);

    Ok(documents)
}

/// Sort by `order`, then by discovery position.
pub fn sort_documents(documents: &mut [ContentDocument]) {
    documents.sort_by(|a, b| {
        a.order
            .total_cmp(&b.order)
            .then_with(|| a.position.cmp(&b.position))
    });
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// Errors that can occur when loading content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("Invalid `order` in {}: expected a number", file.display())]
    InvalidOrder { file: PathBuf },

    #[error(
        "Duplicate slug '{slug}': {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl ContentError {
    /// The content file the error refers to.
    pub fn file(&self) -> &Path {
        match self {
            Self::Read { path, .. } => path,
            Self::Parse { file, .. } | Self::InvalidOrder { file } => file,
            Self::DuplicateSlug { second, .. } => second,
        }
    }
}
