//! Content loading for quire.
//!
//! Reads the YAML site configuration and the Markdown pages of a site,
//! splitting front matter from body, converting bodies to HTML and putting
//! the pages in their navigation order.

pub mod config;
pub mod document;
pub mod frontmatter;
pub mod markdown;

pub use config::{ConfigError, SiteConfig};
pub use document::{load_documents, ContentDocument, ContentError, DEFAULT_ORDER};
pub use frontmatter::{FrontmatterError, Metadata};
pub use markdown::render_markdown;
