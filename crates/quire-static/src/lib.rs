//! Static site generator for quire.
//!
//! Renders the site's Markdown pages through minijinja templates, writes the
//! resulting HTML tree and copies the stylesheet, script and static files
//! next to it.

pub mod assets;
pub mod builder;
pub mod mode;
pub mod output;
pub mod templates;

pub use assets::{AssetError, AssetPipeline, AssetReport};
pub use builder::{
    page_output_path, BuildConfig, BuildError, BuildResult, BuildStage, RenderedPage,
    StaticBuilder,
};
pub use mode::BuildMode;
pub use output::{OutputWriter, WriteError};
pub use templates::{RenderError, SiteContext, TemplateEngine, INDEX_TEMPLATE, PAGE_TEMPLATE};
