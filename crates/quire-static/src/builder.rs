//! Static site builder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use quire_content::{load_documents, ConfigError, ContentDocument, ContentError, SiteConfig};

use crate::assets::{AssetError, AssetPipeline, AssetReport};
use crate::mode::BuildMode;
use crate::output::{OutputWriter, WriteError};
use crate::templates::{RenderError, SiteContext, TemplateEngine};

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Site configuration document (YAML)
    pub config_path: PathBuf,

    /// Directory holding the Markdown pages
    pub pages_dir: PathBuf,

    /// Template root
    pub templates_dir: PathBuf,

    /// Stylesheet copied to `styles/`
    pub stylesheet: PathBuf,

    /// Script copied to `scripts/`
    pub script: PathBuf,

    /// Optional tree mirrored into the output root
    pub static_dir: Option<PathBuf>,

    /// Output directory
    pub output_dir: PathBuf,

    /// Production or development build
    pub mode: BuildMode,
}

impl BuildConfig {
    /// Default layout below a project root.
    pub fn with_root(root: &Path) -> Self {
        Self {
            config_path: root.join("content/config.yaml"),
            pages_dir: root.join("content/pages"),
            templates_dir: root.join("app/templates"),
            stylesheet: root.join("app/styles/main.css"),
            script: root.join("app/scripts/main.js"),
            static_dir: Some(root.join("app/static")),
            output_dir: root.join("dist"),
            mode: BuildMode::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::with_root(Path::new(""))
    }
}

/// Stages of a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Idle,
    LoadingConfig,
    LoadingContent,
    Rendering,
    WritingOutput,
    CopyingAssets,
    Done,
    Failed,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LoadingConfig => "loading config",
            Self::LoadingContent => "loading content",
            Self::Rendering => "rendering",
            Self::WritingOutput => "writing output",
            Self::CopyingAssets => "copying assets",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A page ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Path relative to the output root
    pub output_path: PathBuf,

    /// Complete HTML document
    pub html: String,
}

/// Output path for the page of a document.
pub fn page_output_path(slug: &str) -> PathBuf {
    Path::new(slug).join("index.html")
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated, including the index
    pub pages: usize,

    /// Files copied per asset group
    pub assets: AssetReport,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    TemplateRender(#[from] RenderError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    AssetCopy(#[from] AssetError),
}

/// Static site builder.
///
/// Owns the template engine for its whole lifetime. Every call to
/// [`StaticBuilder::build`] is a full rebuild: config and content are read
/// again and every page is rendered and written.
pub struct StaticBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
    stage: BuildStage,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig) -> Self {
        let templates = TemplateEngine::new(&config.templates_dir, config.mode);

        Self {
            config,
            templates,
            stage: BuildStage::Idle,
        }
    }

    /// Build configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Stage reached by the most recent build.
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Build the static site.
    pub fn build(&mut self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        self.stage = BuildStage::Idle;

        match self.run(start) {
            Ok(result) => {
                self.enter(BuildStage::Done);
                Ok(result)
            }
            Err(e) => {
                tracing::debug!("Build failed while {}", self.stage);
                self.enter(BuildStage::Failed);
                Err(e)
            }
        }
    }

    fn enter(&mut self, stage: BuildStage) {
        tracing::debug!("Build stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn run(&mut self, start: Instant) -> Result<BuildResult, BuildError> {
        self.templates.begin_build();

        self.enter(BuildStage::LoadingConfig);
        let site_config = SiteConfig::load(&self.config.config_path)?;

        self.enter(BuildStage::LoadingContent);
        let documents = load_documents(&self.config.pages_dir)?;
        tracing::info!("Loaded {} content documents", documents.len());

        self.enter(BuildStage::Rendering);
        let site = SiteContext::new(&site_config, &documents);
        let pages = self.render_pages(&site, &documents)?;

        self.enter(BuildStage::WritingOutput);
        let writer = OutputWriter::new(&self.config.output_dir);
        write_pages(&writer, &pages)?;

        self.enter(BuildStage::CopyingAssets);
        let assets = AssetPipeline::new(
            &self.config.stylesheet,
            &self.config.script,
            self.config.static_dir.clone(),
            self.config.mode,
        )
        .copy(&writer)?;

        Ok(BuildResult {
            pages: pages.len(),
            assets,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Render the index followed by one page per document, in order.
    fn render_pages(
        &self,
        site: &SiteContext,
        documents: &[ContentDocument],
    ) -> Result<Vec<RenderedPage>, BuildError> {
        let mut pages = Vec::with_capacity(documents.len() + 1);

        pages.push(RenderedPage {
            output_path: PathBuf::from("index.html"),
            html: self.templates.render_index(site)?,
        });

        for (index, doc) in documents.iter().enumerate() {
            pages.push(RenderedPage {
                output_path: page_output_path(&doc.slug),
                html: self.templates.render_page(site, index)?,
            });
        }

        Ok(pages)
    }
}

/// Write pages in parallel, reporting the first failure in page order.
fn write_pages(writer: &OutputWriter, pages: &[RenderedPage]) -> Result<(), WriteError> {
    let results: Vec<Result<PathBuf, WriteError>> = pages
        .par_iter()
        .map(|page| writer.write(&page.output_path, &page.html))
        .collect();

    for result in results {
        let path = result?;
        tracing::info!("Wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use walkdir::WalkDir;

    const INDEX: &str = "<h1>{{ config.title }}</h1>\
        <ul>{% for p in pages %}<li>{{ p.title }}</li>{% endfor %}</ul>";

    const PAGE: &str = "<title>{{ page.title }} - {{ config.title }}</title>\
        <nav>{% for p in pages %}<a href=\"/{{ p.slug }}/\"{% if p.slug == current_page %} class=\"active\"{% endif %}>{{ p.title }}</a>{% endfor %}</nav>\
        <main>{{ page.content }}</main>";

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> (TempDir, BuildConfig) {
        let temp = tempdir().unwrap();
        let root = temp.path();

        write(root, "content/config.yaml", "title: Field Guide\n");
        write(
            root,
            "content/pages/a.md",
            "---\ntitle: Alpha\n---\n# Alpha page\n",
        );
        write(
            root,
            "content/pages/b.md",
            "---\ntitle: Bravo\norder: 1\n---\n# Bravo page\n",
        );
        write(root, "app/templates/index.html", INDEX);
        write(root, "app/templates/page.html", PAGE);
        write(root, "app/styles/main.css", "body { margin: 0; }\n");
        write(root, "app/scripts/main.js", "console.log('ready');\n");

        let config = BuildConfig::with_root(root);
        (temp, config)
    }

    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    #[test]
    fn builds_simple_site() {
        let (temp, config) = site();
        let out = config.output_dir.clone();

        let mut builder = StaticBuilder::new(config);
        let result = builder.build().unwrap();

        assert_eq!(result.pages, 3);
        assert_eq!(builder.stage(), BuildStage::Done);
        assert!(out.join("index.html").is_file());
        assert!(out.join("a/index.html").is_file());
        assert!(out.join("b/index.html").is_file());
        assert!(out.join("styles/main.css").is_file());
        assert!(out.join("scripts/main.js").is_file());
        drop(temp);
    }

    #[test]
    fn orders_pages_in_navigation() {
        let (_temp, config) = site();
        let out = config.output_dir.clone();

        StaticBuilder::new(config).build().unwrap();

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert_eq!(
            index,
            "<h1>Field Guide</h1><ul><li>Bravo</li><li>Alpha</li></ul>"
        );

        let page = fs::read_to_string(out.join("a/index.html")).unwrap();
        assert!(page.contains("<title>Alpha - Field Guide</title>"));
        assert!(page.contains("<a href=\"/a/\" class=\"active\">Alpha</a>"));
        assert!(page.contains("<h1>Alpha page</h1>"));
    }

    #[test]
    fn page_count_is_documents_plus_index() {
        let (temp, config) = site();
        for i in 0..5 {
            write(temp.path(), &format!("content/pages/extra-{i}.md"), "# Extra");
        }

        let result = StaticBuilder::new(config).build().unwrap();

        assert_eq!(result.pages, 7 + 1);
    }

    #[test]
    fn builds_index_for_empty_content() {
        let (temp, config) = site();
        fs::remove_file(temp.path().join("content/pages/a.md")).unwrap();
        fs::remove_file(temp.path().join("content/pages/b.md")).unwrap();

        let result = StaticBuilder::new(config).build().unwrap();

        assert_eq!(result.pages, 1);
    }

    #[test]
    fn repeated_builds_are_byte_identical() {
        let (_temp, config) = site();
        let out = config.output_dir.clone();

        let mut builder = StaticBuilder::new(config.clone());
        builder.build().unwrap();
        let first = snapshot(&out);

        fs::remove_dir_all(&out).unwrap();
        StaticBuilder::new(config).build().unwrap();
        let second = snapshot(&out);

        assert_eq!(first, second);
    }

    #[test]
    fn missing_static_directory_is_tolerated() {
        let (_temp, config) = site();

        let result = StaticBuilder::new(config).build().unwrap();

        assert_eq!(result.assets.static_files, 0);
        assert_eq!(result.assets.stylesheets, 1);
        assert_eq!(result.assets.scripts, 1);
    }

    #[test]
    fn copies_static_tree() {
        let (temp, config) = site();
        write(temp.path(), "app/static/robots.txt", "User-agent: *\n");
        write(temp.path(), "app/static/img/logo.svg", "<svg/>");
        let out = config.output_dir.clone();

        let result = StaticBuilder::new(config).build().unwrap();

        assert_eq!(result.assets.static_files, 2);
        assert!(out.join("robots.txt").is_file());
        assert!(out.join("img/logo.svg").is_file());
    }

    #[test]
    fn malformed_config_writes_nothing() {
        let (temp, config) = site();
        write(temp.path(), "content/config.yaml", "title: [broken\n");
        let out = config.output_dir.clone();

        let mut builder = StaticBuilder::new(config);
        let err = builder.build().unwrap_err();

        assert!(matches!(err, BuildError::Config(ConfigError::Parse { .. })));
        assert_eq!(builder.stage(), BuildStage::Failed);
        assert!(!out.exists());
    }

    #[test]
    fn missing_config_is_not_found() {
        let (temp, config) = site();
        fs::remove_file(temp.path().join("content/config.yaml")).unwrap();

        let err = StaticBuilder::new(config).build().unwrap_err();

        assert!(matches!(err, BuildError::Config(ConfigError::NotFound(_))));
    }

    #[test]
    fn malformed_document_aborts_before_writing() {
        let (temp, config) = site();
        write(temp.path(), "content/pages/c.md", "---\ntitle: [oops\n");
        let out = config.output_dir.clone();

        let err = StaticBuilder::new(config).build().unwrap_err();

        match err {
            BuildError::Content(e) => assert_eq!(e.file(), temp.path().join("content/pages/c.md")),
            other => panic!("expected content error, got {other}"),
        }
        assert!(!out.exists());
    }

    #[test]
    fn template_error_names_the_template() {
        let (temp, config) = site();
        write(temp.path(), "app/templates/page.html", "{% for %}");

        let err = StaticBuilder::new(config).build().unwrap_err();

        match err {
            BuildError::TemplateRender(e) => assert_eq!(e.template, "page.html"),
            other => panic!("expected template error, got {other}"),
        }
    }

    #[test]
    fn rebuild_regenerates_every_page() {
        let (temp, config) = site();
        let out = config.output_dir.clone();
        let mut builder = StaticBuilder::new(config);
        builder.build().unwrap();

        write(
            temp.path(),
            "content/pages/a.md",
            "---\ntitle: Alpha Revised\n---\n# Alpha page\n",
        );
        let result = builder.build().unwrap();

        assert_eq!(result.pages, 3);
        let untouched = fs::read_to_string(out.join("b/index.html")).unwrap();
        assert!(untouched.contains(">Alpha Revised</a>"));
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains("<li>Alpha Revised</li>"));
    }

    #[test]
    fn development_mode_reloads_templates() {
        let (temp, mut config) = site();
        config.mode = BuildMode::Development;
        let out = config.output_dir.clone();
        let mut builder = StaticBuilder::new(config);
        builder.build().unwrap();

        write(temp.path(), "app/templates/index.html", "<p>edited</p>");
        builder.build().unwrap();

        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            "<p>edited</p>"
        );
    }

    #[test]
    fn production_mode_caches_templates() {
        let (temp, config) = site();
        let out = config.output_dir.clone();
        let mut builder = StaticBuilder::new(config);
        builder.build().unwrap();

        write(temp.path(), "app/templates/index.html", "<p>edited</p>");
        builder.build().unwrap();

        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.starts_with("<h1>Field Guide</h1>"));
    }

    #[test]
    fn dot_named_pages_never_write_outside_output() {
        let (temp, config) = site();
        let out = config.output_dir.clone();
        write(temp.path(), "content/pages/...md", "---\ntitle: Escape\n---\n");
        write(temp.path(), "content/pages/..md", "---\ntitle: Dot\n---\n");

        let mut builder = StaticBuilder::new(config);
        let err = builder.build().unwrap_err();

        assert!(matches!(err, BuildError::Content(ContentError::Parse { .. })));
        assert_eq!(builder.stage(), BuildStage::Failed);
        assert!(!temp.path().join("index.html").exists());
        assert!(!out.exists());
    }
}
