//! Template engine for rendering site pages.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use minijinja::{context, AutoEscape, Environment, Error, ErrorKind, Value};

use quire_content::{render_markdown, ContentDocument, SiteConfig};

use crate::mode::BuildMode;

/// Template rendered once for the site root.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Template rendered once per content document.
pub const PAGE_TEMPLATE: &str = "page.html";

/// Values shared by every render call of one build.
///
/// Each page exposes its front matter keys verbatim, plus `slug` and
/// `content` (the pre-rendered body, marked safe).
#[derive(Debug, Clone)]
pub struct SiteContext {
    config: Value,
    pages: Vec<Value>,
    slugs: Vec<String>,
}

impl SiteContext {
    /// Build the shared context from the config and ordered documents.
    pub fn new(config: &SiteConfig, documents: &[ContentDocument]) -> Self {
        Self {
            config: Value::from_serialize(config),
            pages: documents.iter().map(page_value).collect(),
            slugs: documents.iter().map(|d| d.slug.clone()).collect(),
        }
    }

    /// Number of content pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn page_value(doc: &ContentDocument) -> Value {
    let mut fields: BTreeMap<String, Value> = doc
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
        .collect();

    fields.insert("slug".to_string(), Value::from(doc.slug.as_str()));
    fields.insert(
        "content".to_string(),
        Value::from_safe_string(doc.html.clone()),
    );

    Value::from(fields)
}

/// Template engine using minijinja.
///
/// Templates are loaded from a fixed root directory. Every interpolated
/// value is HTML-escaped unless it is already marked safe.
pub struct TemplateEngine {
    env: Environment<'static>,
    mode: BuildMode,
}

impl TemplateEngine {
    /// Create an engine loading templates from `template_root`.
    pub fn new(template_root: impl AsRef<Path>, mode: BuildMode) -> Self {
        let mut env = Self::environment();
        env.set_loader(minijinja::path_loader(template_root.as_ref()));

        Self { env, mode }
    }

    /// Create an engine from in-memory templates.
    pub fn from_templates<I>(templates: I, mode: BuildMode) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env = Self::environment();
        for (name, source) in templates {
            env.add_template_owned(name, source)?;
        }

        Ok(Self { env, mode })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();

        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_filter("markdown", markdown_filter);
        env.add_filter("md", markdown_filter);
        env.add_filter("date", date_filter);

        env
    }

    /// Prepare for a new build.
    ///
    /// In development mode cached templates are dropped so edits on disk are
    /// picked up.
    pub fn begin_build(&mut self) {
        if self.mode.reloads_templates() {
            self.env.clear_templates();
        }
    }

    /// Render the site index.
    pub fn render_index(&self, site: &SiteContext) -> Result<String, RenderError> {
        self.render(
            INDEX_TEMPLATE,
            context! {
                config => &site.config,
                pages => &site.pages,
            },
        )
    }

    /// Render the page for the document at `index` in the site's order.
    pub fn render_page(&self, site: &SiteContext, index: usize) -> Result<String, RenderError> {
        self.render(
            PAGE_TEMPLATE,
            context! {
                config => &site.config,
                pages => &site.pages,
                page => site.pages.get(index),
                current_page => site.slugs.get(index),
            },
        )
    }

    fn render(&self, template: &str, ctx: Value) -> Result<String, RenderError> {
        self.env
            .get_template(template)
            .and_then(|tmpl| tmpl.render(ctx))
            .map_err(|source| RenderError {
                template: template.to_string(),
                source,
            })
    }
}

/// Converts a template-supplied string from Markdown to HTML.
fn markdown_filter(value: Value) -> Value {
    if value.is_undefined() || value.is_none() {
        return Value::from("");
    }

    let source = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };

    Value::from_safe_string(render_markdown(&source))
}

/// Formats an ISO date: `short` gives "Jan 2024", otherwise "January 5, 2024".
fn date_filter(value: Value, format: Option<String>) -> Result<String, Error> {
    let raw = value.as_str().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            "date filter expects a string",
        )
    })?;

    let date = parse_date(raw).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("cannot parse '{raw}' as a date"),
        )
    })?;

    let pattern = match format.as_deref() {
        Some("short") => "%b %Y",
        _ => "%B %-d, %Y",
    };

    Ok(date.format(pattern).to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// A template failed to load or render.
#[derive(Debug, thiserror::Error)]
#[error("Failed to render template {template}: {source:#}")]
pub struct RenderError {
    pub template: String,
    #[source]
    pub source: Error,
}
