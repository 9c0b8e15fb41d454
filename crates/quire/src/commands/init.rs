//! Scaffold a starter site.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::project::project_root;

/// Files written by `quire init`, relative to the project directory.
const SCAFFOLD: &[(&str, &str)] = &[
    ("content/config.yaml", DEFAULT_SITE_CONFIG),
    ("content/pages/getting-started.md", DEFAULT_GETTING_STARTED),
    ("content/pages/writing-pages.md", DEFAULT_WRITING_PAGES),
    ("app/templates/base.html", DEFAULT_BASE_TEMPLATE),
    ("app/templates/index.html", DEFAULT_INDEX_TEMPLATE),
    ("app/templates/page.html", DEFAULT_PAGE_TEMPLATE),
    ("app/styles/main.css", DEFAULT_STYLESHEET),
    ("app/scripts/main.js", DEFAULT_SCRIPT),
    ("app/static/robots.txt", DEFAULT_ROBOTS),
];

/// Run the init command.
///
/// Existing files are left alone unless `yes` is set.
pub fn run(project_file: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing quire...");

    let root = project_root(project_file)?;
    let mut skipped = 0;

    if write_file(project_file, DEFAULT_PROJECT, yes)? {
        tracing::info!("Created {}", project_file.display());
    } else {
        skipped += 1;
    }

    for (relative, content) in SCAFFOLD {
        if write_file(&root.join(relative), content, yes)? {
            tracing::info!("Created {}", relative);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::warn!("Kept {} existing files. Use --yes to overwrite.", skipped);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'quire dev' to start the development server.");

    Ok(())
}

/// Write `content` to `path`. Returns false if the file exists and
/// `overwrite` is not set.
fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        tracing::debug!("Skipping existing {}", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(true)
}

const DEFAULT_PROJECT: &str = r#"# Quire project

[paths]
config = "content/config.yaml"
pages = "content/pages"
templates = "app/templates"
stylesheet = "app/styles/main.css"
script = "app/scripts/main.js"
static = "app/static"
output = "dist"

[dev]
port = 3000
host = "127.0.0.1"
open = true
watch = ["app", "content"]
# Run your own preview server instead of the built-in one
# preview_command = "npx vite dist"
"#;

const DEFAULT_SITE_CONFIG: &str = r#"title: My Site
description: |
  A site built with **quire**. Edit `content/config.yaml` to change this text.
footer: Built with [quire](https://github.com/quire-site/quire).
"#;

const DEFAULT_GETTING_STARTED: &str = r#"---
title: Getting Started
summary: Where everything lives.
order: 1
---

Pages live in `content/pages/`. Each Markdown file becomes one page, and its
file name becomes the URL: this page is served at `/getting-started/`.

## Project layout

```
content/
  config.yaml      # site settings, available as `config` in templates
  pages/           # one Markdown file per page
app/
  templates/       # index.html and page.html
  styles/main.css
  scripts/main.js
  static/          # copied to the site root as-is
quire.toml         # where all of the above lives
```

## Commands

- `quire dev` builds the site, serves it and rebuilds on every change.
- `quire build` writes the finished site to `dist/`.
"#;

const DEFAULT_WRITING_PAGES: &str = r#"---
title: Writing Pages
summary: Front matter, ordering and Markdown.
order: 2
updated: 2024-05-01
---

Every page may start with a front matter block:

```yaml
---
title: Writing Pages
order: 2
---
```

Any key you add is available to templates on `page`. Pages are listed by
`order`, lowest first; pages without one go last.

| Feature       | Supported |
| ------------- | --------- |
| Tables        | yes       |
| ~~Strikeout~~ | yes       |
| Footnotes     | yes[^1]   |

- [x] Task lists
- [ ] Your first page

[^1]: Like this one.
"#;

const DEFAULT_BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% block title %}{{ config.title }}{% endblock %}</title>
  <link rel="stylesheet" href="/styles/main.css">
</head>
<body>
  <nav>
    <a class="home" href="/">{{ config.title }}</a>
    <ul>
      {%- for p in pages %}
      <li><a href="/{{ p.slug }}/"{% if p.slug == current_page %} aria-current="page"{% endif %}>{{ p.title }}</a></li>
      {%- endfor %}
    </ul>
  </nav>
  <main>
    {% block content %}{% endblock %}
  </main>
  <footer>{{ config.footer | markdown }}</footer>
  <script src="/scripts/main.js"></script>
</body>
</html>
"#;

const DEFAULT_INDEX_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block content %}
<h1>{{ config.title }}</h1>
{{ config.description | markdown }}
<ul class="pages">
  {%- for p in pages %}
  <li><a href="/{{ p.slug }}/">{{ p.title }}</a>{% if p.summary %}: {{ p.summary }}{% endif %}</li>
  {%- endfor %}
</ul>
{% endblock %}
"#;

const DEFAULT_PAGE_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}{{ page.title }} | {{ config.title }}{% endblock %}
{% block content %}
<article>
  <h1>{{ page.title }}</h1>
  {%- if page.updated %}
  <p class="updated">Updated {{ page.updated | date }}</p>
  {%- endif %}
  {{ page.content }}
</article>
{% endblock %}
"#;

const DEFAULT_STYLESHEET: &str = r#":root {
  font-family: system-ui, sans-serif;
  line-height: 1.6;
  color: #1f2328;
}

body {
  display: grid;
  grid-template-columns: 14rem 1fr;
  gap: 2rem;
  max-width: 60rem;
  margin: 0 auto;
  padding: 2rem 1rem;
}

nav ul {
  list-style: none;
  padding: 0;
}

nav a[aria-current="page"] {
  font-weight: 600;
}

footer {
  grid-column: 1 / -1;
  font-size: 0.875rem;
  color: #59636e;
}
"#;

const DEFAULT_SCRIPT: &str = r#"document.querySelectorAll("main a[href^='http']").forEach((link) => {
  link.target = "_blank";
  link.rel = "noopener";
});
"#;

const DEFAULT_ROBOTS: &str = "User-agent: *\nAllow: /\n";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn scaffolds_every_file() {
        let temp = tempdir().unwrap();

        run(&temp.path().join("quire.toml"), false).unwrap();

        assert!(temp.path().join("quire.toml").is_file());
        for (relative, content) in SCAFFOLD {
            let written = fs::read_to_string(temp.path().join(relative)).unwrap();
            assert_eq!(&written, content, "{relative}");
        }
    }

    #[test]
    fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("content/config.yaml");
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(&config, "title: Mine\n").unwrap();

        run(&temp.path().join("quire.toml"), false).unwrap();

        assert_eq!(fs::read_to_string(&config).unwrap(), "title: Mine\n");
        assert!(temp.path().join("app/templates/page.html").is_file());
    }

    #[test]
    fn yes_overwrites_existing_files() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("content/config.yaml");
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(&config, "title: Mine\n").unwrap();

        run(&temp.path().join("quire.toml"), true).unwrap();

        assert_eq!(fs::read_to_string(&config).unwrap(), DEFAULT_SITE_CONFIG);
    }

    #[test]
    fn project_file_parses() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quire.toml");

        run(&path, false).unwrap();

        let project = crate::project::Project::load(&path).unwrap();
        assert_eq!(project.dev().port, 3000);
        assert_eq!(project.output_dir(), temp.path().join("dist"));
    }
}
