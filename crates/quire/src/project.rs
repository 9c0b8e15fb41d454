//! Project file (`quire.toml`) loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quire_static::{BuildConfig, BuildMode};
use serde::Deserialize;

/// Configuration file structure (quire.toml).
#[derive(Debug, Deserialize, Default)]
struct ProjectFile {
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    dev: DevConfig,
}

/// Source and output locations, relative to the project file.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct PathsConfig {
    config: PathBuf,
    pages: PathBuf,
    templates: PathBuf,
    stylesheet: PathBuf,
    script: PathBuf,
    #[serde(rename = "static")]
    static_dir: PathBuf,
    output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config: PathBuf::from("content/config.yaml"),
            pages: PathBuf::from("content/pages"),
            templates: PathBuf::from("app/templates"),
            stylesheet: PathBuf::from("app/styles/main.css"),
            script: PathBuf::from("app/scripts/main.js"),
            static_dir: PathBuf::from("app/static"),
            output: PathBuf::from("dist"),
        }
    }
}

/// Settings for `quire dev` and `quire serve`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub port: u16,
    pub host: String,
    pub open: bool,
    pub watch: Vec<PathBuf>,

    /// Replaces the built-in preview server; split on whitespace
    pub preview_command: Option<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
            watch: vec![PathBuf::from("app"), PathBuf::from("content")],
            preview_command: None,
        }
    }
}

/// A loaded project: its settings plus the directory they are relative to.
#[derive(Debug)]
pub struct Project {
    path: PathBuf,
    root: PathBuf,
    file: ProjectFile,
}

impl Project {
    /// Load the project file at `path`.
    ///
    /// A missing file yields the default layout rooted next to where it
    /// would be. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let root = project_root(path)?;

        let file = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file: ProjectFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::debug!("Loaded project from {}", path.display());
            file
        } else {
            tracing::debug!("No {} found, using defaults", path.display());
            ProjectFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            root,
            file,
        })
    }

    /// Path the project was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the project file.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dev(&self) -> &DevConfig {
        &self.file.dev
    }

    /// Resolve a project-relative path. Absolute paths are kept as they are.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.file.paths.output)
    }

    pub fn watch_paths(&self) -> Vec<PathBuf> {
        self.file.dev.watch.iter().map(|p| self.resolve(p)).collect()
    }

    /// Build settings with every path resolved.
    pub fn build_config(&self, mode: BuildMode) -> BuildConfig {
        let paths = &self.file.paths;

        BuildConfig {
            config_path: self.resolve(&paths.config),
            pages_dir: self.resolve(&paths.pages),
            templates_dir: self.resolve(&paths.templates),
            stylesheet: self.resolve(&paths.stylesheet),
            script: self.resolve(&paths.script),
            static_dir: Some(self.resolve(&paths.static_dir)),
            output_dir: self.output_dir(),
            mode,
        }
    }
}

/// Absolute directory of the project file.
pub fn project_root(path: &Path) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::path::absolute(dir)
        .with_context(|| format!("Failed to resolve project directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_default_layout() {
        let temp = tempdir().unwrap();

        let project = Project::load(&temp.path().join("quire.toml")).unwrap();
        let config = project.build_config(BuildMode::Production);

        assert_eq!(config.config_path, temp.path().join("content/config.yaml"));
        assert_eq!(config.pages_dir, temp.path().join("content/pages"));
        assert_eq!(config.static_dir, Some(temp.path().join("app/static")));
        assert_eq!(config.output_dir, temp.path().join("dist"));
        assert_eq!(project.dev().port, 3000);
        assert_eq!(
            project.watch_paths(),
            vec![temp.path().join("app"), temp.path().join("content")]
        );
    }

    #[test]
    fn paths_resolve_against_project_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("site/quire.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "[paths]\npages = \"docs\"\noutput = \"public\"\n\n[dev]\nport = 8080\npreview_command = \"npx vite\"\n",
        )
        .unwrap();

        let project = Project::load(&path).unwrap();
        let config = project.build_config(BuildMode::Development);

        assert_eq!(config.pages_dir, temp.path().join("site/docs"));
        assert_eq!(config.output_dir, temp.path().join("site/public"));
        assert_eq!(config.templates_dir, temp.path().join("site/app/templates"));
        assert_eq!(config.mode, BuildMode::Development);
        assert_eq!(project.dev().port, 8080);
        assert_eq!(project.dev().host, "127.0.0.1");
        assert_eq!(project.dev().preview_command.as_deref(), Some("npx vite"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quire.toml");
        fs::write(&path, "[dev]\nport = \"many\"\n").unwrap();

        let err = Project::load(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn bare_file_name_resolves_to_current_directory() {
        let root = project_root(Path::new("quire.toml")).unwrap();

        assert!(root.is_absolute());
    }
}
