//! One-shot build command.

use std::path::PathBuf;

use anyhow::Result;
use quire_static::{BuildMode, BuildResult, StaticBuilder};

use crate::project::Project;

/// Run the build command.
///
/// `output` overrides the project's output directory and is taken relative
/// to the working directory.
pub fn run(project: &Project, output: Option<PathBuf>, mode: BuildMode) -> Result<BuildResult> {
    tracing::info!("Building site ({} mode)...", mode);

    let mut config = project.build_config(mode);
    if let Some(output) = output {
        config.output_dir = output;
    }

    let result = StaticBuilder::new(config).build()?;

    tracing::info!(
        "Built {} pages in {}ms",
        result.pages,
        result.duration_ms
    );
    tracing::info!(
        "Copied {} stylesheets, {} scripts, {} static files",
        result.assets.stylesheets,
        result.assets.scripts,
        result.assets.static_files
    );
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builds_scaffolded_project() {
        let temp = tempdir().unwrap();
        let project_file = temp.path().join("quire.toml");
        crate::commands::init::run(&project_file, false).unwrap();
        let project = Project::load(&project_file).unwrap();

        let result = run(&project, None, BuildMode::Production).unwrap();

        assert_eq!(result.pages, 3);
        assert_eq!(result.assets.stylesheets, 1);
        assert_eq!(result.assets.scripts, 1);
        let index = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
        assert!(index.contains("href=\"/getting-started/\""));
        assert!(index.contains("href=\"/writing-pages/\""));
        assert!(temp.path().join("dist/getting-started/index.html").is_file());
        assert!(temp.path().join("dist/styles/main.css").is_file());
        assert!(temp.path().join("dist/scripts/main.js").is_file());
    }

    #[test]
    fn output_override_wins() {
        let temp = tempdir().unwrap();
        let project_file = temp.path().join("quire.toml");
        crate::commands::init::run(&project_file, false).unwrap();
        let project = Project::load(&project_file).unwrap();
        let elsewhere = temp.path().join("public");

        let result = run(&project, Some(elsewhere.clone()), BuildMode::Development).unwrap();

        assert_eq!(result.output_dir, elsewhere);
        assert!(elsewhere.join("index.html").is_file());
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn missing_site_config_fails() {
        let temp = tempdir().unwrap();
        let project = Project::load(&temp.path().join("quire.toml")).unwrap();

        assert!(run(&project, None, BuildMode::Production).is_err());
        assert!(!temp.path().join("dist").exists());
    }
}
