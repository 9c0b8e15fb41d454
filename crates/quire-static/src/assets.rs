//! Asset pipeline: copies the stylesheet, script and static files.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::mode::BuildMode;
use crate::output::{OutputWriter, WriteError};

/// Destination directory for the stylesheet.
pub const STYLES_DIR: &str = "styles";

/// Destination directory for the script.
pub const SCRIPTS_DIR: &str = "scripts";

/// Number of files copied for each asset group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetReport {
    pub stylesheets: usize,
    pub scripts: usize,
    pub static_files: usize,
    pub source_maps: usize,
}

impl AssetReport {
    /// Total number of files copied.
    pub fn total(&self) -> usize {
        self.stylesheets + self.scripts + self.static_files + self.source_maps
    }
}

/// Copies assets into the output tree unmodified.
#[derive(Debug, Clone)]
pub struct AssetPipeline {
    stylesheet: PathBuf,
    script: PathBuf,
    static_dir: Option<PathBuf>,
    mode: BuildMode,
}

impl AssetPipeline {
    /// Create a pipeline for the given sources.
    pub fn new(
        stylesheet: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        static_dir: Option<PathBuf>,
        mode: BuildMode,
    ) -> Self {
        Self {
            stylesheet: stylesheet.into(),
            script: script.into(),
            static_dir,
            mode,
        }
    }

    /// Copy every asset group, returning how many files each produced.
    pub fn copy(&self, writer: &OutputWriter) -> Result<AssetReport, AssetError> {
        let mut report = AssetReport::default();

        report.source_maps += self.copy_single(writer, &self.stylesheet, STYLES_DIR)?;
        report.stylesheets = 1;

        report.source_maps += self.copy_single(writer, &self.script, SCRIPTS_DIR)?;
        report.scripts = 1;

        report.static_files = self.copy_static(writer)?;

        Ok(report)
    }

    /// Copy one file into `dir`, plus its source map in development mode.
    ///
    /// Returns the number of source maps copied.
    fn copy_single(
        &self,
        writer: &OutputWriter,
        source: &Path,
        dir: &str,
    ) -> Result<usize, AssetError> {
        let file_name = source.file_name().ok_or_else(|| AssetError {
            path: source.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "asset path has no file name"),
        })?;
        let relative = Path::new(dir).join(file_name);

        copy_file(writer, source, &relative)?;
        tracing::info!("Copied {}", relative.display());

        if !self.mode.emits_source_maps() {
            return Ok(0);
        }

        let mut map_name = file_name.to_os_string();
        map_name.push(".map");
        let map_source = source.with_file_name(&map_name);

        if !map_source.is_file() {
            return Ok(0);
        }

        let map_relative = Path::new(dir).join(&map_name);
        copy_file(writer, &map_source, &map_relative)?;
        tracing::debug!("Copied source map {}", map_relative.display());

        Ok(1)
    }

    /// Mirror the static directory into the output root.
    fn copy_static(&self, writer: &OutputWriter) -> Result<usize, AssetError> {
        let Some(static_dir) = self.static_dir.as_deref().filter(|d| d.is_dir()) else {
            tracing::info!("No static directory, copied 0 static files");
            return Ok(0);
        };

        let mut count = 0;

        for entry in WalkDir::new(static_dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| AssetError {
                path: e.path().unwrap_or(static_dir).to_path_buf(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(static_dir)
                .unwrap_or(entry.path());
            copy_file(writer, entry.path(), relative)?;
            count += 1;
        }

        tracing::info!("Copied {} static files", count);

        Ok(count)
    }
}

fn copy_file(writer: &OutputWriter, source: &Path, relative: &Path) -> Result<(), AssetError> {
    writer
        .copy(source, relative)
        .map(drop)
        .map_err(|WriteError { source: err, .. }| AssetError {
            path: source.to_path_buf(),
            source: err,
        })
}

/// An asset could not be copied.
#[derive(Debug, thiserror::Error)]
#[error("Failed to copy asset {}: {source}", path.display())]
pub struct AssetError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        temp: TempDir,
        writer: OutputWriter,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempdir().unwrap();
            fs::create_dir_all(temp.path().join("app/styles")).unwrap();
            fs::create_dir_all(temp.path().join("app/scripts")).unwrap();
            fs::write(temp.path().join("app/styles/main.css"), "body{}").unwrap();
            fs::write(temp.path().join("app/styles/main.css.map"), "{}").unwrap();
            fs::write(temp.path().join("app/scripts/main.js"), "init();").unwrap();
            let writer = OutputWriter::new(temp.path().join("dist"));
            Self { temp, writer }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.temp.path().join(relative)
        }

        fn pipeline(&self, mode: BuildMode) -> AssetPipeline {
            AssetPipeline::new(
                self.path("app/styles/main.css"),
                self.path("app/scripts/main.js"),
                Some(self.path("app/static")),
                mode,
            )
        }
    }

    #[test]
    fn copies_stylesheet_and_script_unmodified() {
        let fx = Fixture::new();

        let report = fx.pipeline(BuildMode::Production).copy(&fx.writer).unwrap();

        assert_eq!(report.stylesheets, 1);
        assert_eq!(report.scripts, 1);
        assert_eq!(
            fs::read_to_string(fx.path("dist/styles/main.css")).unwrap(),
            "body{}"
        );
        assert_eq!(
            fs::read_to_string(fx.path("dist/scripts/main.js")).unwrap(),
            "init();"
        );
    }

    #[test]
    fn missing_static_directory_copies_nothing() {
        let fx = Fixture::new();

        let report = fx.pipeline(BuildMode::Production).copy(&fx.writer).unwrap();

        assert_eq!(report.static_files, 0);
    }

    #[test]
    fn mirrors_static_tree() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.path("app/static/img/icons")).unwrap();
        fs::write(fx.path("app/static/favicon.ico"), "ico").unwrap();
        fs::write(fx.path("app/static/img/icons/star.svg"), "<svg/>").unwrap();

        let report = fx.pipeline(BuildMode::Production).copy(&fx.writer).unwrap();

        assert_eq!(report.static_files, 2);
        assert!(fx.path("dist/favicon.ico").is_file());
        assert!(fx.path("dist/img/icons/star.svg").is_file());
    }

    #[test]
    fn source_maps_only_in_development() {
        let fx = Fixture::new();

        let prod = fx.pipeline(BuildMode::Production).copy(&fx.writer).unwrap();
        assert_eq!(prod.source_maps, 0);
        assert!(!fx.path("dist/styles/main.css.map").exists());

        let dev = fx.pipeline(BuildMode::Development).copy(&fx.writer).unwrap();
        assert_eq!(dev.source_maps, 1);
        assert!(fx.path("dist/styles/main.css.map").is_file());
    }

    #[test]
    fn missing_stylesheet_is_an_error() {
        let fx = Fixture::new();
        fs::remove_file(fx.path("app/styles/main.css")).unwrap();

        let err = fx
            .pipeline(BuildMode::Production)
            .copy(&fx.writer)
            .unwrap_err();

        assert_eq!(err.path, fx.path("app/styles/main.css"));
    }
}
