//! Build mode.

use std::fmt;

/// Whether a build targets deployment or local development.
///
/// The mode only affects template caching and source-map emission; the
/// content model and output layout are identical in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Templates cached for the engine's lifetime, no source maps
    #[default]
    Production,
    /// Templates reloaded on every build, source maps copied
    Development,
}

impl BuildMode {
    /// Whether loaded templates are discarded before each build.
    pub fn reloads_templates(self) -> bool {
        self == Self::Development
    }

    /// Whether `.map` files next to the stylesheet and script are copied.
    pub fn emits_source_maps(self) -> bool {
        self == Self::Development
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Development => f.write_str("development"),
        }
    }
}
