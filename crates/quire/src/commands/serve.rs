//! Preview server command.

use std::path::PathBuf;

use anyhow::Result;
use quire_server::{PreviewConfig, PreviewServer};

use crate::project::Project;

/// Run the serve command.
pub async fn run(
    project: &Project,
    dir: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
    open: bool,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| project.output_dir());
    if !dir.is_dir() {
        anyhow::bail!(
            "Directory not found: {}. Run 'quire build' first.",
            dir.display()
        );
    }

    let config = PreviewConfig {
        dir,
        host: host.unwrap_or_else(|| project.dev().host.clone()),
        port: port.unwrap_or(project.dev().port),
        open: open && project.dev().open,
    };

    PreviewServer::new(config).run().await?;

    Ok(())
}
