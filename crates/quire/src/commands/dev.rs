//! Development server command.

use std::time::Duration;

use anyhow::{Context, Result};
use quire_server::{DevServer, DevServerConfig, ProcessCommand};
use quire_static::BuildMode;

use crate::project::Project;

/// How long the preview server gets to exit after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Run the dev server.
pub async fn run(project: &Project, port: Option<u16>, open: bool) -> Result<()> {
    let port = port.unwrap_or(project.dev().port);
    let open = open && project.dev().open;

    let config = DevServerConfig {
        build: project.build_config(BuildMode::Development),
        watch_paths: project.watch_paths(),
        preview: preview_command(project, port, open)?,
        shutdown_grace: SHUTDOWN_GRACE,
    };

    tracing::info!("Starting development server on port {}", port);

    DevServer::new(config).start().await?;

    Ok(())
}

/// The configured preview command, or `quire serve` on the output directory.
fn preview_command(project: &Project, port: u16, open: bool) -> Result<ProcessCommand> {
    if let Some(line) = &project.dev().preview_command {
        if let Some(command) = ProcessCommand::parse(line) {
            return Ok(command.current_dir(project.root()));
        }
        tracing::warn!("Ignoring blank preview_command");
    }

    let exe = std::env::current_exe().context("Failed to locate the quire executable")?;
    let mut command = ProcessCommand::new(exe)
        .arg("--project")
        .arg(project.path())
        .arg("serve")
        .arg("--dir")
        .arg(project.output_dir())
        .arg("--port")
        .arg(port.to_string())
        .arg("--host")
        .arg(&project.dev().host);
    if !open {
        command = command.arg("--no-open");
    }

    Ok(command)
}
