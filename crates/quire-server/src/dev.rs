//! Development loop: initial build, preview server, rebuild on change.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use quire_static::{BuildConfig, BuildMode, StaticBuilder};

use crate::rebuild::{RebuildQueue, RequestOutcome};
use crate::server::{shutdown_signal, ServerError};
use crate::supervisor::{ChildSupervisor, ProcessCommand};
use crate::watcher::FileWatcher;

/// Configuration for the development loop.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Build settings; the mode is forced to development
    pub build: BuildConfig,

    /// Roots watched for changes
    pub watch_paths: Vec<PathBuf>,

    /// Command starting the preview server
    pub preview: ProcessCommand,

    /// How long to wait for the preview server to exit on shutdown
    pub shutdown_grace: Duration,
}

/// Development server.
///
/// Builds once, then keeps a preview server running while rebuilding the
/// site on every source change until interrupted.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Run until Ctrl-C.
    pub async fn start(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves.
    ///
    /// Fails only if the initial build fails or the preview server or
    /// watcher cannot be started. Later rebuild failures are logged.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), ServerError> {
        let DevServerConfig {
            mut build,
            watch_paths,
            preview,
            shutdown_grace,
        } = self.config;
        build.mode = BuildMode::Development;

        tracing::info!("Building site...");
        let builder = initial_build(StaticBuilder::new(build)).await?;

        let mut supervisor = ChildSupervisor::new("preview server");
        supervisor.start(&preview)?;

        let (watcher, mut events) = match FileWatcher::new(&watch_paths) {
            Ok(pair) => pair,
            Err(e) => {
                supervisor.shutdown(shutdown_grace).await?;
                return Err(e.into());
            }
        };
        let queue = RebuildQueue::spawn(builder);

        tracing::info!("Watching for changes. Press Ctrl-C to stop.");

        let mut worker_lost = false;
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down...");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::warn!("File watcher stopped, no further rebuilds");
                        break;
                    };
                    tracing::info!("[{}] {}", event.kind, event.path.display());
                    match queue.request() {
                        RequestOutcome::Queued => {}
                        RequestOutcome::Coalesced => tracing::debug!("Rebuild already queued"),
                        RequestOutcome::Closed if !worker_lost => {
                            tracing::error!(
                                "Rebuild worker has stopped, changes will not be rebuilt until quire dev is restarted"
                            );
                            worker_lost = true;
                        }
                        RequestOutcome::Closed => {}
                    }
                }
                status = supervisor.exited() => {
                    match status {
                        Ok(status) => tracing::warn!("Preview server exited ({}), still rebuilding", status),
                        Err(e) => tracing::warn!("Lost track of preview server: {}", e),
                    }
                }
            }
        }

        watcher.close();
        supervisor.shutdown(shutdown_grace).await?;
        drop(queue);

        Ok(())
    }
}

/// Run the first build on the blocking pool and hand the builder back.
async fn initial_build(mut builder: StaticBuilder) -> Result<StaticBuilder, ServerError> {
    let (builder, result) = tokio::task::spawn_blocking(move || {
        let result = builder.build();
        (builder, result)
    })
    .await
    .map_err(|e| ServerError::Task(e.to_string()))?;

    let result = result?;
    tracing::info!(
        "Built {} pages and {} assets in {}ms",
        result.pages,
        result.assets.total(),
        result.duration_ms
    );

    Ok(builder)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;
    use tokio::sync::oneshot;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(root: &Path) -> DevServerConfig {
        write(root, "content/config.yaml", "title: Guide\n");
        write(root, "content/pages/a.md", "---\ntitle: Alpha\n---\n");
        write(root, "content/pages/b.md", "---\ntitle: Bravo\n---\n");
        write(
            root,
            "app/templates/index.html",
            "{% for p in pages %}{{ p.title }};{% endfor %}",
        );
        write(
            root,
            "app/templates/page.html",
            "{% for p in pages %}{{ p.title }};{% endfor %}",
        );
        write(root, "app/styles/main.css", "");
        write(root, "app/scripts/main.js", "");

        DevServerConfig {
            build: BuildConfig::with_root(root),
            watch_paths: vec![root.join("content"), root.join("app")],
            preview: ProcessCommand::new("sleep").arg("60"),
            shutdown_grace: Duration::from_secs(5),
        }
    }

    async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[tokio::test]
    async fn failed_initial_build_stops_before_preview() {
        let temp = tempdir().unwrap();
        let mut config = config(temp.path());
        fs::remove_file(temp.path().join("content/config.yaml")).unwrap();
        config.preview = ProcessCommand::new("quire-no-such-program");

        let result = DevServer::new(config).run_until(async {}).await;

        assert!(matches!(result, Err(ServerError::Build(_))));
    }

    #[tokio::test]
    async fn rebuilds_every_page_on_change() {
        let temp = tempdir().unwrap();
        let root = temp.path().to_path_buf();
        let config = config(&root);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(DevServer::new(config).run_until(async move {
            let _ = stop_rx.await;
        }));

        let index = root.join("dist/index.html");
        assert!(wait_until(|| index.is_file()).await, "initial build missing");
        tokio::time::sleep(Duration::from_millis(200)).await;

        write(&root, "content/pages/a.md", "---\ntitle: Alpha Revised\n---\n");

        let other = root.join("dist/b/index.html");
        let rebuilt = wait_until(|| {
            fs::read_to_string(&other).is_ok_and(|html| html.contains("Alpha Revised"))
        })
        .await;
        assert!(rebuilt, "unchanged page was not regenerated");

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn broken_rebuild_keeps_running() {
        let temp = tempdir().unwrap();
        let root = temp.path().to_path_buf();
        let config = config(&root);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(DevServer::new(config).run_until(async move {
            let _ = stop_rx.await;
        }));

        let index = root.join("dist/index.html");
        assert!(wait_until(|| index.is_file()).await, "initial build missing");
        tokio::time::sleep(Duration::from_millis(200)).await;

        write(&root, "content/config.yaml", "title: [broken\n");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!handle.is_finished());
        assert_eq!(
            fs::read_to_string(&index).unwrap(),
            "Alpha;Bravo;",
            "previous output should stay in place"
        );

        write(&root, "content/config.yaml", "title: Guide\n");
        write(&root, "content/pages/c.md", "---\ntitle: Charlie\n---\n");
        let recovered = wait_until(|| {
            fs::read_to_string(&index).is_ok_and(|html| html == "Alpha;Bravo;Charlie;")
        })
        .await;
        assert!(recovered, "rebuild did not recover");

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
