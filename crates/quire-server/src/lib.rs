//! Development loop and preview server for quire sites.
//!
//! Watches the project sources, rebuilds the whole site on every change and
//! keeps a preview server process alive for the duration of the session.

pub mod dev;
pub mod rebuild;
pub mod server;
pub mod supervisor;
pub mod watcher;

pub use dev::{DevServer, DevServerConfig};
pub use rebuild::{RebuildQueue, RebuildStatus, RequestOutcome};
pub use server::{shutdown_signal, PreviewConfig, PreviewServer, ServerError};
pub use supervisor::{ChildState, ChildSupervisor, ProcessCommand, SupervisorError};
pub use watcher::{ChangeKind, FileWatcher, WatchEvent};
