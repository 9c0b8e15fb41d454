//! Lifecycle management for the preview-server child process.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};

/// Lifecycle of a supervised child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for ChildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Running => f.write_str("running"),
            Self::Stopping => f.write_str("stopping"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Command line for a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ProcessCommand {
    /// Create a command running `program` with no arguments.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Split a command line on whitespace. Returns `None` for a blank line.
    ///
    /// No shell is involved, so quoting and pipes are not interpreted.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;

        Some(Self::new(program).args(parts))
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Errors from supervising a child process.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("{0} was already started")]
    AlreadyStarted(String),

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stop {name}: {source}")]
    Stop {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Supervises one child process from spawn to acknowledged exit.
///
/// The child is spawned with `kill_on_drop`, so dropping the supervisor
/// never leaves an orphan behind.
pub struct ChildSupervisor {
    name: String,
    state: ChildState,
    child: Option<Child>,
}

impl ChildSupervisor {
    /// Create a supervisor for a child identified by `name` in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ChildState::NotStarted,
            child: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChildState {
        self.state
    }

    /// OS process id while the child is running.
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Spawn the child. A supervisor starts at most one process.
    pub fn start(&mut self, command: &ProcessCommand) -> Result<(), SupervisorError> {
        if self.state != ChildState::NotStarted {
            return Err(SupervisorError::AlreadyStarted(self.name.clone()));
        }

        let child = command
            .to_command()
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                command: command.to_string(),
                source,
            })?;

        tracing::info!("Started {} (pid {})", self.name, child.id().unwrap_or(0));
        tracing::debug!("{} command: {}", self.name, command);

        self.child = Some(child);
        self.state = ChildState::Running;

        Ok(())
    }

    /// Wait for the child to exit on its own.
    ///
    /// Never resolves unless the child is running. Cancel safe, so it can be
    /// used as a `select!` branch.
    pub async fn exited(&mut self) -> io::Result<ExitStatus> {
        let child = match (self.state, self.child.as_mut()) {
            (ChildState::Running, Some(child)) => child,
            _ => return std::future::pending().await,
        };

        let status = child.wait().await?;
        self.child = None;
        self.state = ChildState::Stopped;

        Ok(status)
    }

    /// Terminate the child and wait until its exit is acknowledged.
    ///
    /// Returns the exit status, or `None` when no child was running. If the
    /// child has not exited after `grace` a warning is logged and the wait
    /// continues.
    pub async fn shutdown(&mut self, grace: Duration) -> Result<Option<ExitStatus>, SupervisorError> {
        let Some(mut child) = self.child.take() else {
            self.state = ChildState::Stopped;
            return Ok(None);
        };

        self.state = ChildState::Stopping;
        tracing::info!("Stopping {}", self.name);

        let stop_err = |source| SupervisorError::Stop {
            name: self.name.clone(),
            source,
        };

        let status = match child.try_wait().map_err(stop_err)? {
            Some(status) => status,
            None => {
                child.start_kill().map_err(stop_err)?;
                match tokio::time::timeout(grace, child.wait()).await {
                    Ok(result) => result.map_err(stop_err)?,
                    Err(_) => {
                        tracing::warn!(
                            "{} did not exit within {}ms, still waiting",
                            self.name,
                            grace.as_millis()
                        );
                        child.wait().await.map_err(stop_err)?
                    }
                }
            }
        };

        self.state = ChildState::Stopped;
        tracing::info!("{} stopped ({})", self.name, status);

        Ok(Some(status))
    }
}
