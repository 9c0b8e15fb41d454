//! Quire CLI - static site generator for Markdown content.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use quire_static::BuildMode;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod project;

use project::Project;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Static site generator for Markdown content and Jinja templates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the quire.toml project file
    #[arg(short, long, default_value = "quire.toml", global = true)]
    project: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a starter site next to the project file
    Init {
        /// Overwrite files that already exist
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the site once
    Build {
        /// Output directory (defaults to the project's output path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Build mode
        #[arg(short, long, value_enum, default_value_t = ModeArg::Production)]
        mode: ModeArg,
    },

    /// Build, preview and rebuild on every change
    Dev {
        /// Port for the preview server
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Preview a built site
    Serve {
        /// Directory to serve (defaults to the project's output path)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Production,
    Development,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Production => BuildMode::Production,
            ModeArg::Development => BuildMode::Development,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.project, yes)?;
        }
        Commands::Build { output, mode } => {
            let project = Project::load(&cli.project)?;
            commands::build::run(&project, output, mode.into())?;
        }
        Commands::Dev { port, no_open } => {
            let project = Project::load(&cli.project)?;
            commands::dev::run(&project, port, !no_open).await?;
        }
        Commands::Serve {
            dir,
            port,
            host,
            no_open,
        } => {
            let project = Project::load(&cli.project)?;
            commands::serve::run(&project, dir, port, host, !no_open).await?;
        }
    }

    Ok(())
}
