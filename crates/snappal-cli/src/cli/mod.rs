//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use snappal_core::config;
use snappal_core::export::ExportFormat;

mod commands;

#[derive(Parser)]
#[command(name = "snappal")]
#[command(version)]
#[command(about = "Extract color, typography and spacing tokens from UI screenshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// How a result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ViewFormat {
    /// Tables for colors, typography and spacing
    #[default]
    Summary,
    /// The full result as JSON
    Json,
    /// CSS custom properties
    Css,
    /// Tailwind theme snippet
    Tailwind,
}

impl ViewFormat {
    /// The export format behind this view, if it is not the summary.
    pub fn export(self) -> Option<ExportFormat> {
        match self {
            ViewFormat::Summary => None,
            ViewFormat::Json => Some(ExportFormat::Json),
            ViewFormat::Css => Some(ExportFormat::Css),
            ViewFormat::Tailwind => Some(ExportFormat::Tailwind),
        }
    }
}

/// Exportable formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportArg {
    Json,
    Css,
    Tailwind,
}

impl From<ExportArg> for ExportFormat {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Json => ExportFormat::Json,
            ExportArg::Css => ExportFormat::Css,
            ExportArg::Tailwind => ExportFormat::Tailwind,
        }
    }
}

/// Output destination shared by commands that print a result.
#[derive(clap::Args, Debug, Clone, Default)]
struct OutputArgs {
    /// Write the output to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Also copy the output to the clipboard
    #[arg(long)]
    copy: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Analyze a screenshot and add the result to history
    Analyze {
        /// Image file (PNG, JPEG, WebP, GIF) or a base64 data URL
        #[arg(value_name = "IMAGE")]
        image: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: ViewFormat,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Browse or clear past analyses
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Export a history entry
    Export {
        /// History position (1 = newest) or result id
        #[arg(value_name = "N|ID")]
        entry: String,

        /// Export format
        #[arg(short, long, value_enum)]
        format: ExportArg,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Interactive session: analyze, browse history, copy tokens
    Shell,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum HistoryCommands {
    /// Lists saved analyses, newest first
    List,
    /// Shows one saved analysis
    Show {
        /// History position (1 = newest) or result id
        #[arg(value_name = "N|ID")]
        entry: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: ViewFormat,
    },
    /// Removes all saved analyses
    Clear,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = snappal_core::logging::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },

        Commands::History { command } => match command {
            HistoryCommands::List => commands::history::list(),
            HistoryCommands::Show { entry, format } => commands::history::show(&entry, format),
            HistoryCommands::Clear => commands::history::clear(),
        },

        Commands::Export {
            entry,
            format,
            output,
        } => commands::export::run(&entry, format.into(), output.out.as_deref(), output.copy),

        Commands::Analyze {
            image,
            format,
            output,
        } => {
            let config = config::Config::load().context("load config")?;
            commands::analyze::run(commands::analyze::AnalyzeRunOptions {
                image: &image,
                format,
                out: output.out.as_deref(),
                copy: output.copy,
                config: &config,
            })
            .await
        }

        Commands::Shell => {
            let config = config::Config::load().context("load config")?;
            commands::shell::run(&config).await
        }
    }
}
