//! Interactive shell around the analysis state machine.
//!
//! Input lines and analysis completions are multiplexed with `select!`, so the
//! prompt stays usable while a request is in flight.

use std::io::Write;

use anyhow::{Context, Result};
use snappal_core::config;
use snappal_core::controller::Controller;
use snappal_core::export::ExportFormat;
use snappal_core::images;
use snappal_core::providers::GeminiClient;
use snappal_core::state::StateEvent;
use snappal_types::{AnalysisResult, AnalysisStatus};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{copy_to_clipboard, open_session};
use crate::views;

const HELP: &str = "\
Commands:
  analyze <path>              Analyze a screenshot (PNG, JPEG, WebP, GIF)
  history                     List saved analyses
  open <n>                    Show history entry n (1 = newest)
  show [colors|type|spacing|export]
                              Show the current result or one section of it
  copy <n|css|tailwind|json>  Copy color n's hex, or an export, to the clipboard
  back                        Return to the start screen
  clear                       Remove all saved analyses
  help                        Show this help
  quit                        Leave the shell";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    All,
    Colors,
    Type,
    Spacing,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CopyTarget {
    /// 0-based index across primary then extended colors
    Color(usize),
    Format(ExportFormat),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Analyze(String),
    History,
    /// 0-based history index
    Open(usize),
    Show(Section),
    Copy(CopyTarget),
    Back,
    Clear,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`; the error is a
    /// usage message.
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let command = match word.to_ascii_lowercase().as_str() {
            "analyze" | "a" => {
                if rest.is_empty() {
                    return Err("usage: analyze <path>".to_string());
                }
                ShellCommand::Analyze(rest.to_string())
            }
            "history" | "h" => ShellCommand::History,
            "open" | "o" => ShellCommand::Open(parse_position(rest).ok_or("usage: open <n>")?),
            "show" | "s" => ShellCommand::Show(match rest.to_ascii_lowercase().as_str() {
                "" => Section::All,
                "colors" | "colours" => Section::Colors,
                "type" | "typography" => Section::Type,
                "spacing" => Section::Spacing,
                "export" => Section::Export,
                _ => return Err("usage: show [colors|type|spacing|export]".to_string()),
            }),
            "copy" | "c" => {
                let target = match parse_position(rest) {
                    Some(index) => CopyTarget::Color(index),
                    None => CopyTarget::Format(
                        rest.parse::<ExportFormat>()
                            .map_err(|e| format!("{e}. usage: copy <n|css|tailwind|json>"))?,
                    ),
                };
                ShellCommand::Copy(target)
            }
            "back" | "b" => ShellCommand::Back,
            "clear" => ShellCommand::Clear,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("Unknown command '{other}'. Type `help`.")),
        };
        Ok(Some(command))
    }
}

/// Parses a 1-based position into a 0-based index.
fn parse_position(text: &str) -> Option<usize> {
    text.parse::<usize>().ok()?.checked_sub(1)
}

pub async fn run(config: &config::Config) -> Result<()> {
    let (mut controller, mut rx) = open_session(config)?;

    println!("snappal shell. Type `help` for commands.");
    if !controller.state().history.is_empty() {
        println!("{}", views::render_history(&controller.state().history));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(controller.state().status)?;
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read input")? else {
                    break;
                };
                match ShellCommand::parse(&line) {
                    Ok(Some(ShellCommand::Quit)) => break,
                    Ok(Some(command)) => execute(&mut controller, command),
                    Ok(None) => {}
                    Err(usage) => println!("{usage}"),
                }
            }
            Some(event) = rx.recv() => {
                print_notices(&controller.dispatch(event));
                show_outcome(&controller);
            }
        }
    }

    if controller.state().is_analyzing() {
        tracing::info!("leaving shell with an analysis in flight; its result is discarded");
    }
    Ok(())
}

fn prompt(status: AnalysisStatus) -> Result<()> {
    let mut stdout = std::io::stdout();
    if status == AnalysisStatus::Analyzing {
        write!(stdout, "snappal [analyzing...]> ")?;
    } else {
        write!(stdout, "snappal> ")?;
    }
    stdout.flush().context("flush prompt")
}

fn print_notices(notices: &[String]) {
    for notice in notices {
        println!("{notice}");
    }
}

fn show_outcome(controller: &Controller<GeminiClient>) {
    let state = controller.state();
    match state.status {
        AnalysisStatus::Complete => {
            if let Some(result) = &state.current_result {
                let source = controller.source_image(result);
                println!("\n{}", views::render_summary(result, source.as_ref()));
            }
        }
        AnalysisStatus::Error => {
            let message = state.error_msg.as_deref().unwrap_or("unknown error");
            println!("\nAnalysis failed: {message}");
        }
        AnalysisStatus::Idle | AnalysisStatus::Analyzing => {}
    }
}

fn execute(controller: &mut Controller<GeminiClient>, command: ShellCommand) {
    match command {
        ShellCommand::Analyze(path) => match images::load_image_input(&path) {
            Ok(image) => {
                let notices = controller.dispatch(StateEvent::Submit(image));
                if notices.is_empty() {
                    println!("Analyzing {path}...");
                }
                print_notices(&notices);
            }
            Err(e) => println!("{e:#}"),
        },
        ShellCommand::History => println!("{}", views::render_history(&controller.state().history)),
        ShellCommand::Open(index) => {
            let notices = controller.dispatch(StateEvent::SelectHistory(index));
            if notices.is_empty() {
                show_outcome(controller);
            }
            print_notices(&notices);
        }
        ShellCommand::Show(section) => match &controller.state().current_result {
            Some(result) => show_section(controller, result, section),
            None => println!("Nothing to show. Analyze an image or open a history entry."),
        },
        ShellCommand::Copy(target) => match &controller.state().current_result {
            Some(result) => copy(result, target),
            None => println!("Nothing to copy. Analyze an image or open a history entry."),
        },
        ShellCommand::Back => {
            print_notices(&controller.dispatch(StateEvent::Dismiss));
        }
        ShellCommand::Clear => {
            let notices = controller.dispatch(StateEvent::ClearHistory);
            if notices.is_empty() {
                println!("History cleared.");
            }
            print_notices(&notices);
        }
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
}

fn show_section(controller: &Controller<GeminiClient>, result: &AnalysisResult, section: Section) {
    match section {
        Section::All => {
            let source = controller.source_image(result);
            println!("{}", views::render_summary(result, source.as_ref()));
        }
        Section::Colors => println!("{}", views::render_colors(result)),
        Section::Type => println!("{}", views::render_typography(result)),
        Section::Spacing => println!("{}", views::render_spacing(result)),
        Section::Export => {
            for format in [ExportFormat::Css, ExportFormat::Tailwind] {
                println!("{format}:\n{}\n", format.render(result).unwrap_or_default());
            }
        }
    }
}

fn copy(result: &AnalysisResult, target: CopyTarget) {
    let text = match target {
        CopyTarget::Color(index) => {
            let palette = result.colors();
            match palette.primary.iter().chain(&palette.extended).nth(index) {
                Some(color) => color.hex.clone(),
                None => {
                    println!("No color #{}.", index + 1);
                    return;
                }
            }
        }
        CopyTarget::Format(format) => match format.render(result) {
            Ok(text) => text,
            Err(e) => {
                println!("{e:#}");
                return;
            }
        },
    };
    copy_to_clipboard(&text);
}
