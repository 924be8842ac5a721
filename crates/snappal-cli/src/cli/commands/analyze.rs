//! Analyze command handler.

use std::path::Path;

use anyhow::{Context, Result};
use snappal_core::config;
use snappal_core::images;

use super::{deliver, open_session, render};
use crate::cli::ViewFormat;

pub struct AnalyzeRunOptions<'a> {
    pub image: &'a str,
    pub format: ViewFormat,
    pub out: Option<&'a Path>,
    pub copy: bool,
    pub config: &'a config::Config,
}

pub async fn run(options: AnalyzeRunOptions<'_>) -> Result<()> {
    let image = images::load_image_input(options.image)?;
    let (mut controller, mut rx) = open_session(options.config)?;

    eprintln!("Analyzing {} ({})...", display_name(options.image), image.mime_type);
    let result = controller
        .analyze_once(&mut rx, image)
        .await
        .context("analyze screenshot")?;

    let source = controller.source_image(&result);
    let text = render(&result, options.format, source.as_ref())?;
    deliver(&text, options.out, options.copy)
}

fn display_name(input: &str) -> &str {
    if input.trim_start().starts_with("data:") {
        "data URL"
    } else {
        input
    }
}
