//! OCRTool - macOS Vision APIを使った画像OCRツール

mod cli;
mod config;
mod error;
mod help;
mod image_loader;
mod logging;
mod ocr;
mod output;

use anyhow::Result;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    logging::init();
    cli::run()
}
