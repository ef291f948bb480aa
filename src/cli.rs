//! CLIモジュール

use crate::config::{CliArgs, Config};
use crate::error::{ConfigError, LoadError};
use crate::help;
use crate::image_loader;
use crate::ocr::{RecognitionOutcome, Recognizer, VisionRecognizer};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, warn};

/// ヘルプを要求する引数
const HELP_FLAG: &str = "--help";

/// OCRTool - 画像から文字を認識しJSONで出力する
///
/// ヘルプはエンジンの対応言語を含めて独自に表示するため、clap標準のヘルプは無効にしている
#[derive(Parser, Debug)]
#[command(name = "OCRTool")]
#[command(about = "画像から文字を認識しJSONで出力する", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// 出力形式
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// 認識のタイムアウト（秒）
    #[arg(long)]
    pub timeout: Option<u64>,

    /// 失敗時に終了コード1を返す
    #[arg(long)]
    pub strict_exit: bool,

    /// OCR対象の画像ファイルパス
    pub image_path: Option<String>,

    /// 認識言語（カンマ区切り、例: en-US,zh-Hans）
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub languages: Vec<String>,
}

/// CLIエントリポイント
pub fn run() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().collect();
    let help_requested = wants_help(&args);
    let cli = parse_args(&args)?;

    let cli_args = CliArgs {
        format: cli.format,
        timeout: cli.timeout,
        strict_exit: cli.strict_exit,
    };
    let config = match Config::load(&cli_args) {
        Ok(config) => config,
        Err(e) => {
            warn!("設定の読み込みに失敗しました: {}", e);
            println!("{}", config_failure(&e));
            return Ok(exit_code(false, cli_args.strict_exit));
        }
    };
    let recognizer = VisionRecognizer::new(config.timeout_seconds);

    let image_path = match cli.image_path {
        Some(path) if !should_render_help(help_requested, Some(path.as_str())) => path,
        _ => {
            let succeeded = print_help(&recognizer);
            return Ok(exit_code(succeeded, config.strict_exit));
        }
    };

    let languages = resolve_languages(&cli.languages, &config);
    let result = process_image(&recognizer, &image_path, &languages);
    let succeeded = matches!(result, Ok(RecognitionOutcome::Success { .. }));

    output::emit(&result, config.output_format);

    Ok(exit_code(succeeded, config.strict_exit))
}

/// 引数を解析
///
/// `--help`は取り除いてから解析する。未知のオプションに見える引数
/// （`-scan.png`など）は、先頭を画像パス、残りを言語とみなす
fn parse_args(args: &[String]) -> Result<Cli, clap::Error> {
    let filtered: Vec<String> = args
        .iter()
        .filter(|a| a.as_str() != HELP_FLAG)
        .cloned()
        .collect();

    match Cli::try_parse_from(&filtered) {
        Ok(cli) => Ok(cli),
        Err(e) if e.kind() == ErrorKind::UnknownArgument => {
            debug!("未知のオプションのため位置引数として扱います: {}", e);
            Ok(Cli::positional(&filtered))
        }
        Err(e) => Err(e),
    }
}

impl Cli {
    /// オプションを解釈せず、位置引数だけで構築する
    fn positional(args: &[String]) -> Self {
        Self {
            format: None,
            timeout: None,
            strict_exit: false,
            image_path: args.get(1).cloned(),
            languages: args.iter().skip(2).cloned().collect(),
        }
    }
}

/// 画像パスが無いか`--help`があればヘルプを表示する
fn should_render_help(help_requested: bool, image_path: Option<&str>) -> bool {
    help_requested || image_path.is_none()
}

/// 設定ファイルの読み込み失敗時に表示する診断メッセージ
fn config_failure(err: &ConfigError) -> String {
    format!("Failed to load configuration: {}", err)
}

/// 引数のどこかに`--help`があるか（プログラム名は除く）
fn wants_help(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == HELP_FLAG)
}

/// 言語引数を解析
///
/// 残りの引数を空白で連結してからカンマで分割し、空の要素を除く。
/// 順序は保持し、重複は除かない
pub fn parse_languages(rest: &[String]) -> Vec<String> {
    rest.join(" ")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 言語指定が無ければ設定のデフォルトを使う
fn resolve_languages(rest: &[String], config: &Config) -> Vec<String> {
    let languages = parse_languages(rest);
    if languages.is_empty() {
        config.languages.clone()
    } else {
        languages
    }
}

/// 画像を読み込み認識する
///
/// デコード済み画像は認識の完了後に破棄される
pub fn process_image(
    recognizer: &dyn Recognizer,
    image_path: &str,
    languages: &[String],
) -> Result<RecognitionOutcome, LoadError> {
    let image = image_loader::load(image_path).inspect_err(|e| warn!("{}", e))?;

    debug!("認識言語: {:?}", languages);
    let outcome = recognizer
        .recognize(&image, languages)
        .inspect_err(|e| warn!("OCRエラー: {}", e))
        .into();

    Ok(outcome)
}

/// ヘルプを表示し、表示できたかを返す
fn print_help(recognizer: &dyn Recognizer) -> bool {
    match help::render_help(recognizer) {
        Ok(usage) => {
            println!("{}", usage);
            true
        }
        Err(e) => {
            println!("{}", help::language_query_failure(&e));
            false
        }
    }
}

fn exit_code(succeeded: bool, strict_exit: bool) -> ExitCode {
    if reports_failure(succeeded, strict_exit) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// strict_exit有効時のみ失敗を終了コードに反映する
fn reports_failure(succeeded: bool, strict_exit: bool) -> bool {
    !succeeded && strict_exit
}
