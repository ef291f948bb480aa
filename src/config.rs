//! 設定モジュール

use crate::error::ConfigError;
use crate::output::OutputFormat;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// 言語指定が無い場合に使う認識言語（優先順）
pub const DEFAULT_LANGUAGES: [&str; 3] = ["en-US", "zh-Hans", "zh-Hant"];

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct Config {
    /// デフォルトの認識言語リスト
    pub languages: Vec<String>,
    /// 出力形式
    pub output_format: OutputFormat,
    /// 認識のタイムアウト（秒）。Noneなら完了まで待つ
    pub timeout_seconds: Option<u64>,
    /// 失敗時に終了コード1を返す
    pub strict_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            output_format: OutputFormat::Json,
            timeout_seconds: None,
            strict_exit: false,
        }
    }
}

/// TOML設定ファイル用構造体
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    languages: Option<Vec<String>>,
    output_format: Option<OutputFormat>,
    timeout_seconds: Option<u64>,
    strict_exit: Option<bool>,
}

/// CLI引数
#[derive(Debug, Default)]
pub struct CliArgs {
    pub format: Option<OutputFormat>,
    pub timeout: Option<u64>,
    pub strict_exit: bool,
}

impl Config {
    /// 設定を読み込む
    ///
    /// 優先順位: CLI引数 > 設定ファイル > デフォルト値
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let config_path = Self::config_file_path();
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let file_config: FileConfig = toml::from_str(&content)?;
            config.merge_file_config(file_config);
        }

        config.merge_cli_args(cli_args);
        config.validate()?;

        Ok(config)
    }

    /// 設定ファイルのパスを取得
    fn config_file_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".ocrtool").join("config.toml")
    }

    /// ファイル設定をマージ
    fn merge_file_config(&mut self, file_config: FileConfig) {
        if let Some(languages) = file_config.languages {
            self.languages = languages;
        }
        if let Some(format) = file_config.output_format {
            self.output_format = format;
        }
        if file_config.timeout_seconds.is_some() {
            self.timeout_seconds = file_config.timeout_seconds;
        }
        if let Some(strict) = file_config.strict_exit {
            self.strict_exit = strict;
        }
    }

    /// CLI引数をマージ
    fn merge_cli_args(&mut self, cli_args: &CliArgs) {
        if let Some(format) = cli_args.format {
            self.output_format = format;
        }
        if cli_args.timeout.is_some() {
            self.timeout_seconds = cli_args.timeout;
        }
        // フラグは指定時のみ有効化する
        if cli_args.strict_exit {
            self.strict_exit = true;
        }
    }

    /// 設定値をバリデート
    fn validate(&self) -> Result<(), ConfigError> {
        if self.languages.is_empty() {
            return Err(ConfigError::InvalidValue(
                "languages must not be empty".to_string(),
            ));
        }
        if self.languages.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "languages must not contain empty tags".to_string(),
            ));
        }
        if self.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
