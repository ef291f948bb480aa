//! エラー型定義モジュール

use std::io;
use thiserror::Error;

/// 設定エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IOエラー: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML解析エラー: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("設定値が不正です: {0}")]
    InvalidValue(String),
}

/// 画像読み込みエラー
///
/// 表示文字列はそのままJSONの`error`に出力される
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load image from file: {path}")]
    NotFound { path: String },

    #[error("Failed to load image from file: {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// OCR認識エラー
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// エンジンが認識中に報告したエラー
    #[error("Failed to perform text recognition: {0}")]
    Recognition(String),

    /// 結果をテキスト観測として解釈できない
    #[error("Failed to get text recognition observations")]
    NoObservations,

    /// エンジン呼び出し自体の失敗
    #[error("Failed to perform OCR: {0}")]
    Execution(String),

    /// エンジンが結果もエラーも返さなかった
    #[error("Failed to perform OCR")]
    NoResult,

    #[error("Failed to perform OCR: timed out after {0} seconds")]
    Timeout(u64),
}

/// 出力エラー
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to convert to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
