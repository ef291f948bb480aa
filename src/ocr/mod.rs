//! OCRモジュール - 認識エンジンの抽象化と結果の組み立て

mod vision;

pub use vision::VisionRecognizer;

use crate::error::RecognitionError;
use crate::image_loader::DecodedImage;
use serde::Deserialize;

/// 認識エンジンのインターフェース
///
/// 実装は呼び出し側から見て同期的にブロックし、完了（成功またはエラー）後にのみ戻る
pub trait Recognizer {
    /// 画像からテキストを認識する
    ///
    /// `languages`は空でないこと。順序は優先度としてそのままエンジンへ渡す
    fn recognize(
        &self,
        image: &DecodedImage,
        languages: &[String],
    ) -> Result<String, RecognitionError>;

    /// エンジンが対応する認識言語タグの一覧
    fn supported_languages(&self) -> Result<Vec<String>, RecognitionError>;
}

/// 認識結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Success { text: String },
    Failure { message: String },
}

impl From<Result<String, RecognitionError>> for RecognitionOutcome {
    fn from(result: Result<String, RecognitionError>) -> Self {
        match result {
            Ok(text) => RecognitionOutcome::Success { text },
            Err(e) => RecognitionOutcome::Failure {
                message: e.to_string(),
            },
        }
    }
}

/// エンジンが報告したテキスト領域
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Observation {
    /// 信頼度順の候補文字列
    #[serde(default)]
    pub candidates: Vec<String>,
}

impl Observation {
    pub fn top_candidate(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// 各領域の第1候補を改行で連結する
///
/// 並べ替え・重複除去・信頼度フィルタは行わない。候補の無い領域は飛ばす
pub fn assemble_text(observations: &[Observation]) -> String {
    observations
        .iter()
        .filter_map(Observation::top_candidate)
        .collect::<Vec<_>>()
        .join("\n")
}
