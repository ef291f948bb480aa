//! 結果出力モジュール

use crate::error::{LoadError, OutputError};
use crate::ocr::RecognitionOutcome;
use serde::{Deserialize, Serialize};

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 整形済みJSON。成功時は`recognized_text`、失敗時は`error`
    Json,
    /// 1行JSON。失敗時は`recognized_text`がnullになり理由は出力されない
    Minimal,
}

/// JSON出力ドキュメント（キーは常に1つ）
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum OutputDocument<'a> {
    RecognizedText(&'a str),
    Error(&'a str),
}

/// 処理結果を出力文字列に変換
pub fn render(
    result: &Result<RecognitionOutcome, LoadError>,
    format: OutputFormat,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Minimal => render_minimal(result),
    }
}

fn render_json(result: &Result<RecognitionOutcome, LoadError>) -> Result<String, OutputError> {
    let load_message;
    let document = match result {
        Ok(RecognitionOutcome::Success { text }) => OutputDocument::RecognizedText(text),
        Ok(RecognitionOutcome::Failure { message }) => OutputDocument::Error(message),
        Err(e) => {
            load_message = e.to_string();
            OutputDocument::Error(&load_message)
        }
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn render_minimal(result: &Result<RecognitionOutcome, LoadError>) -> Result<String, OutputError> {
    match result {
        Ok(RecognitionOutcome::Success { text }) => Ok(format!(
            "{{\"recognized_text\": {}}}",
            serde_json::to_string(text)?
        )),
        Ok(RecognitionOutcome::Failure { .. }) => Ok("{\"recognized_text\": null}".to_string()),
        // 読み込み失敗はJSONではなく診断メッセージをそのまま出す
        Err(e) => Ok(e.to_string()),
    }
}

/// 結果を標準出力に書き出す
///
/// 変換に失敗した場合も平文の診断メッセージを出し、無出力にはしない
pub fn emit(result: &Result<RecognitionOutcome, LoadError>, format: OutputFormat) {
    match render(result, format) {
        Ok(document) => println!("{}", document),
        Err(e) => println!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn success(text: &str) -> Result<RecognitionOutcome, LoadError> {
        Ok(RecognitionOutcome::Success {
            text: text.to_string(),
        })
    }

    fn failure(message: &str) -> Result<RecognitionOutcome, LoadError> {
        Ok(RecognitionOutcome::Failure {
            message: message.to_string(),
        })
    }

    fn load_failure(path: &str) -> Result<RecognitionOutcome, LoadError> {
        Err(LoadError::NotFound {
            path: path.to_string(),
        })
    }

    #[test]
    fn test_json_success() {
        let output = render(&success("Hello\nWorld"), OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value, serde_json::json!({"recognized_text": "Hello\nWorld"}));
        // 整形済み
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_json_recognition_failure() {
        let output = render(
            &failure("Failed to get text recognition observations"),
            OutputFormat::Json,
        )
        .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"error": "Failed to get text recognition observations"})
        );
    }

    #[test]
    fn test_json_load_failure() {
        let output = render(&load_failure("/no/such/file.png"), OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"error": "Failed to load image from file: /no/such/file.png"})
        );
    }

    #[test]
    fn test_json_has_single_key() {
        let output = render(&success(""), OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_minimal_success_escapes_quotes() {
        let output = render(&success(r#"He said "hi"\ok"#), OutputFormat::Minimal).unwrap();
        assert!(output.contains(r#"\"hi\""#));
        assert!(!output.contains('\n'));

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["recognized_text"], r#"He said "hi"\ok"#);
    }

    #[test]
    fn test_minimal_escapes_control_characters() {
        let output = render(&success("line1\nline2\ttab"), OutputFormat::Minimal).unwrap();
        assert_eq!(output, r#"{"recognized_text": "line1\nline2\ttab"}"#);
    }

    #[test]
    fn test_minimal_failure_is_null() {
        let output = render(&failure("anything"), OutputFormat::Minimal).unwrap();
        assert_eq!(output, r#"{"recognized_text": null}"#);
    }

    #[test]
    fn test_minimal_load_failure_is_plain_text() {
        let output = render(&load_failure("missing.png"), OutputFormat::Minimal).unwrap();
        assert_eq!(output, "Failed to load image from file: missing.png");
    }
}
