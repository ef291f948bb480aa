//! ヘルプ表示モジュール

use crate::error::RecognitionError;
use crate::ocr::Recognizer;

/// 使い方メッセージを生成
///
/// 対応言語はエンジンから都度取得する。取得に失敗した場合は使い方も生成しない
pub fn render_help(recognizer: &dyn Recognizer) -> Result<String, RecognitionError> {
    let supported = recognizer.supported_languages()?;

    Ok(format!(
        "Usage: OCRTool <image_path> [<language_1>,<language_2>,...,<language_n>]\n\
         \n\
         Supported languages:\n\
         {}\n\
         \n\
         Example:\n\
         OCRTool path/to/image.jpg en-US,zh-Hans",
        supported.join(", ")
    ))
}

/// 対応言語の取得失敗時に表示する診断メッセージ
pub fn language_query_failure(err: &RecognitionError) -> String {
    format!("Error getting supported languages: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::tests::FakeRecognizer;

    #[test]
    fn test_help_contains_usage_and_example() {
        let recognizer = FakeRecognizer::with_lines(&[]);
        let help = render_help(&recognizer).unwrap();

        assert!(help.starts_with("Usage: OCRTool <image_path>"));
        assert!(help.contains("Usage:"));
        assert!(help.contains("OCRTool path/to/image.jpg en-US,zh-Hans"));
    }

    #[test]
    fn test_help_lists_languages_comma_separated() {
        let recognizer = FakeRecognizer::with_lines(&[]);
        let help = render_help(&recognizer).unwrap();

        let lines: Vec<&str> = help.lines().collect();
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Supported languages:");
        assert_eq!(lines[3], "en-US, ja-JP");
    }

    #[test]
    fn test_help_fails_without_language_list() {
        let recognizer = FakeRecognizer::failing("Vision unavailable");
        let err = render_help(&recognizer).unwrap_err();
        assert_eq!(
            language_query_failure(&err),
            "Error getting supported languages: Failed to perform OCR: Vision unavailable"
        );
    }
}
