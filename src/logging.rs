//! ログインフラモジュール

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// デフォルトのログレベル
///
/// 標準出力はJSONとヘルプ専用のため、通常実行では警告以上のみ出す
const DEFAULT_FILTER: &str = "warn";

/// ログシステムを初期化
///
/// 出力先は標準エラー。RUST_LOG=debugで画像サイズ・認識言語・検出領域数を確認できる
pub fn init() {
    tracing_subscriber::registry()
        .with(build_filter())
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ログ初期化は1回しか呼べないため、フィルタ生成のみ確認
    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::new(DEFAULT_FILTER);
        assert!(filter.to_string().contains("warn"));
    }
}
