/// ログ基盤モジュール
///
/// Lambda（submit_feedback）はCloudWatch Logs向けのJSON、
/// deploy_siteはターミナル向けの1行形式で出力する。
/// どちらもレベルは`RUST_LOG`で指定し、未指定の場合はinfo。
use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

const DEFAULT_LEVEL: &str = "info";

/// ログの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 1イベント1行のJSON（フィールドはトップレベルに展開）
    Json,
    /// 人間向けの簡易形式
    Compact,
}

/// Lambda向けにJSON形式で初期化する
pub fn init_logging() {
    init_with(LogFormat::Json);
}

/// CLI向けに簡易形式で初期化する
pub fn init_cli_logging() {
    init_with(LogFormat::Compact);
}

/// 指定形式でグローバルサブスクライバーを設定する
///
/// プロセス内で最初の1回だけ有効で、以降の呼び出しは形式に関わらず無視される。
pub fn init_with(format: LogFormat) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(DEFAULT_LEVEL));
        match format {
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true)
                        .flatten_event(true)
                        .with_current_span(false),
                )
                .init(),
            LogFormat::Compact => registry
                .with(tracing_subscriber::fmt::layer().with_target(false).compact())
                .init(),
        }
    });
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// テスト出力にログを流す（`cargo test -- --nocapture`で確認）
#[cfg(test)]
pub(crate) fn init_test_logging() {
    static TEST_INIT: Once = Once::new();

    TEST_INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(env_filter("debug"))
            .with(tracing_subscriber::fmt::layer().with_test_writer().compact())
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_logging_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!(feedback_id = "fb-123", "ログ初期化後の出力");
    }

    #[test]
    fn test_env_filter_default_level() {
        let filter = env_filter("warn");
        // RUST_LOGの有無に関わらず何らかのフィルタが構築できる
        assert!(!filter.to_string().is_empty());
    }
}
