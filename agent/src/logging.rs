//! ロギング初期化
//!
//! 標準エラーへの人間向け出力と、`GEORELAY_LOG_DIR` 指定時のJSONファイル出力。
//! 標準出力はメッセージチャネルが使うため、ログは書き込まない。

use crate::config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// ログファイル名のプレフィックス
pub const LOG_FILE_PREFIX: &str = "georelay.log";

/// ロギングを初期化
///
/// ファイル出力を有効にした場合、戻り値のガードをプロセス終了まで保持すること。
pub fn init() -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_new(config::log_level())
        .or_else(|_| EnvFilter::try_new("info"))?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match config::log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
