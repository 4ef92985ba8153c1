//! Configuration helpers via environment variables
//!
//! Reads environment variables with fallback to a secondary (generic) name,
//! e.g. `GEORELAY_LOG_LEVEL` before `RUST_LOG`.

use std::path::PathBuf;

/// Get an environment variable with fallback to a secondary name
///
/// If the primary variable is set, returns its value.
/// Otherwise returns the value of the fallback variable, if any.
pub fn get_env_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    if let Ok(val) = std::env::var(primary) {
        return Some(val);
    }
    std::env::var(fallback).ok()
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(primary: &str, fallback: &str, default: &str) -> String {
    get_env_with_fallback(primary, fallback).unwrap_or_else(|| default.to_string())
}

/// ログレベル（`GEORELAY_LOG_LEVEL`、未設定なら `RUST_LOG`、どちらもなければ `info`）
pub fn log_level() -> String {
    get_env_with_fallback_or("GEORELAY_LOG_LEVEL", "RUST_LOG", "info")
}

/// ファイルログの出力先（`GEORELAY_LOG_DIR`、未設定ならファイル出力なし）
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("GEORELAY_LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}
