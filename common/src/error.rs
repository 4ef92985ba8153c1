//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! 実行時エラーはすべてログ出力して破棄する方針のため、`RelayError::kind()` で
//! ログ用の安定したラベルを提供する。

use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<config::ConfigError> for CommonError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// 位置取得エラー
///
/// コードはブラウザのGeolocation APIと同じ（1: 権限なし, 2: 取得不可, 3: タイムアウト）。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PositionError {
    /// Permission denied by the platform
    #[error("PERMISSION_DENIED: {0}")]
    PermissionDenied(String),

    /// No position could be determined
    #[error("POSITION_UNAVAILABLE: {0}")]
    PositionUnavailable(String),

    /// The request did not complete within the timeout
    #[error("TIMEOUT: {0}")]
    Timeout(String),
}

impl PositionError {
    /// 数値エラーコード
    pub fn code(&self) -> u8 {
        match self {
            Self::PermissionDenied(_) => 1,
            Self::PositionUnavailable(_) => 2,
            Self::Timeout(_) => 3,
        }
    }

    /// エラーメッセージ本文
    pub fn message(&self) -> &str {
        match self {
            Self::PermissionDenied(message)
            | Self::PositionUnavailable(message)
            | Self::Timeout(message) => message,
        }
    }
}

/// Relay agent error type
#[derive(Debug, Error)]
pub enum RelayError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Geolocation failure or timeout
    #[error("Position unavailable: {0}")]
    PositionUnavailable(#[from] PositionError),

    /// The message channel rejected a send
    #[error("Message delivery failed: {0}")]
    MessageDelivery(String),

    /// HTTP non-200 or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Timeline token could not be obtained
    #[error("Timeline token unavailable: {0}")]
    TokenUnavailable(String),

    /// External URL could not be opened
    #[error("Failed to open URL: {0}")]
    Launch(String),
}

impl RelayError {
    /// ログ用の安定したエラー種別
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Common(_) => "common",
            Self::PositionUnavailable(_) => "position_unavailable",
            Self::MessageDelivery(_) => "message_delivery_failure",
            Self::Network(_) => "network_failure",
            Self::TokenUnavailable(_) => "token_unavailable",
            Self::Launch(_) => "launch_failure",
        }
    }
}

/// Result type alias (Common)
pub type CommonResult<T> = Result<T, CommonError>;

/// Result type alias (Relay)
pub type RelayResult<T> = Result<T, RelayError>;
