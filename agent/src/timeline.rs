//! タイムライントークン取得

use async_trait::async_trait;
use georelay_common::error::{RelayError, RelayResult};

/// プラットフォーム発行のタイムライントークンを取得するソース
#[async_trait]
pub trait TimelineTokenSource: Send + Sync {
    /// トークンを取得（エージェント起動時に1回だけ呼ばれる）
    async fn timeline_token(&self) -> RelayResult<String>;
}

/// 設定済みのトークンを返すソース
#[derive(Debug, Clone, Default)]
pub struct StaticTimelineToken {
    token: Option<String>,
}

impl StaticTimelineToken {
    /// 新しいソースを作成
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TimelineTokenSource for StaticTimelineToken {
    async fn timeline_token(&self) -> RelayResult<String> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(RelayError::TokenUnavailable(
                "no timeline token configured".to_string(),
            )),
        }
    }
}
