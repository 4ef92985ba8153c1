//! 位置ソース
//!
//! `PositionSource` がプラットフォームの測位機能の境界になる。
//! `CachedPositionSource` はタイムアウトとキャッシュ許容時間（maximum age）を適用するラッパー。

use async_trait::async_trait;
use chrono::Utc;
use georelay_common::config::FixedPositionConfig;
use georelay_common::error::PositionError;
use georelay_common::types::{Position, PositionOptions};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// 現在位置を提供するソース
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// 現在位置を取得する
    ///
    /// `options.maximum_age` 以内のキャッシュ位置を返してもよい。
    async fn current_position(&self, options: PositionOptions) -> Result<Position, PositionError>;
}

#[async_trait]
impl<S: PositionSource + ?Sized> PositionSource for Arc<S> {
    async fn current_position(&self, options: PositionOptions) -> Result<Position, PositionError> {
        (**self).current_position(options).await
    }
}

/// 設定された固定位置を返すソース（据え置き端末向け）
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPositionSource {
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
}

impl FixedPositionSource {
    /// 新しい固定位置ソースを作成
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    /// 設定から作成
    pub fn from_config(config: &FixedPositionConfig) -> Self {
        Self {
            latitude: config.latitude,
            longitude: config.longitude,
            accuracy: config.accuracy,
        }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(&self, _options: PositionOptions) -> Result<Position, PositionError> {
        let mut position = Position::new(self.latitude, self.longitude);
        position.accuracy = self.accuracy;
        if !position.is_valid() {
            return Err(PositionError::PositionUnavailable(format!(
                "invalid fixed position ({}, {})",
                self.latitude, self.longitude
            )));
        }
        Ok(position)
    }
}

/// タイムアウトとキャッシュを適用する位置ソース
pub struct CachedPositionSource<S> {
    inner: S,
    last: Mutex<Option<Position>>,
}

impl<S: PositionSource> CachedPositionSource<S> {
    /// 新しいラッパーを作成
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }

    /// 直近に取得した位置
    pub async fn last_position(&self) -> Option<Position> {
        *self.last.lock().await
    }
}

#[async_trait]
impl<S: PositionSource> PositionSource for CachedPositionSource<S> {
    async fn current_position(&self, options: PositionOptions) -> Result<Position, PositionError> {
        if let Some(cached) = *self.last.lock().await {
            let age = cached.age_at(Utc::now());
            if age <= options.maximum_age {
                debug!(age_ms = age.as_millis() as u64, "Using cached position");
                return Ok(cached);
            }
        }

        let position = tokio::time::timeout(options.timeout, self.inner.current_position(options))
            .await
            .map_err(|_| {
                PositionError::Timeout(format!(
                    "no position within {}ms",
                    options.timeout.as_millis()
                ))
            })??;

        *self.last.lock().await = Some(position);
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
        age: chrono::Duration,
    }

    impl CountingSource {
        fn new(delay: Duration, age: chrono::Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                age,
            }
        }
    }

    #[async_trait]
    impl PositionSource for CountingSource {
        async fn current_position(
            &self,
            _options: PositionOptions,
        ) -> Result<Position, PositionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(Position::new(10.0, 20.0).at(Utc::now() - self.age))
        }
    }

    fn options(timeout_ms: u64, maximum_age_ms: u64) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(timeout_ms),
            maximum_age: Duration::from_millis(maximum_age_ms),
        }
    }

    #[tokio::test]
    async fn test_fixed_source_returns_configured_position() {
        let source = FixedPositionSource::from_config(&FixedPositionConfig {
            latitude: 43.6532,
            longitude: -79.3832,
            accuracy: Some(25.0),
        });

        let position = source.current_position(PositionOptions::default()).await.unwrap();
        assert_eq!(position.latitude, 43.6532);
        assert_eq!(position.longitude, -79.3832);
        assert_eq!(position.accuracy, Some(25.0));
    }

    #[tokio::test]
    async fn test_fixed_source_rejects_invalid_position() {
        let source = FixedPositionSource::new(120.0, 0.0);
        let err = source
            .current_position(PositionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), 2);
    }

    #[tokio::test]
    async fn test_cached_source_reuses_fresh_position() {
        let source = CachedPositionSource::new(CountingSource::new(
            Duration::ZERO,
            chrono::Duration::zero(),
        ));

        source.current_position(options(1000, 60_000)).await.unwrap();
        source.current_position(options(1000, 60_000)).await.unwrap();

        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
        assert!(source.last_position().await.is_some());
    }

    #[tokio::test]
    async fn test_cached_source_refreshes_stale_position() {
        // ソースが返す位置が既に2分前のもの
        let source = CachedPositionSource::new(CountingSource::new(
            Duration::ZERO,
            chrono::Duration::minutes(2),
        ));

        source.current_position(options(1000, 60_000)).await.unwrap();
        source.current_position(options(1000, 60_000)).await.unwrap();

        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_source_times_out() {
        let source = CachedPositionSource::new(CountingSource::new(
            Duration::from_secs(20),
            chrono::Duration::zero(),
        ));

        let err = source
            .current_position(options(15_000, 60_000))
            .await
            .unwrap_err();

        assert_eq!(err.code(), 3);
        assert!(source.last_position().await.is_none());
    }
}
