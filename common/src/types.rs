//! 共通型定義
//!
//! Position, PositionOptions と固定小数点角度のエンコード

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ウォッチ側の一周を表す固定小数点角度（`TRIG_MAX_ANGLE`）
pub const TRIG_MAX_ANGLE: i32 = 65536;

/// 位置取得のデフォルトタイムアウト（ミリ秒）
pub const DEFAULT_POSITION_TIMEOUT_MS: u64 = 15_000;

/// キャッシュ済み位置を許容する最大経過時間（ミリ秒）
pub const DEFAULT_POSITION_MAXIMUM_AGE_MS: u64 = 60_000;

/// Encode degrees into the watch's 16-bit angle representation.
///
/// Halves round toward positive infinity (`floor(x + 0.5)`).
pub fn encode_angle(degrees: f64) -> i32 {
    (degrees * f64::from(TRIG_MAX_ANGLE) / 360.0 + 0.5).floor() as i32
}

/// Decode a fixed-point angle back into degrees.
pub fn decode_angle(encoded: i32) -> f64 {
    f64::from(encoded) * 360.0 / f64::from(TRIG_MAX_ANGLE)
}

/// 測位結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// 緯度（度）
    pub latitude: f64,
    /// 経度（度）
    pub longitude: f64,
    /// 精度（メートル、オプション）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// 取得時刻
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// 現在時刻で位置を作成
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp: Utc::now(),
        }
    }

    /// 精度を設定
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// 取得時刻を設定
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 緯度の固定小数点表現
    pub fn encoded_latitude(&self) -> i32 {
        encode_angle(self.latitude)
    }

    /// 経度の固定小数点表現
    pub fn encoded_longitude(&self) -> i32 {
        encode_angle(self.longitude)
    }

    /// `now` 時点での経過時間（未来の時刻はゼロ扱い）
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }

    /// 緯度経度が有効範囲内か
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// 位置取得リクエストのオプション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// 取得を諦めるまでの時間
    pub timeout: Duration,
    /// 成功として扱うキャッシュ位置の最大経過時間
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_POSITION_TIMEOUT_MS),
            maximum_age: Duration::from_millis(DEFAULT_POSITION_MAXIMUM_AGE_MS),
        }
    }
}
