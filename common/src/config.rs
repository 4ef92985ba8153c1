//! 設定管理
//!
//! RelayConfig と各機能（購読・ジオコーディング・設定画面）の設定構造体

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CommonError, CommonResult};
use crate::types::{PositionOptions, DEFAULT_POSITION_MAXIMUM_AGE_MS, DEFAULT_POSITION_TIMEOUT_MS};

/// 環境変数のプレフィックス（例: `GEORELAY_SUBSCRIPTION__HOST`）
pub const ENV_PREFIX: &str = "GEORELAY";

/// リレーエージェント設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    /// 位置取得のポーリング間隔（ミリ秒）(デフォルト: 1000)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// 位置取得のタイムアウト（ミリ秒）(デフォルト: 15000)
    #[serde(default = "default_position_timeout_ms")]
    pub position_timeout_ms: u64,

    /// キャッシュ位置を許容する最大経過時間（ミリ秒）(デフォルト: 60000)
    #[serde(default = "default_position_maximum_age_ms")]
    pub position_maximum_age_ms: u64,

    /// 夏時間補正を送信するか (デフォルト: false)
    #[serde(default)]
    pub dst_correction: bool,

    /// タイムゾーン名（IANA、未設定ならホストのローカルタイムゾーン）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// アカウントトークン（購読・設定画面で使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,

    /// 固定位置（位置ソース）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<FixedPositionConfig>,

    /// タイムライン購読
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionConfig>,

    /// ジオコーディングプロキシ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geonames: Option<GeoNamesConfig>,

    /// 設定画面
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsConfig>,

    /// HTTPリクエストのタイムアウト（秒）(デフォルト: 30)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_position_timeout_ms() -> u64 {
    DEFAULT_POSITION_TIMEOUT_MS
}

fn default_position_maximum_age_ms() -> u64 {
    DEFAULT_POSITION_MAXIMUM_AGE_MS
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            position_timeout_ms: default_position_timeout_ms(),
            position_maximum_age_ms: default_position_maximum_age_ms(),
            dst_correction: false,
            timezone: None,
            user_token: None,
            position: None,
            subscription: None,
            geonames: None,
            settings: None,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// 固定位置設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedPositionConfig {
    /// 緯度（度）
    pub latitude: f64,
    /// 経度（度）
    pub longitude: f64,
    /// 精度（メートル）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// タイムライン購読設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// 購読サービスのベースURL（`{host}/subscribe` にPOST）
    pub host: String,
    /// プラットフォーム発行のタイムライントークン
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_token: Option<String>,
}

/// ジオコーディングプロキシ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoNamesConfig {
    /// プロキシのベースURL (デフォルト: "http://api.geonames.org")
    #[serde(default = "default_geonames_host")]
    pub host: String,
    /// GeoNamesユーザー名
    pub username: String,
}

fn default_geonames_host() -> String {
    "http://api.geonames.org".to_string()
}

/// 設定画面の設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsConfig {
    /// 設定ページURL（`token` クエリが付与される）
    pub url: String,
    /// URLを開くコマンド (デフォルト: "xdg-open")
    #[serde(default = "default_opener")]
    pub opener: String,
}

fn default_opener() -> String {
    "xdg-open".to_string()
}

impl RelayConfig {
    /// 設定ファイル（任意）と環境変数から読み込む
    ///
    /// 環境変数はファイルより優先される。ネストしたキーは `__` で区切る。
    pub fn load(path: Option<&Path>) -> CommonResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値の整合性を検証
    pub fn validate(&self) -> CommonResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(CommonError::Validation(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.position_timeout_ms == 0 {
            return Err(CommonError::Validation(
                "position_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(position) = &self.position {
            if !(-90.0..=90.0).contains(&position.latitude) {
                return Err(CommonError::Validation(format!(
                    "latitude out of range: {}",
                    position.latitude
                )));
            }
            if !(-180.0..=180.0).contains(&position.longitude) {
                return Err(CommonError::Validation(format!(
                    "longitude out of range: {}",
                    position.longitude
                )));
            }
        }
        if self.subscription.is_some() && self.user_token.is_none() {
            return Err(CommonError::Validation(
                "subscription requires user_token".to_string(),
            ));
        }
        if self.settings.is_some() && self.user_token.is_none() {
            return Err(CommonError::Validation(
                "settings requires user_token".to_string(),
            ));
        }
        Ok(())
    }

    /// ポーリング間隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 位置取得オプション
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(self.position_timeout_ms),
            maximum_age: Duration::from_millis(self.position_maximum_age_ms),
        }
    }

    /// HTTPタイムアウト
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
