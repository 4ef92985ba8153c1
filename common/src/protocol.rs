//! 通信プロトコル定義
//!
//! エージェント↔ウォッチ間のメッセージと、購読エンドポイント・ジオコーディングプロキシの
//! リクエスト／レスポンス

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Position;

/// ウォッチへ送るメッセージのキー
///
/// 判別値はウォッチ側ファームウェアの列挙順と一致させること。
/// 並び順（`Ord`）も判別値に従う。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MessageKey {
    /// 夏時間補正（分）
    #[serde(rename = "AM_DST")]
    Dst = 0,
    /// 緯度（固定小数点）
    #[serde(rename = "AM_GEO_LAT")]
    GeoLat = 1,
    /// 経度（固定小数点）
    #[serde(rename = "AM_GEO_LON")]
    GeoLon = 2,
    /// 地名
    #[serde(rename = "AM_GEO_NAME")]
    GeoName = 3,
}

impl MessageKey {
    /// 文字列表現
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dst => "AM_DST",
            Self::GeoLat => "AM_GEO_LAT",
            Self::GeoLon => "AM_GEO_LON",
            Self::GeoName => "AM_GEO_NAME",
        }
    }
}

/// メッセージの値
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageValue {
    /// 符号付き整数
    Int(i32),
    /// 文字列
    Text(String),
}

/// ウォッチへ送る1件のメッセージ
///
/// 1単位としてまとめて送信される。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AppMessage {
    fields: BTreeMap<MessageKey, MessageValue>,
}

impl AppMessage {
    /// 空のメッセージを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 緯度経度を固定小数点で格納したメッセージ
    pub fn geo(position: &Position) -> Self {
        Self::new()
            .with_int(MessageKey::GeoLat, position.encoded_latitude())
            .with_int(MessageKey::GeoLon, position.encoded_longitude())
    }

    /// 地名のみを格納したメッセージ
    pub fn place_name(name: impl Into<String>) -> Self {
        Self::new().with_text(MessageKey::GeoName, name)
    }

    /// 整数フィールドを追加
    pub fn with_int(mut self, key: MessageKey, value: i32) -> Self {
        self.fields.insert(key, MessageValue::Int(value));
        self
    }

    /// 文字列フィールドを追加
    pub fn with_text(mut self, key: MessageKey, value: impl Into<String>) -> Self {
        self.fields.insert(key, MessageValue::Text(value.into()));
        self
    }

    /// フィールドを取得
    pub fn get(&self, key: MessageKey) -> Option<&MessageValue> {
        self.fields.get(&key)
    }

    /// 整数フィールドを取得
    pub fn get_int(&self, key: MessageKey) -> Option<i32> {
        match self.fields.get(&key) {
            Some(MessageValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// 文字列フィールドを取得
    pub fn get_text(&self, key: MessageKey) -> Option<&str> {
        match self.fields.get(&key) {
            Some(MessageValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// キーを含むか
    pub fn contains(&self, key: MessageKey) -> bool {
        self.fields.contains_key(&key)
    }

    /// フィールド数
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// フィールドが空か
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 含まれるキー一覧（ID順）
    pub fn keys(&self) -> impl Iterator<Item = MessageKey> + '_ {
        self.fields.keys().copied()
    }
}

/// 購読リクエスト（`POST {host}/subscribe`）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscribeRequest {
    /// 緯度（度）
    pub location_lat: f64,
    /// 経度（度）
    pub location_lon: f64,
    /// タイムゾーンオフセット（分、UTC − ローカル）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz_offset: Option<i32>,
    /// アカウントトークン
    pub user_token: String,
    /// タイムライントークン
    pub timeline_token: String,
}

/// 購読レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribeResponse {
    /// 解決済みの地名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_geoname: Option<String>,
}

/// `findNearbyPlaceNameJSON` のレスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoNamesResponse {
    /// 近傍地名（近い順）
    #[serde(default)]
    pub geonames: Vec<GeoName>,
}

/// 近傍地名エントリ
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoName {
    /// 地名
    pub name: String,
    /// 第1行政区画コード（州・県など）
    #[serde(rename = "adminCode1", default, skip_serializing_if = "Option::is_none")]
    pub admin_code1: Option<String>,
}

impl GeoName {
    /// 表示用の地名（`name, adminCode1`）
    pub fn display_name(&self) -> String {
        match self.admin_code1.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => format!("{}, {}", self.name, code),
            _ => self.name.clone(),
        }
    }
}

impl GeoNamesResponse {
    /// 最も近い地名の表示名
    pub fn nearest_place_name(&self) -> Option<String> {
        self.geonames.first().map(GeoName::display_name)
    }
}
