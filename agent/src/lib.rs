//! Geo Relay Agent
//!
//! スマートフォン側で動作し、現在位置をウォッチアプリへ中継するエージェント

#![warn(missing_docs)]

/// 位置中継エージェント本体（ポーリング・送信・購読）
pub mod relay;

/// 位置ソース
pub mod position;

/// ウォッチへのメッセージチャネル
pub mod channel;

/// タイムライン購読クライアント
pub mod client;

/// ジオコーディングプロキシクライアント
pub mod geonames;

/// タイムライントークン取得
pub mod timeline;

/// 設定画面の起動
pub mod launcher;

/// 夏時間補正・タイムゾーンオフセット
pub mod dst;

/// ホストイベント
pub mod events;

/// 環境変数ヘルパー
pub mod config;

/// ロギング初期化
pub mod logging;

/// 協調シャットダウン
pub mod shutdown;

/// CLIインターフェース
pub mod cli;

pub use relay::{AgentState, LocationRelayAgent};
