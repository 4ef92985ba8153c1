//! Geo Relay Common
//!
//! エージェントとテストで共有する型定義・プロトコル・設定・エラー

#![warn(missing_docs)]

/// 設定構造体
pub mod config;

/// エラー型
pub mod error;

/// ウォッチ／リモートサービスとの通信メッセージ
pub mod protocol;

/// コアデータ型（位置情報・固定小数点角度）
pub mod types;
