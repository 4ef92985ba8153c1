//! ホストイベント
//!
//! ホストから届くシグナル（ready / appmessage / showConfiguration）と、
//! JSON Lines 形式の入力からイベントを読み取るリーダー。

use georelay_common::error::{CommonError, CommonResult};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// ホストイベント
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event")]
pub enum HostEvent {
    /// 起動完了
    #[serde(rename = "ready")]
    Ready,
    /// ウォッチからのメッセージ（設定受信の確認応答）
    #[serde(rename = "appmessage")]
    AppMessage {
        /// 受信したペイロード
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// 設定画面の表示要求
    #[serde(rename = "showConfiguration")]
    ShowConfiguration,
}

impl HostEvent {
    /// ログ用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::AppMessage { .. } => "appmessage",
            Self::ShowConfiguration => "showConfiguration",
        }
    }

    /// 1行をパース（空行は `None`）
    pub fn parse_line(line: &str) -> CommonResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(line)
            .map(Some)
            .map_err(CommonError::from)
    }
}

/// 入力から1行ずつイベントを読み取り、チャネルへ転送する
///
/// 入力の終端、または受信側が閉じた時点で終了する。不正な行はログ出力して読み飛ばす。
pub async fn forward_lines<R>(reader: R, sender: mpsc::Sender<HostEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Host event input closed");
                return;
            }
            Err(err) => {
                warn!(error = %err, "Failed to read host event input");
                return;
            }
        };

        match HostEvent::parse_line(&line) {
            Ok(Some(event)) => {
                if sender.send(event).await.is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, line = %line, "Ignoring malformed host event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_events() {
        assert_eq!(
            HostEvent::parse_line(r#"{"event":"ready"}"#).unwrap(),
            Some(HostEvent::Ready)
        );
        assert_eq!(
            HostEvent::parse_line(r#"{"event":"showConfiguration"}"#).unwrap(),
            Some(HostEvent::ShowConfiguration)
        );
        assert_eq!(
            HostEvent::parse_line(r#"{"event":"appmessage","payload":{"ack":1}}"#).unwrap(),
            Some(HostEvent::AppMessage {
                payload: json!({"ack": 1})
            })
        );
    }

    #[test]
    fn test_parse_appmessage_without_payload() {
        let event = HostEvent::parse_line(r#"{"event":"appmessage"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.name(), "appmessage");
    }

    #[test]
    fn test_parse_blank_and_invalid() {
        assert_eq!(HostEvent::parse_line("   ").unwrap(), None);
        assert!(HostEvent::parse_line(r#"{"event":"unknown"}"#).is_err());
        assert!(HostEvent::parse_line("ready").is_err());
    }

    #[tokio::test]
    async fn test_forward_lines_skips_malformed() {
        let input = b"{\"event\":\"ready\"}\nnot json\n\n{\"event\":\"appmessage\"}\n";
        let (tx, mut rx) = mpsc::channel(8);

        forward_lines(&input[..], tx).await;

        assert_eq!(rx.recv().await, Some(HostEvent::Ready));
        assert_eq!(
            rx.recv().await,
            Some(HostEvent::AppMessage {
                payload: serde_json::Value::Null
            })
        );
        assert_eq!(rx.recv().await, None);
    }
}
