//! ウォッチへのメッセージチャネル
//!
//! 実際の端末間ワイヤーエンコーディングはブリッジ側の責務。
//! ここでは1メッセージを1行のJSONオブジェクトとして書き出す。

use async_trait::async_trait;
use georelay_common::error::{CommonError, RelayError, RelayResult};
use georelay_common::protocol::AppMessage;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// ウォッチへメッセージを送るチャネル
///
/// 成功は「チャネルが受理した」ことのみを意味し、ウォッチの受信確認ではない。
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// メッセージを1単位として送信
    async fn send(&self, message: &AppMessage) -> RelayResult<()>;
}

/// JSON Lines 形式で書き出すチャネル
pub struct JsonLinesChannel<W> {
    writer: Mutex<W>,
}

impl JsonLinesChannel<tokio::io::Stdout> {
    /// 標準出力へ書き出すチャネル
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> JsonLinesChannel<W> {
    /// 任意のライターから作成
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// ライターを取り出す
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> MessageChannel for JsonLinesChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, message: &AppMessage) -> RelayResult<()> {
        let mut line = serde_json::to_vec(message).map_err(CommonError::from)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|err| RelayError::MessageDelivery(err.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|err| RelayError::MessageDelivery(err.to_string()))
    }
}
