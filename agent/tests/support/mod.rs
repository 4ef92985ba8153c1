//! 統合テスト用のスタブ実装

#![allow(dead_code)]

use async_trait::async_trait;
use georelay_agent::channel::MessageChannel;
use georelay_agent::launcher::UrlLauncher;
use georelay_agent::position::PositionSource;
use georelay_common::error::{PositionError, RelayResult};
use georelay_common::protocol::AppMessage;
use georelay_common::types::{Position, PositionOptions};
use reqwest::Url;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// テスト用の座標（トロント）
pub const TORONTO: (f64, f64) = (43.6532, -79.3832);

/// 応答を順に返し、尽きたら既定位置を返す位置ソース
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Position, PositionError>>>,
    fallback: Position,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Position, PositionError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: Position::new(TORONTO.0, TORONTO.1),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn toronto() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionSource for ScriptedSource {
    async fn current_position(&self, _options: PositionOptions) -> Result<Position, PositionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(self.fallback))
    }
}

/// 送信メッセージをチャネルへ流す
pub struct RecordingChannel {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl RecordingChannel {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<AppMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    async fn send(&self, message: &AppMessage) -> RelayResult<()> {
        let _ = self.tx.send(message.clone());
        Ok(())
    }
}

/// 開いたURLを記録するランチャー
#[derive(Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<Url>>,
}

impl RecordingLauncher {
    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl UrlLauncher for RecordingLauncher {
    async fn open(&self, url: &Url) -> RelayResult<()> {
        self.opened.lock().unwrap().push(url.clone());
        Ok(())
    }
}

/// 次のメッセージを待つ（タイムアウトでパニック）
pub async fn next_message(rx: &mut mpsc::UnboundedReceiver<AppMessage>) -> AppMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("message channel closed")
}

/// 指定時間内にメッセージが届かないことを確認
pub async fn assert_no_message(rx: &mut mpsc::UnboundedReceiver<AppMessage>, wait: Duration) {
    if let Ok(Some(message)) = tokio::time::timeout(wait, rx.recv()).await {
        panic!("unexpected message: {message:?}");
    }
}
