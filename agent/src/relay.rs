//! 位置中継エージェント
//!
//! ホストの `ready` を受けて位置取得のポーリングを開始し、取得した位置を固定小数点で
//! ウォッチへ送る。ウォッチからの確認応答（`appmessage`）でポーリングを永久に停止する。
//!
//! 状態はすべて `LocationRelayAgent` が所有し、イベントループ上でのみ更新する。
//! 位置取得・HTTPは別タスクで実行し、完了通知をチャネル経由でループへ戻す。
//! 送信は単一の送信タスクが発行順に処理する。
//!
//! ```text
//! Idle → Acquiring → (Delivered | Failed) → Idle
//! Idle/Acquiring → Dormant   (確認応答、以降遷移なし)
//! ```

use chrono::{DateTime, Utc};
use georelay_common::config::RelayConfig;
use georelay_common::error::{PositionError, RelayResult};
use georelay_common::protocol::{AppMessage, MessageKey, SubscribeRequest, SubscribeResponse};
use georelay_common::types::{Position, PositionOptions};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::channel::MessageChannel;
use crate::client::SubscriptionClient;
use crate::dst::ZoneSource;
use crate::events::HostEvent;
use crate::geonames::GeoNamesClient;
use crate::launcher::{settings_url, CommandLauncher, UrlLauncher};
use crate::position::PositionSource;
use crate::shutdown::ShutdownController;
use crate::timeline::{StaticTimelineToken, TimelineTokenSource};

/// エージェントの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// 取得待ち
    Idle,
    /// 位置取得中
    Acquiring,
    /// 確認応答済み（以降は何もしない）
    Dormant,
}

/// 別タスクからの完了通知
#[derive(Debug)]
enum Completion {
    Position(Result<Position, PositionError>),
    TimelineToken(RelayResult<String>),
    Subscribed(RelayResult<SubscribeResponse>),
    PlaceName(RelayResult<Option<String>>),
}

#[derive(Debug, Default)]
struct RelayState {
    pending: bool,
    dormant: bool,
    position: Option<Position>,
    timeline_token: Option<String>,
    subscribed: bool,
}

/// 位置中継エージェント
pub struct LocationRelayAgent {
    positions: Arc<dyn PositionSource>,
    channel: Arc<dyn MessageChannel>,
    options: PositionOptions,
    poll_interval: Duration,
    zone: ZoneSource,
    dst_correction: bool,
    clock: fn() -> DateTime<Utc>,
    user_token: Option<String>,
    subscription: Option<SubscriptionClient>,
    timeline: Option<Arc<dyn TimelineTokenSource>>,
    geonames: Option<GeoNamesClient>,
    settings: Option<(Url, Arc<dyn UrlLauncher>)>,
    timer: Option<Interval>,
    outbox: Option<mpsc::UnboundedSender<AppMessage>>,
    state: RelayState,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl LocationRelayAgent {
    /// 位置ソースとチャネルだけを持つエージェントを作成
    ///
    /// 任意機能は `with_*` で有効化する。
    pub fn new(positions: Arc<dyn PositionSource>, channel: Arc<dyn MessageChannel>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let config = RelayConfig::default();
        Self {
            positions,
            channel,
            options: config.position_options(),
            poll_interval: config.poll_interval(),
            zone: ZoneSource::Local,
            dst_correction: false,
            clock: Utc::now,
            user_token: None,
            subscription: None,
            timeline: None,
            geonames: None,
            settings: None,
            timer: None,
            outbox: None,
            state: RelayState::default(),
            completions_tx,
            completions_rx,
        }
    }

    /// 設定から全機能を組み立てる
    pub fn from_config(
        config: &RelayConfig,
        positions: Arc<dyn PositionSource>,
        channel: Arc<dyn MessageChannel>,
    ) -> RelayResult<Self> {
        config.validate()?;
        let mut agent = Self::new(positions, channel)
            .with_poll_interval(config.poll_interval())
            .with_position_options(config.position_options())
            .with_zone(ZoneSource::from_config(config.timezone.as_deref())?)
            .with_dst_correction(config.dst_correction);
        agent.user_token = config.user_token.clone();

        if let Some(subscription) = &config.subscription {
            let client = SubscriptionClient::new(&subscription.host, config.http_timeout())?;
            let timeline = StaticTimelineToken::new(subscription.timeline_token.clone());
            agent = agent.with_subscription(client, Arc::new(timeline));
        }
        if let Some(geonames) = &config.geonames {
            let client =
                GeoNamesClient::new(&geonames.host, &geonames.username, config.http_timeout())?;
            agent = agent.with_geonames(client);
        }
        if let (Some(settings), Some(token)) = (&config.settings, &config.user_token) {
            let url = settings_url(&settings.url, token)?;
            agent = agent.with_settings(url, Arc::new(CommandLauncher::new(&settings.opener)));
        }
        Ok(agent)
    }

    /// ポーリング間隔を設定
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// 位置取得オプションを設定
    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// オフセット計算に使うタイムゾーンを設定
    pub fn with_zone(mut self, zone: ZoneSource) -> Self {
        self.zone = zone;
        self
    }

    /// 夏時間補正の送信を切り替え
    pub fn with_dst_correction(mut self, enabled: bool) -> Self {
        self.dst_correction = enabled;
        self
    }

    /// 時刻取得関数を差し替え
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// アカウントトークンを設定
    pub fn with_user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(token.into());
        self
    }

    /// タイムライン購読を有効化
    pub fn with_subscription(
        mut self,
        client: SubscriptionClient,
        timeline: Arc<dyn TimelineTokenSource>,
    ) -> Self {
        self.subscription = Some(client);
        self.timeline = Some(timeline);
        self
    }

    /// ジオコーディングプロキシによる地名解決を有効化
    pub fn with_geonames(mut self, client: GeoNamesClient) -> Self {
        self.geonames = Some(client);
        self
    }

    /// 設定画面を有効化
    pub fn with_settings(mut self, url: Url, launcher: Arc<dyn UrlLauncher>) -> Self {
        self.settings = Some((url, launcher));
        self
    }

    /// 現在の状態
    pub fn state(&self) -> AgentState {
        if self.state.dormant {
            AgentState::Dormant
        } else if self.state.pending {
            AgentState::Acquiring
        } else {
            AgentState::Idle
        }
    }

    /// 位置取得中か
    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    /// 確認応答済みか
    pub fn is_dormant(&self) -> bool {
        self.state.dormant
    }

    /// ポーリングタイマーが動作中か
    pub fn is_polling(&self) -> bool {
        self.timer.is_some()
    }

    /// 直近に取得した位置
    pub fn last_position(&self) -> Option<Position> {
        self.state.position
    }

    /// 購読リクエストを発行済みか
    pub fn has_subscribed(&self) -> bool {
        self.state.subscribed
    }

    /// イベントループを実行
    ///
    /// シャットダウンが要求されるまで戻らない。ホストイベントのチャネルが閉じても、
    /// ポーリングと完了通知の処理は継続する。
    pub async fn run(mut self, mut events: mpsc::Receiver<HostEvent>, shutdown: ShutdownController) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            dst_correction = self.dst_correction,
            subscription = self.subscription.is_some(),
            geonames = self.geonames.is_some(),
            "Location relay agent started"
        );
        self.fetch_timeline_token();

        let mut events_open = true;
        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Location relay agent stopping");
                    break;
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        debug!("Host event channel closed");
                        events_open = false;
                    }
                },
                Some(completion) = self.completions_rx.recv() => self.handle_completion(completion),
                _ = next_tick(&mut self.timer) => {
                    self.acquire();
                }
            }
        }
    }

    /// ホストイベントを処理
    pub fn handle_event(&mut self, event: HostEvent) {
        debug!(event = event.name(), "Host event received");
        match event {
            HostEvent::Ready => self.start_polling(),
            HostEvent::AppMessage { .. } => self.acknowledge(),
            HostEvent::ShowConfiguration => self.show_configuration(),
        }
    }

    fn start_polling(&mut self) {
        if self.state.dormant {
            debug!("Ignoring ready: agent is dormant");
            return;
        }
        if self.timer.is_some() {
            debug!("Ignoring ready: already polling");
            return;
        }

        let mut timer = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);

        self.acquire();
    }

    /// 位置取得を1回試行する
    ///
    /// 取得中または確認応答済みなら何もせず `false` を返す。
    pub fn acquire(&mut self) -> bool {
        if self.state.dormant || self.state.pending {
            return false;
        }
        self.state.pending = true;

        let positions = Arc::clone(&self.positions);
        let options = self.options;
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let acquisition =
                tokio::spawn(async move { positions.current_position(options).await });
            // 位置ソースが異常終了しても取得中フラグを必ず解除する
            let result = acquisition.await.unwrap_or_else(|err| {
                Err(PositionError::PositionUnavailable(format!(
                    "position task failed: {err}"
                )))
            });
            let _ = completions.send(Completion::Position(result));
        });
        true
    }

    fn acknowledge(&mut self) {
        if self.state.dormant {
            return;
        }
        self.state.dormant = true;
        self.timer = None;
        info!("Watch acknowledged configuration, polling stopped");
    }

    fn show_configuration(&self) {
        let Some((url, launcher)) = self.settings.clone() else {
            debug!("No settings page configured");
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = launcher.open(&url).await {
                warn!(kind = err.kind(), error = %err, "Failed to open settings page");
            }
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Position(Ok(position)) => self.on_position(position),
            Completion::Position(Err(err)) => {
                self.state.pending = false;
                warn!(
                    code = err.code(),
                    message = err.message(),
                    "Position acquisition failed"
                );
            }
            Completion::TimelineToken(Ok(token)) => {
                debug!("Timeline token retrieved");
                self.state.timeline_token = Some(token);
                self.try_subscribe();
            }
            Completion::TimelineToken(Err(err)) => {
                warn!(kind = err.kind(), error = %err, "Timeline token unavailable");
            }
            Completion::Subscribed(Ok(response)) => {
                info!(geoname = ?response.location_geoname, "Subscribed to timeline");
                if let Some(name) = response.location_geoname.filter(|name| !name.is_empty()) {
                    self.deliver(AppMessage::place_name(name));
                }
            }
            Completion::Subscribed(Err(err)) => {
                warn!(kind = err.kind(), error = %err, "Subscribe request failed");
            }
            Completion::PlaceName(Ok(Some(name))) => self.deliver(AppMessage::place_name(name)),
            Completion::PlaceName(Ok(None)) => debug!("No nearby place name"),
            Completion::PlaceName(Err(err)) => {
                warn!(kind = err.kind(), error = %err, "Place name lookup failed");
            }
        }
    }

    fn on_position(&mut self, position: Position) {
        self.state.pending = false;
        self.state.position = Some(position);

        if self.state.dormant {
            debug!("Position acquired after acknowledgment, not relayed");
        } else {
            let mut message = AppMessage::geo(&position);
            if self.dst_correction {
                if let Some(minutes) = self.zone.dst_correction((self.clock)()) {
                    message = message.with_int(MessageKey::Dst, minutes);
                }
            }
            info!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Sending position to watch"
            );
            self.deliver(message);
            self.lookup_place_name(position);
        }

        self.try_subscribe();
    }

    fn lookup_place_name(&self, position: Position) {
        let Some(geonames) = self.geonames.clone() else {
            return;
        };
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = geonames
                .nearest_place_name(position.latitude, position.longitude)
                .await;
            let _ = completions.send(Completion::PlaceName(result));
        });
    }

    fn fetch_timeline_token(&self) {
        if self.subscription.is_none() {
            return;
        }
        let Some(timeline) = self.timeline.clone() else {
            return;
        };
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = timeline.timeline_token().await;
            let _ = completions.send(Completion::TimelineToken(result));
        });
    }

    fn try_subscribe(&mut self) {
        if self.state.subscribed {
            return;
        }
        let Some(client) = self.subscription.clone() else {
            return;
        };
        let (Some(position), Some(timeline_token)) =
            (self.state.position, self.state.timeline_token.clone())
        else {
            return;
        };
        self.state.subscribed = true;
        let Some(user_token) = self.user_token.clone() else {
            warn!("Subscription configured without user token, skipping subscribe");
            return;
        };

        let request = SubscribeRequest {
            location_lat: position.latitude,
            location_lon: position.longitude,
            tz_offset: Some(self.zone.utc_offset_minutes((self.clock)())),
            user_token,
            timeline_token,
        };
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = client.subscribe(&request).await;
            let _ = completions.send(Completion::Subscribed(result));
        });
    }

    fn deliver(&mut self, message: AppMessage) {
        let outbox = self
            .outbox
            .get_or_insert_with(|| spawn_writer(Arc::clone(&self.channel)));
        if outbox.send(message).is_err() {
            warn!("Message writer stopped, message dropped");
        }
    }
}

/// チャネルへの送信を発行順に行うタスクを起動
///
/// 送信側がすべてドロップされると、残りを送り切ってから終了する。
fn spawn_writer(channel: Arc<dyn MessageChannel>) -> mpsc::UnboundedSender<AppMessage> {
    let (outbox, mut messages) = mpsc::unbounded_channel::<AppMessage>();
    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            let keys: Vec<_> = message.keys().map(MessageKey::as_str).collect();
            match channel.send(&message).await {
                Ok(()) => debug!(keys = ?keys, "Message sent"),
                Err(err) => warn!(kind = err.kind(), error = %err, keys = ?keys, "Message send failed"),
            }
        }
    });
    outbox
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
