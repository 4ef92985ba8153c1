//! run サブコマンド
//!
//! 位置中継エージェントを起動します。メッセージは標準出力へJSON Linesで書き出されます。

use crate::channel::JsonLinesChannel;
use crate::events::{forward_lines, HostEvent};
use crate::position::{CachedPositionSource, FixedPositionSource};
use crate::relay::LocationRelayAgent;
use crate::shutdown::ShutdownController;
use anyhow::Context;
use clap::Args;
use georelay_common::config::RelayConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// ホストイベントチャネルの容量
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// run サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (TOML/JSON/YAML)
    #[arg(short, long, env = "GEORELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read host events (JSON lines) from stdin
    #[arg(long, default_value_t = false)]
    pub stdin_events: bool,
}

/// run コマンドを実行
pub async fn execute(args: &RunArgs) -> Result<(), anyhow::Error> {
    let config = RelayConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;

    let fixed = config
        .position
        .as_ref()
        .context("No position source configured (set [position] latitude/longitude)")?;
    let positions = Arc::new(CachedPositionSource::new(FixedPositionSource::from_config(
        fixed,
    )));
    let channel = Arc::new(JsonLinesChannel::stdout());
    let agent = LocationRelayAgent::from_config(&config, positions, channel)?;

    let (sender, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let shutdown = ShutdownController::new();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C");
                signal_shutdown.request_shutdown();
            }
            Err(err) => warn!(error = %err, "Failed to listen for Ctrl-C"),
        }
    });

    sender
        .send(HostEvent::Ready)
        .await
        .context("Host event channel closed")?;

    if args.stdin_events {
        let reader = BufReader::new(tokio::io::stdin());
        tokio::spawn(forward_lines(reader, sender));
    } else {
        drop(sender);
    }

    agent.run(events, shutdown).await;
    Ok(())
}
