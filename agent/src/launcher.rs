//! 設定画面の起動
//!
//! 設定ページURLにアカウントトークンを付与し、外部コマンドで開く。

use async_trait::async_trait;
use georelay_common::error::{CommonError, RelayError, RelayResult};
use reqwest::Url;
use tokio::process::Command;
use tracing::info;

/// 外部URLを開くランチャー
#[async_trait]
pub trait UrlLauncher: Send + Sync {
    /// URLを開く
    async fn open(&self, url: &Url) -> RelayResult<()>;
}

/// 設定ページのURLを組み立てる（`?token=...` を付与）
pub fn settings_url(base: &str, user_token: &str) -> RelayResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|err| CommonError::Config(format!("Invalid settings URL '{base}': {err}")))?;
    url.query_pairs_mut().append_pair("token", user_token);
    Ok(url)
}

/// 外部コマンド（`xdg-open` 等）でURLを開くランチャー
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
}

impl CommandLauncher {
    /// 新しいランチャーを作成
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl UrlLauncher for CommandLauncher {
    async fn open(&self, url: &Url) -> RelayResult<()> {
        info!(program = %self.program, url = %url, "Opening settings page");
        let status = Command::new(&self.program)
            .arg(url.as_str())
            .status()
            .await
            .map_err(|err| RelayError::Launch(format!("{}: {err}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(RelayError::Launch(format!("{} exited with {status}", self.program)))
        }
    }
}
