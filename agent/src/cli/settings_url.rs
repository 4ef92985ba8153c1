//! settings-url サブコマンド
//!
//! 設定ページのURL（アカウントトークン付き）を表示します。

use crate::launcher::settings_url;
use anyhow::Context;
use clap::Args;
use georelay_common::config::RelayConfig;
use std::path::PathBuf;

/// settings-url サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct SettingsUrlArgs {
    /// Configuration file (TOML/JSON/YAML)
    #[arg(short, long, env = "GEORELAY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// settings-url コマンドを実行
pub fn execute(args: &SettingsUrlArgs) -> Result<String, anyhow::Error> {
    let config = RelayConfig::load(args.config.as_deref())?;
    resolve(&config)
}

fn resolve(config: &RelayConfig) -> Result<String, anyhow::Error> {
    let settings = config
        .settings
        .as_ref()
        .context("No settings page configured")?;
    let token = config
        .user_token
        .as_deref()
        .context("No user token configured")?;
    Ok(settings_url(&settings.url, token)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use georelay_common::config::SettingsConfig;

    #[test]
    fn test_resolve_settings_url() {
        let config = RelayConfig {
            user_token: Some("user-1".to_string()),
            settings: Some(SettingsConfig {
                url: "https://example.com/settings".to_string(),
                opener: "xdg-open".to_string(),
            }),
            ..RelayConfig::default()
        };

        assert_eq!(
            resolve(&config).unwrap(),
            "https://example.com/settings?token=user-1"
        );
    }

    #[test]
    fn test_resolve_without_settings() {
        let err = resolve(&RelayConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No settings page configured"));
    }
}
