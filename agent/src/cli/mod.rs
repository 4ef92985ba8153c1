//! CLI module for georelay
//!
//! Provides the command-line interface of the relay agent.

pub mod encode;
pub mod run;
pub mod settings_url;

use clap::{Parser, Subcommand};

/// Geo Relay - relays the phone's position to a paired watch app
#[derive(Parser, Debug)]
#[command(name = "georelay")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    GEORELAY_CONFIG                     Configuration file path
    GEORELAY_LOG_LEVEL                  Log level (default: info, falls back to RUST_LOG)
    GEORELAY_LOG_DIR                    Directory for JSON log files (disabled if unset)
    GEORELAY_POLL_INTERVAL_MS           Position polling interval (default: 1000)
    GEORELAY_DST_CORRECTION             Send DST correction (default: false)
    GEORELAY_TIMEZONE                   IANA timezone (default: host local time)
    GEORELAY_USER_TOKEN                 Account token
    GEORELAY_POSITION__LATITUDE         Fixed latitude
    GEORELAY_POSITION__LONGITUDE        Fixed longitude
    GEORELAY_SUBSCRIPTION__HOST         Timeline subscription service URL
    GEORELAY_SUBSCRIPTION__TIMELINE_TOKEN  Timeline token
    GEORELAY_GEONAMES__USERNAME         Geocoding proxy username
    GEORELAY_SETTINGS__URL              Settings page URL
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay agent
    Run(run::RunArgs),
    /// Print the fixed-point encoding of a coordinate pair
    Encode(encode::EncodeArgs),
    /// Print the settings page URL
    SettingsUrl(settings_url::SettingsUrlArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "georelay",
            "run",
            "--config",
            "/etc/georelay.toml",
            "--stdin-events",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(
                    args.config.as_deref(),
                    Some(std::path::Path::new("/etc/georelay.toml"))
                );
                assert!(args.stdin_events);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_encode_negative_coordinates() {
        let cli = Cli::try_parse_from(["georelay", "encode", "43.6532", "-79.3832"]).unwrap();

        match cli.command {
            Commands::Encode(args) => {
                assert_eq!(args.latitude, 43.6532);
                assert_eq!(args.longitude, -79.3832);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["georelay"]).is_err());
    }
}
