//! encode サブコマンド
//!
//! 緯度経度をウォッチ側の固定小数点表現に変換して表示します。

use clap::Args;
use georelay_common::types::encode_angle;

/// encode サブコマンドの引数
#[derive(Args, Debug, Clone)]
#[command(allow_negative_numbers = true)]
pub struct EncodeArgs {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,
}

/// encode コマンドを実行
pub fn execute(args: &EncodeArgs) -> String {
    format!(
        "AM_GEO_LAT={} AM_GEO_LON={}",
        encode_angle(args.latitude),
        encode_angle(args.longitude)
    )
}
