//! 夏時間補正
//!
//! タイムゾーンオフセットは「UTC − ローカル（分）」で扱う。
//! 例: UTC−5 なら 300、夏時間中の UTC−4 なら 240。
//!
//! 1月1日と7月1日のオフセットの大きい方を標準時とみなし、現在のオフセットが
//! それより小さければ夏時間中と判定する。

use chrono::{DateTime, Datelike, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use georelay_common::error::{CommonError, CommonResult};

/// `at` 時点のタイムゾーンオフセット（分、UTC − ローカル）
pub fn timezone_offset<Z: TimeZone>(zone: &Z, at: DateTime<Utc>) -> i32 {
    let local = at.with_timezone(zone);
    -(local.offset().fix().local_minus_utc() / 60)
}

/// 夏時間中の補正値（分、現在のオフセット − 標準時のオフセット）
///
/// 夏時間中は負の値になる（例: トロントの7月は -60）。夏時間でなければ `None`。
pub fn dst_correction<Z: TimeZone>(zone: &Z, now: DateTime<Utc>) -> Option<i32> {
    let year = now.with_timezone(zone).year();
    let january = reference_offset(zone, year, 1)?;
    let july = reference_offset(zone, year, 7)?;
    let standard = january.max(july);
    let current = timezone_offset(zone, now);

    (current < standard).then(|| current - standard)
}

fn reference_offset<Z: TimeZone>(zone: &Z, year: i32, month: u32) -> Option<i32> {
    let midnight = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    let local = zone.from_local_datetime(&midnight).earliest()?;
    Some(-(local.offset().fix().local_minus_utc() / 60))
}

/// オフセット計算に使うタイムゾーン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneSource {
    /// ホストのローカルタイムゾーン
    #[default]
    Local,
    /// IANA名で指定したタイムゾーン
    Named(Tz),
}

impl ZoneSource {
    /// 設定値から作成（未設定ならローカル）
    pub fn from_config(name: Option<&str>) -> CommonResult<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|err| CommonError::Config(format!("Unknown timezone '{name}': {err}"))),
        }
    }

    /// `at` 時点のオフセット（分、UTC − ローカル）
    pub fn utc_offset_minutes(&self, at: DateTime<Utc>) -> i32 {
        match self {
            Self::Local => timezone_offset(&chrono::Local, at),
            Self::Named(tz) => timezone_offset(tz, at),
        }
    }

    /// `now` 時点の夏時間補正（分）
    pub fn dst_correction(&self, now: DateTime<Utc>) -> Option<i32> {
        match self {
            Self::Local => dst_correction(&chrono::Local, now),
            Self::Named(tz) => dst_correction(tz, now),
        }
    }
}
