//! Привязка выборок ко времени.
//!
//! Базовое время берётся из записи GPSU (`YYMMDDhhmmss.sss`, UTC, год 20YY),
//! время каждой выборки интерполируется линейно по окну полезной нагрузки.

use chrono::NaiveDate;
use gpmf_types::{keys, GpmfError, GpmfResult, TimeWindow};
use log::debug;

use crate::{
    codec::{decode_scalar, decode_scalar_u32},
    cursor::RecordCursor,
    metadata::sibling,
};

/// Длина строки GPSU.
pub const GPSU_LEN: usize = 16;

/// Разбирает `YYMMDDhhmmss.sss` в секунды UTC от эпохи Unix.
///
/// Лишние байты после 16-го игнорируются.
pub fn parse_base_time(raw: &[u8]) -> GpmfResult<f64> {
    let text = || String::from_utf8_lossy(raw).into_owned();

    if raw.len() < GPSU_LEN {
        return Err(GpmfError::malformed_timestamp(format!(
            "{:?}: expected {GPSU_LEN} bytes",
            text()
        )));
    }
    if raw[12] != b'.' {
        return Err(GpmfError::malformed_timestamp(format!("{:?}: missing '.'", text())));
    }

    let field = |from: usize, len: usize| -> GpmfResult<u32> {
        raw[from..from + len].iter().try_fold(0u32, |acc, &b| {
            if b.is_ascii_digit() {
                Ok(acc * 10 + (b - b'0') as u32)
            } else {
                Err(GpmfError::malformed_timestamp(format!("{:?}: non-digit", text())))
            }
        })
    };

    let year = 2000 + field(0, 2)? as i32;
    let (month, day) = (field(2, 2)?, field(4, 2)?);
    let (hour, min, sec) = (field(6, 2)?, field(8, 2)?, field(10, 2)?);
    let millis = field(13, 3)?;

    let datetime = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .ok_or_else(|| GpmfError::malformed_timestamp(format!("{:?}: invalid date", text())))?;

    Ok(datetime.and_utc().timestamp() as f64 + millis as f64 / 1000.0)
}

/// Время выборки `index` из `count`: `base + (out − in) × index / count`.
pub fn interpolate(
    base: f64,
    index: usize,
    count: usize,
    window: &TimeWindow,
) -> f64 {
    if count == 0 {
        return base;
    }

    base + window.span() * (index as f64 / count as f64)
}

/// Параметры GPS-фикса, общие для всех выборок группы.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsFix {
    /// Секунды UTC от эпохи
    pub base_time: f64,
    /// Точность (DOP), GPSP / 100
    pub accuracy: f64,
    /// 0: нет фикса, 2: 2D, 3: 3D
    pub fix: u32,
    /// `false`, если GPSU не найден и время отсчитывается от начала окна
    pub utc: bool,
}

impl GpsFix {
    /// Ищет GPSU, GPSF и GPSP перед записью данных под курсором.
    ///
    /// Без GPSU базовым временем становится начало окна, без GPSF и GPSP
    /// используются нули. Нечитаемая строка GPSU даёт
    /// [`GpmfError::MalformedTimestamp`].
    pub fn resolve(
        cursor: &RecordCursor<'_>,
        window: &TimeWindow,
    ) -> GpmfResult<Self> {
        let (base_time, utc) = match sibling(cursor, keys::GPSU) {
            Some(gpsu) => (parse_base_time(gpsu.raw_data())?, true),
            None => {
                debug!("{}: no GPSU, using payload start {:.3}", cursor.key(), window.in_secs);
                (window.in_secs, false)
            }
        };

        let fix = match sibling(cursor, keys::GPSF) {
            Some(gpsf) => decode_scalar_u32(&gpsf)?,
            None => {
                debug!("{}: no GPSF", cursor.key());
                0
            }
        };

        let accuracy = match sibling(cursor, keys::GPSP) {
            Some(gpsp) => decode_scalar(&gpsp)? / 100.0,
            None => {
                debug!("{}: no GPSP", cursor.key());
                0.0
            }
        };

        Ok(Self {
            base_time,
            accuracy,
            fix,
            utc,
        })
    }

    /// Время выборки `index` из `count` в окне `window`.
    pub fn sample_time(
        &self,
        index: usize,
        count: usize,
        window: &TimeWindow,
    ) -> f64 {
        interpolate(self.base_time, index, count, window)
    }
}
