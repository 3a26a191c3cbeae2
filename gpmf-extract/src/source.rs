//! Источники полезных нагрузок GPMF.
//!
//! Контейнер (MP4) здесь не разбирается: сессия видит только количество
//! полезных нагрузок, их байты и временные окна.

use std::{ops::Range, path::Path};

use gpmf_core::RecordHeader;
use gpmf_types::TimeWindow;
use log::{debug, warn};

use crate::{ExtractError, ExtractResult};

/// Поставщик полезных нагрузок и их временных окон.
pub trait PayloadSource {
    /// Длительность метаданных в секундах.
    fn duration(&self) -> f64;

    fn payload_count(&self) -> usize;

    fn payload_size(
        &self,
        index: usize,
    ) -> ExtractResult<usize>;

    /// Копирует байты полезной нагрузки в `buf` (буфер переиспользуется).
    fn read_payload(
        &mut self,
        index: usize,
        buf: &mut Vec<u8>,
    ) -> ExtractResult<()>;

    fn payload_time(
        &self,
        index: usize,
    ) -> ExtractResult<TimeWindow>;
}

/// Полезные нагрузки, уже лежащие в памяти.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    payloads: Vec<(Vec<u8>, TimeWindow)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        payload: Vec<u8>,
        window: TimeWindow,
    ) {
        self.payloads.push((payload, window));
    }

    /// Источник с окнами `[i·secs, (i+1)·secs)`.
    pub fn with_uniform_windows(
        payloads: Vec<Vec<u8>>,
        payload_secs: f64,
    ) -> Self {
        let payloads = payloads
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p, uniform_window(i, payload_secs)))
            .collect();
        Self { payloads }
    }

    fn get(
        &self,
        index: usize,
    ) -> ExtractResult<&(Vec<u8>, TimeWindow)> {
        self.payloads.get(index).ok_or(ExtractError::PayloadIndex {
            index,
            count: self.payloads.len(),
        })
    }
}

impl PayloadSource for MemorySource {
    fn duration(&self) -> f64 {
        self.payloads.last().map_or(0.0, |(_, w)| w.out_secs)
    }

    fn payload_count(&self) -> usize {
        self.payloads.len()
    }

    fn payload_size(
        &self,
        index: usize,
    ) -> ExtractResult<usize> {
        Ok(self.get(index)?.0.len())
    }

    fn read_payload(
        &mut self,
        index: usize,
        buf: &mut Vec<u8>,
    ) -> ExtractResult<()> {
        let (payload, _) = self.get(index)?;
        buf.clear();
        buf.extend_from_slice(payload);
        Ok(())
    }

    fn payload_time(
        &self,
        index: usize,
    ) -> ExtractResult<TimeWindow> {
        Ok(self.get(index)?.1)
    }
}

/// Сырой поток GPMF, извлечённый из MP4, например:
///
/// ```text
/// ffmpeg -i GOPR0001.MP4 -map 0:3 -c copy -f data gpmf.bin
/// ```
///
/// Каждая запись верхнего уровня (обычно `DEVC`) считается отдельной
/// полезной нагрузкой длительностью `payload_secs`.
#[derive(Debug, Clone)]
pub struct RawGpmfSource {
    data: Vec<u8>,
    spans: Vec<Range<usize>>,
    payload_secs: f64,
}

impl RawGpmfSource {
    pub fn open<P: AsRef<Path>>(
        path: P,
        payload_secs: f64,
    ) -> ExtractResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        debug!("{:?}: {} bytes", path.as_ref(), data.len());
        Self::from_bytes(data, payload_secs)
    }

    pub fn from_bytes(
        data: Vec<u8>,
        payload_secs: f64,
    ) -> ExtractResult<Self> {
        if !(payload_secs.is_finite() && payload_secs > 0.0) {
            return Err(ExtractError::Config(format!(
                "payload duration must be > 0, got {payload_secs}"
            )));
        }

        let spans = split_top_level(&data);
        Ok(Self {
            data,
            spans,
            payload_secs,
        })
    }

    fn span(
        &self,
        index: usize,
    ) -> ExtractResult<Range<usize>> {
        self.spans
            .get(index)
            .cloned()
            .ok_or(ExtractError::PayloadIndex {
                index,
                count: self.spans.len(),
            })
    }
}

impl PayloadSource for RawGpmfSource {
    fn duration(&self) -> f64 {
        self.spans.len() as f64 * self.payload_secs
    }

    fn payload_count(&self) -> usize {
        self.spans.len()
    }

    fn payload_size(
        &self,
        index: usize,
    ) -> ExtractResult<usize> {
        Ok(self.span(index)?.len())
    }

    fn read_payload(
        &mut self,
        index: usize,
        buf: &mut Vec<u8>,
    ) -> ExtractResult<()> {
        let span = self.span(index)?;
        buf.clear();
        buf.extend_from_slice(&self.data[span]);
        Ok(())
    }

    fn payload_time(
        &self,
        index: usize,
    ) -> ExtractResult<TimeWindow> {
        self.span(index)?;
        Ok(uniform_window(index, self.payload_secs))
    }
}

fn uniform_window(
    index: usize,
    payload_secs: f64,
) -> TimeWindow {
    TimeWindow::new(index as f64 * payload_secs, (index + 1) as f64 * payload_secs)
}

/// Делит дамп на записи верхнего уровня. Обрезанный хвост отбрасывается.
fn split_top_level(data: &[u8]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut off = 0;

    loop {
        match RecordHeader::parse(data, off, data.len()) {
            Ok(Some(rec)) => {
                let end = rec.next_offset().min(data.len());
                spans.push(off..end);
                off = end;
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Dropping {} trailing bytes at offset {off}: {e}", data.len() - off);
                break;
            }
        }
    }

    spans
}
