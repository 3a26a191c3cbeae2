use std::{
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use gpmf_core::{structure::write_structure, GpsFix, RecordCursor, Scope, Search, SearchMode};
use gpmf_types::{GpmfError, TimeWindow};
use log::{debug, error, info, warn};

use crate::{
    ExtractConfig, ExtractError, ExtractResult, ExtractStats, PayloadSource, RowEmitter,
};

/// Сессия извлечения строк (single-threaded).
pub struct ExtractSession {
    config: ExtractConfig,
    stop_flag: Arc<AtomicBool>,
}

impl ExtractSession {
    /// Создаёт сессию, проверяя конфигурацию.
    pub fn new(config: ExtractConfig) -> ExtractResult<Self> {
        if config.target.is_null() {
            return Err(ExtractError::Config("target FourCC must not be empty".to_string()));
        }
        if config.stream.is_null() {
            return Err(ExtractError::Config("stream FourCC must not be empty".to_string()));
        }

        Ok(Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Обрабатывает полезные нагрузки по порядку, строки пишутся в `out`.
    ///
    /// Блокирует до конца источника или stop_flag. Ошибка возвращается
    /// только для неизвестного кода типа и ошибок записи.
    pub fn run<S, W>(
        &self,
        source: &mut S,
        out: &mut W,
    ) -> ExtractResult<ExtractStats>
    where
        S: PayloadSource + ?Sized,
        W: Write,
    {
        let cfg = &self.config;
        let session_start = Instant::now();
        let emitter = RowEmitter::new(cfg);
        let count = source.payload_count();

        let mut stats = ExtractStats {
            payloads_total: count,
            ..Default::default()
        };

        let duration = source.duration();
        if duration <= 0.0 {
            warn!("No metadata found ({duration:.3}s)");
            return Ok(stats);
        }
        debug!("{duration:.2}s of metadata in {count} payloads");

        // Один буфер на все полезные нагрузки
        let mut payload = Vec::new();

        for index in 0..count {
            if self.stop_flag.load(Ordering::Relaxed) {
                warn!("Stopped before payload {index}");
                stats.stopped = true;
                break;
            }

            if let Err(e) = source.read_payload(index, &mut payload) {
                warn!("Skipping payload {index}: {e}");
                stats.payloads_skipped += 1;
                continue;
            }

            let window = match source.payload_time(index) {
                Ok(w) => w,
                Err(e) => {
                    warn!("Skipping payload {index}: no time window: {e}");
                    stats.payloads_skipped += 1;
                    continue;
                }
            };

            if cfg.show_payload_index {
                info!("PAYLOAD {index} of {count}, {} bytes", payload.len());
            }
            if cfg.show_payload_time {
                info!("  {:.3} to {:.3} seconds", window.in_secs, window.out_secs);
            }
            if cfg.show_structure {
                match write_structure(&payload, out) {
                    Ok(()) => {}
                    Err(GpmfError::Io(e)) => return Err(e.into()),
                    Err(e) => warn!("Structure of payload {index} incomplete: {e}"),
                }
            }

            match self.process_payload(index, &payload, &window, &emitter, out, &mut stats) {
                Ok(()) => stats.payloads_processed += 1,
                Err(ExtractError::Gpmf(e)) if e.is_structural() => {
                    warn!("Payload {index} has corruption: {e}");
                    stats.payloads_corrupted += 1;
                }
                Err(ExtractError::Gpmf(e @ GpmfError::InvalidBuffer(_))) => {
                    warn!("Skipping payload {index}: {e}");
                    stats.payloads_skipped += 1;
                }
                Err(e) => {
                    error!("Payload {index}: {e}");
                    return Err(e);
                }
            }
        }

        stats.duration_secs = session_start.elapsed().as_secs_f64();
        debug!(
            "{} rows from {} payloads",
            stats.rows_emitted, stats.payloads_processed
        );

        Ok(stats)
    }

    /// Все группы `stream` → `target` одной полезной нагрузки.
    ///
    /// Ошибка обхода прерывает полезную нагрузку, ошибка декодирования
    /// пропускает только свою группу.
    fn process_payload<W: Write>(
        &self,
        index: usize,
        payload: &[u8],
        window: &TimeWindow,
        emitter: &RowEmitter<'_>,
        out: &mut W,
        stats: &mut ExtractStats,
    ) -> ExtractResult<()> {
        let cfg = &self.config;
        let mut cursor = RecordCursor::new(payload)?;
        let mut relative = 0;

        while found(cursor.find_next(cfg.stream, Scope::Recurse, SearchMode::Tolerant))? {
            if !found(cursor.find_next(cfg.target, Scope::Recurse, SearchMode::Tolerant))? {
                continue;
            }

            let (fix, rows) = match GpsFix::resolve(&cursor, window)
                .and_then(|fix| Ok((fix, emitter.build_rows(&cursor, &fix, window)?)))
            {
                Ok(group) => group,
                Err(e) if skips_group(&e) => {
                    warn!("Skipping {} group: {e}", cursor.key());
                    stats.groups_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for row in &rows {
                emitter.write_row(row, out)?;
            }

            if !fix.utc {
                relative += 1;
            }
            stats.groups_emitted += 1;
            stats.rows_emitted += rows.len();
        }

        if relative > 0 {
            warn!("Payload {index}: {relative} group(s) without GPSU, times relative to payload start");
            stats.groups_relative_time += relative;
        }

        Ok(())
    }
}

fn found(search: Search) -> ExtractResult<bool> {
    Ok(search.into_result()?)
}

/// Ошибки, из-за которых пропускается только одна группа.
///
/// `Corrupted` здесь приходит из раскладки выборки или TYPE: дерево
/// записей при этом цело.
fn skips_group(e: &GpmfError) -> bool {
    matches!(
        e,
        GpmfError::MalformedTimestamp(_)
            | GpmfError::BufferTooSmall { .. }
            | GpmfError::UnsupportedType(_)
            | GpmfError::Corrupted(_)
    )
}
