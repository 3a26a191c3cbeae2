//! Библиотека разбора телеметрии GPMF
//!
//! Обход дерева записей KLV, декодирование типизированных выборок,
//! масштабирование по метаданным потока и привязка выборок ко времени.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use gpmf_core::{codec, metadata, RecordCursor, Scope, SearchMode};
//! use gpmf_types::keys;
//!
//! let payload = std::fs::read("payload.bin")?;
//! let mut cursor = RecordCursor::new(&payload)?;
//!
//! while cursor.find_next(keys::GPS5, Scope::Recurse, SearchMode::Tolerant).is_found() {
//!     let scale = metadata::resolve_scale(&cursor)?;
//!     let values = codec::decode_scaled(&cursor, &scale, &[])?;
//!     println!("{} samples, {} values", cursor.repeat(), values.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binary;
pub mod codec;
pub mod cursor;
pub mod metadata;
pub mod record;
pub mod structure;
pub mod timestamp;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use codec::{decode_scaled, decode_scaled_into, ElementSlot, SampleLayout, ScaleDescriptor};
pub use cursor::{RecordCursor, Scope, Search, SearchMode};
pub use record::RecordHeader;
pub use timestamp::{interpolate, parse_base_time, GpsFix};

/// Размер заголовка записи KLV
pub const GPMF_HEADER_SIZE: usize = 8;

/// Граница выравнивания данных записи
pub const GPMF_ALIGN: usize = 4;

/// Максимальная глубина вложенности
pub const GPMF_NEST_LIMIT: usize = 16;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Округляет длину вверх до границы [`GPMF_ALIGN`].
pub const fn align4(n: usize) -> usize {
    (n + GPMF_ALIGN - 1) & !(GPMF_ALIGN - 1)
}
