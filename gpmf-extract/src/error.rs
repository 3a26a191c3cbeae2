use gpmf_types::GpmfError;
use thiserror::Error;

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Ошибка разбора GPMF
    #[error("GPMF error: {0}")]
    Gpmf(#[from] GpmfError),

    /// Ошибка чтения источника или записи строк
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации строки в JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Индекс полезной нагрузки вне диапазона источника
    #[error("Payload {index} out of range ({count} payloads)")]
    PayloadIndex { index: usize, count: usize },

    #[error("Config error: {0}")]
    Config(String),
}
