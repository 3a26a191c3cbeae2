use thiserror::Error;

use crate::FourCC;

/// Результат для операций GPMF
pub type GpmfResult<T> = std::result::Result<T, GpmfError>;

/// Типы ошибок разбора GPMF.
#[derive(Debug, Error)]
pub enum GpmfError {
    /// Буфер полезной нагрузки пуст или короче одного заголовка записи
    #[error("Invalid buffer: {0} bytes is smaller than a record header")]
    InvalidBuffer(usize),

    /// Строгий поиск не нашёл запись с ключом
    #[error("Tag {0} not found")]
    TagNotFound(FourCC),

    /// Строка GPSU не разбирается как дата/время
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Неизвестный код типа
    #[error("Unknown GPMF type code: 0x{0:02x}")]
    UnknownType(u8),

    /// Тип известен, но не может быть представлен числом
    #[error("Type '{0}' cannot be decoded as a numeric value")]
    UnsupportedType(char),

    /// Выходной буфер меньше запрошенного объёма
    #[error("Buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Длины записей противоречат друг другу
    #[error("Corrupted data: {0}")]
    Corrupted(String),

    /// Превышена глубина вложенности
    #[error("Nesting deeper than {0} levels")]
    NestTooDeep(usize),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GpmfError {
    /// Удобные конструкторы
    pub fn corrupted<S: Into<String>>(s: S) -> Self {
        Self::Corrupted(s.into())
    }

    pub fn malformed_timestamp<S: Into<String>>(s: S) -> Self {
        Self::MalformedTimestamp(s.into())
    }

    /// Повреждение структуры, а не отдельной записи.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Corrupted(_) | Self::NestTooDeep(_))
    }
}
