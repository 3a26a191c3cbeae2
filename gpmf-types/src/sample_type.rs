use crate::{GpmfError, GpmfResult};

/// Тип хранения элемента записи GPMF (байт типа в заголовке KLV).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SampleType {
    /// Вложенные записи
    Nest = 0,
    /// int8_t
    Int8 = b'b',
    /// uint8_t
    UInt8 = b'B',
    /// ASCII символ (строки)
    Ascii = b'c',
    /// double
    Double = b'd',
    /// float
    Float = b'f',
    /// Четырёхсимвольный код
    FourCC = b'F',
    /// 128-битный GUID
    Guid = b'G',
    /// int64_t
    Int64 = b'j',
    /// uint64_t
    UInt64 = b'J',
    /// int32_t
    Int32 = b'l',
    /// uint32_t
    UInt32 = b'L',
    /// Q15.16 с фиксированной точкой
    Q15_16 = b'q',
    /// Q31.32 с фиксированной точкой
    Q31_32 = b'Q',
    /// int16_t
    Int16 = b's',
    /// uint16_t
    UInt16 = b'S',
    /// UTC дата/время, 16 символов
    UtcDate = b'U',
    /// Разнотипная структура, описанная записью TYPE
    Complex = b'?',
}

impl SampleType {
    pub fn from_u8(v: u8) -> GpmfResult<Self> {
        Ok(match v {
            0 => SampleType::Nest,
            b'b' => SampleType::Int8,
            b'B' => SampleType::UInt8,
            b'c' => SampleType::Ascii,
            b'd' => SampleType::Double,
            b'f' => SampleType::Float,
            b'F' => SampleType::FourCC,
            b'G' => SampleType::Guid,
            b'j' => SampleType::Int64,
            b'J' => SampleType::UInt64,
            b'l' => SampleType::Int32,
            b'L' => SampleType::UInt32,
            b'q' => SampleType::Q15_16,
            b'Q' => SampleType::Q31_32,
            b's' => SampleType::Int16,
            b'S' => SampleType::UInt16,
            b'U' => SampleType::UtcDate,
            b'?' => SampleType::Complex,
            _ => return Err(GpmfError::UnknownType(v)),
        })
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Символ типа для вывода (`'0'` для вложенных записей).
    pub fn as_char(&self) -> char {
        match self {
            SampleType::Nest => '0',
            other => other.as_u8() as char,
        }
    }

    /// Размер одного элемента в байтах.
    ///
    /// Для `Nest` и `Complex` ширина не фиксирована и равна 0.
    pub fn size_of(&self) -> usize {
        match self {
            SampleType::Int8 | SampleType::UInt8 | SampleType::Ascii => 1,
            SampleType::Int16 | SampleType::UInt16 => 2,
            SampleType::Float
            | SampleType::FourCC
            | SampleType::Int32
            | SampleType::UInt32
            | SampleType::Q15_16 => 4,
            SampleType::Double | SampleType::Int64 | SampleType::UInt64 | SampleType::Q31_32 => 8,
            SampleType::Guid | SampleType::UtcDate => 16,
            SampleType::Nest | SampleType::Complex => 0,
        }
    }

    /// Целочисленные типы (допустимы как делители SCAL).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SampleType::Int8
                | SampleType::UInt8
                | SampleType::Int16
                | SampleType::UInt16
                | SampleType::Int32
                | SampleType::UInt32
                | SampleType::Int64
                | SampleType::UInt64
        )
    }

    /// Значение масштабируется делителем SCAL.
    pub fn is_scalable(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                SampleType::Float | SampleType::Double | SampleType::Q15_16 | SampleType::Q31_32
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_type_sizes() {
        assert_eq!(SampleType::Int8.size_of(), 1);
        assert_eq!(SampleType::Ascii.size_of(), 1);
        assert_eq!(SampleType::Int16.size_of(), 2);
        assert_eq!(SampleType::UInt32.size_of(), 4);
        assert_eq!(SampleType::FourCC.size_of(), 4);
        assert_eq!(SampleType::Q15_16.size_of(), 4);
        assert_eq!(SampleType::Q31_32.size_of(), 8);
        assert_eq!(SampleType::Double.size_of(), 8);
        assert_eq!(SampleType::UtcDate.size_of(), 16);
        assert_eq!(SampleType::Nest.size_of(), 0);
        assert_eq!(SampleType::Complex.size_of(), 0);
    }

    #[test]
    fn test_sample_type_codes() {
        for code in b"bBcdfFGjJlLqQsSU?" {
            let ty = SampleType::from_u8(*code).unwrap();
            assert_eq!(ty.as_u8(), *code);
        }
        assert_eq!(SampleType::from_u8(0).unwrap(), SampleType::Nest);
        assert_eq!(SampleType::Nest.as_char(), '0');

        match SampleType::from_u8(b'x') {
            Err(GpmfError::UnknownType(b'x')) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_scalable() {
        assert!(SampleType::Int32.is_scalable());
        assert!(SampleType::Q15_16.is_scalable());
        assert!(!SampleType::Ascii.is_scalable());
        assert!(!SampleType::FourCC.is_scalable());
        assert!(!SampleType::Float.is_integer());
    }
}
