//! Заголовок записи KLV.
//!
//! ```text
//! [0..4] KEY          FourCC
//! [4]    TYPE         код типа (0: вложенные записи)
//! [5]    STRUCT_SIZE  байт на выборку
//! [6..8] REPEAT       u16 BE: количество выборок
//! [8..]  DATA         STRUCT_SIZE × REPEAT байт, выровнено до 4
//! ```

use gpmf_types::{FourCC, GpmfError, GpmfResult, SampleType};

use crate::{
    align4,
    binary::read::{read_u16_be, read_u32_be},
    GPMF_HEADER_SIZE,
};

/// Разобранный заголовок записи и её положение в буфере.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: FourCC,
    pub type_code: u8,
    pub struct_size: u8,
    pub repeat: u16,
    /// Смещение заголовка от начала буфера
    pub offset: usize,
}

impl RecordHeader {
    /// Разбирает заголовок по смещению `off` в пределах уровня `[.., end)`.
    ///
    /// `Ok(None)`, если уровень исчерпан: осталось меньше заголовка или
    /// встретился нулевой ключ (выравнивание в конце полезной нагрузки).
    pub fn parse(
        buf: &[u8],
        off: usize,
        end: usize,
    ) -> GpmfResult<Option<Self>> {
        if end > buf.len() {
            return Err(GpmfError::corrupted(format!(
                "level end {end} beyond buffer of {} bytes",
                buf.len()
            )));
        }

        if off >= end || end - off < GPMF_HEADER_SIZE {
            return Ok(None);
        }

        let key = FourCC::from_u32(read_u32_be(buf, off)?);
        if key.is_null() {
            return Ok(None);
        }

        let header = RecordHeader {
            key,
            type_code: buf[off + 4],
            struct_size: buf[off + 5],
            repeat: read_u16_be(buf, off + 6)?,
            offset: off,
        };

        if header.data_end() > end {
            return Err(GpmfError::corrupted(format!(
                "{key} at {off}: {} data bytes exceed enclosing level ending at {end}",
                header.data_len()
            )));
        }

        Ok(Some(header))
    }

    pub fn is_nest(&self) -> bool {
        self.type_code == 0
    }

    pub fn sample_type(&self) -> GpmfResult<SampleType> {
        SampleType::from_u8(self.type_code)
    }

    pub fn data_offset(&self) -> usize {
        self.offset + GPMF_HEADER_SIZE
    }

    /// Полезные байты без выравнивания.
    pub fn data_len(&self) -> usize {
        self.struct_size as usize * self.repeat as usize
    }

    pub fn data_end(&self) -> usize {
        self.data_offset() + self.data_len()
    }

    /// Начало следующей записи того же уровня.
    pub fn next_offset(&self) -> usize {
        self.data_offset() + align4(self.data_len())
    }
}
