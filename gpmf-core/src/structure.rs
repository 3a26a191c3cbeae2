//! Текстовый дамп дерева записей полезной нагрузки.

use std::io::Write;

use gpmf_types::{GpmfResult, SampleType};

use crate::{binary::read::read_latin1, cursor::RecordCursor, Scope};

/// Максимум символов строкового значения в дампе.
const PREVIEW_LEN: usize = 40;

/// Пишет по строке на запись: отступ по уровню, ключ, тип, размер
/// выборки и повтор; для строк и GPSU добавляется начало значения.
///
/// ```text
/// DEVC '0' 1*1520
///   DVID 'L' 4*1
///   DVNM 'c' 6*1 "Camera"
/// ```
pub fn write_structure<W: Write>(
    buf: &[u8],
    out: &mut W,
) -> GpmfResult<()> {
    let mut cursor = RecordCursor::new(buf)?;

    while let Some(rec) = cursor.next_record(Scope::Recurse)? {
        let indent = cursor.level() * 2;
        let type_char = match rec.sample_type() {
            Ok(ty) => ty.as_char(),
            Err(_) => '!',
        };

        write!(
            out,
            "{:indent$}{} '{}' {}*{}",
            "", rec.key, type_char, rec.struct_size, rec.repeat
        )?;

        if matches!(rec.sample_type(), Ok(SampleType::Ascii | SampleType::UtcDate)) {
            let mut text = read_latin1(cursor.raw_data());
            if text.chars().count() > PREVIEW_LEN {
                text = text.chars().take(PREVIEW_LEN).collect::<String>() + "...";
            }
            write!(out, " {text:?}")?;
        }

        writeln!(out)?;
    }

    Ok(())
}
