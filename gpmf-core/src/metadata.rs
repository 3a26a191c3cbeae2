//! Поиск метаданных, описывающих запись данных.
//!
//! Метаданные (SIUN/UNIT, TYPE, SCAL) пишутся соседями перед записью данных
//! на том же уровне, поэтому каждая функция ищет назад от копии курсора.
//! Отсутствие метаданных не ошибка: возвращается значение по умолчанию.

use gpmf_types::{keys, FourCC, GpmfError, GpmfResult, SampleType};
use log::debug;

use crate::{
    binary::read::{read_integer, read_latin1},
    codec::ScaleDescriptor,
    cursor::{RecordCursor, Scope, SearchMode},
};

/// Копия курсора на ближайшем предшествующем соседе с ключом `key`.
pub(crate) fn sibling<'a>(
    cursor: &RecordCursor<'a>,
    key: FourCC,
) -> Option<RecordCursor<'a>> {
    let mut probe = cursor.clone();
    probe
        .find_prev(key, Scope::CurrentLevel, SearchMode::Tolerant)
        .is_found()
        .then_some(probe)
}

/// Единицы измерения элементов: SIUN, а при его отсутствии UNIT.
///
/// Каждая выборка записи единиц: одна строка шириной `struct_size`.
pub fn resolve_units(cursor: &RecordCursor<'_>) -> Vec<String> {
    let Some(units) = sibling(cursor, keys::SIUN).or_else(|| sibling(cursor, keys::UNIT))
    else {
        debug!("{}: no units", cursor.key());
        return Vec::new();
    };

    let width = units.struct_size();
    if width == 0 {
        return Vec::new();
    }

    units.raw_data().chunks_exact(width).map(read_latin1).collect()
}

/// Типы элементов из записи TYPE; пустой вектор, если её нет.
///
/// Поддерживается повтор `f[8]`: восемь элементов типа `f`.
pub fn resolve_element_types(cursor: &RecordCursor<'_>) -> GpmfResult<Vec<SampleType>> {
    match sibling(cursor, keys::TYPE) {
        Some(types) => parse_type_string(types.raw_data()),
        None => Ok(Vec::new()),
    }
}

/// Делители масштаба из записи SCAL; масштаб 1, если её нет.
pub fn resolve_scale(cursor: &RecordCursor<'_>) -> GpmfResult<ScaleDescriptor> {
    let Some(scal) = sibling(cursor, keys::SCAL) else {
        return Ok(ScaleDescriptor::identity());
    };

    let ty = scal.sample_type()?;
    if !ty.is_integer() {
        return Err(GpmfError::UnsupportedType(ty.as_char()));
    }

    let data = scal.raw_data();
    let divisors = (0..data.len() / ty.size_of())
        .map(|i| read_integer(data, i * ty.size_of(), ty))
        .collect::<GpmfResult<Vec<_>>>()?;

    Ok(ScaleDescriptor::new(divisors))
}

fn parse_type_string(raw: &[u8]) -> GpmfResult<Vec<SampleType>> {
    let mut types = Vec::new();
    let mut bytes = raw.iter().copied().take_while(|&b| b != 0);

    while let Some(b) = bytes.next() {
        if b != b'[' {
            types.push(SampleType::from_u8(b)?);
            continue;
        }

        let &prev = types
            .last()
            .ok_or_else(|| GpmfError::corrupted("TYPE repeat without element type"))?;

        let mut count = 0usize;
        loop {
            match bytes.next() {
                Some(d @ b'0'..=b'9') => count = count * 10 + (d - b'0') as usize,
                Some(b']') => break,
                _ => return Err(GpmfError::corrupted("unterminated repeat in TYPE")),
            }
        }

        if count == 0 {
            types.pop();
        } else {
            types.extend(std::iter::repeat(prev).take(count - 1));
        }
    }

    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{i32_structs, i32s, klv, nest, string, strings, u16s};

    fn at_data(buf: &[u8]) -> RecordCursor<'_> {
        let mut c = RecordCursor::new(buf).unwrap();
        assert!(c.find_next(FourCC::new(b"DATA"), Scope::Recurse, SearchMode::Strict).is_found());
        c
    }

    #[test]
    fn test_units_prefer_siun() {
        let buf = nest(
            b"STRM",
            &[
                strings(b"UNIT", 4, &["deg", "m"]),
                strings(b"SIUN", 4, &["m/s2"]),
                i32_structs(b"DATA", 3, &[1, 2, 3]),
            ],
        );
        assert_eq!(resolve_units(&at_data(&buf)), vec!["m/s2"]);
    }

    #[test]
    fn test_units_fall_back_to_unit() {
        let buf = nest(
            b"STRM",
            &[strings(b"UNIT", 4, &["deg", "deg", "m", "m/s", "m/s"]), i32_structs(b"DATA", 5, &[0; 5])],
        );
        assert_eq!(resolve_units(&at_data(&buf)), vec!["deg", "deg", "m", "m/s", "m/s"]);
    }

    #[test]
    fn test_units_absent_is_empty() {
        let buf = nest(b"STRM", &[i32_structs(b"DATA", 2, &[0; 2])]);
        assert!(resolve_units(&at_data(&buf)).is_empty());
    }

    #[test]
    fn test_units_latin1_degree() {
        let buf = nest(
            b"STRM",
            &[klv(b"SIUN", b'c', 3, 1, &[0xB0, b'C', 0]), i32_structs(b"DATA", 1, &[0])],
        );
        assert_eq!(resolve_units(&at_data(&buf)), vec!["°C"]);
    }

    #[test]
    fn test_metadata_after_data_is_ignored() {
        let buf = nest(
            b"STRM",
            &[i32_structs(b"DATA", 1, &[0]), strings(b"SIUN", 4, &["m"]), i32s(b"SCAL", &[10])],
        );
        let c = at_data(&buf);
        assert!(resolve_units(&c).is_empty());
        assert_eq!(resolve_scale(&c).unwrap(), ScaleDescriptor::identity());
    }

    #[test]
    fn test_element_types_with_repeat() {
        let buf = nest(b"STRM", &[string(b"TYPE", "Lf[3]F"), klv(b"DATA", b'?', 20, 0, &[])]);
        let types = resolve_element_types(&at_data(&buf)).unwrap();
        assert_eq!(
            types,
            vec![
                SampleType::UInt32,
                SampleType::Float,
                SampleType::Float,
                SampleType::Float,
                SampleType::FourCC
            ]
        );
    }

    #[test]
    fn test_element_types_unknown_code() {
        let buf = nest(b"STRM", &[string(b"TYPE", "lx"), klv(b"DATA", b'?', 8, 0, &[])]);
        assert!(matches!(
            resolve_element_types(&at_data(&buf)),
            Err(GpmfError::UnknownType(b'x'))
        ));
    }

    #[test]
    fn test_element_types_malformed_repeat() {
        assert!(parse_type_string(b"[2]").is_err());
        assert!(parse_type_string(b"f[2").is_err());
        assert_eq!(parse_type_string(b"f[0]l").unwrap(), vec![SampleType::Int32]);
    }

    #[test]
    fn test_scale_per_element() {
        let buf = nest(
            b"STRM",
            &[i32s(b"SCAL", &[10_000_000, 10_000_000, 1000]), i32_structs(b"DATA", 3, &[0; 3])],
        );
        let scale = resolve_scale(&at_data(&buf)).unwrap();
        assert_eq!(scale.divisors(), &[10_000_000, 10_000_000, 1000]);
    }

    #[test]
    fn test_scale_nearest_preceding_wins() {
        let buf = nest(
            b"STRM",
            &[u16s(b"SCAL", &[1]), u16s(b"SCAL", &[100]), i32_structs(b"DATA", 1, &[0])],
        );
        assert_eq!(resolve_scale(&at_data(&buf)).unwrap().divisors(), &[100]);
    }

    #[test]
    fn test_scale_float_rejected() {
        let buf = nest(
            b"STRM",
            &[klv(b"SCAL", b'f', 4, 1, &1.0f32.to_be_bytes()), i32_structs(b"DATA", 1, &[0])],
        );
        assert!(matches!(
            resolve_scale(&at_data(&buf)),
            Err(GpmfError::UnsupportedType('f'))
        ));
    }
}
