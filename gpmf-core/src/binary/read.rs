use byteorder::{BigEndian, ByteOrder};
use gpmf_types::{GpmfError, GpmfResult, SampleType};

/// Возвращает `len` байт начиная с `off` или ошибку, если срез короче.
pub fn slice_at(
    buf: &[u8],
    off: usize,
    len: usize,
) -> GpmfResult<&[u8]> {
    let end = off
        .checked_add(len)
        .ok_or_else(|| GpmfError::corrupted("offset overflow"))?;

    buf.get(off..end).ok_or(GpmfError::BufferTooSmall {
        needed: end,
        available: buf.len(),
    })
}

pub fn read_u16_be(
    buf: &[u8],
    off: usize,
) -> GpmfResult<u16> {
    Ok(BigEndian::read_u16(slice_at(buf, off, 2)?))
}

pub fn read_u32_be(
    buf: &[u8],
    off: usize,
) -> GpmfResult<u32> {
    Ok(BigEndian::read_u32(slice_at(buf, off, 4)?))
}

/// Читает один элемент типа `ty` как f64 без масштабирования.
///
/// Целые расширяются со знаком/без знака, `q`/`Q` переводятся из
/// фиксированной точки. `c` и `F` отдаются как сырые коды.
pub fn read_element(
    buf: &[u8],
    off: usize,
    ty: SampleType,
) -> GpmfResult<f64> {
    let b = slice_at(buf, off, ty.size_of())?;

    Ok(match ty {
        SampleType::Int8 => b[0] as i8 as f64,
        SampleType::UInt8 | SampleType::Ascii => b[0] as f64,
        SampleType::Int16 => BigEndian::read_i16(b) as f64,
        SampleType::UInt16 => BigEndian::read_u16(b) as f64,
        SampleType::Int32 => BigEndian::read_i32(b) as f64,
        SampleType::UInt32 | SampleType::FourCC => BigEndian::read_u32(b) as f64,
        SampleType::Int64 => BigEndian::read_i64(b) as f64,
        SampleType::UInt64 => BigEndian::read_u64(b) as f64,
        SampleType::Float => BigEndian::read_f32(b) as f64,
        SampleType::Double => BigEndian::read_f64(b),
        SampleType::Q15_16 => BigEndian::read_i32(b) as f64 / 65_536.0,
        SampleType::Q31_32 => BigEndian::read_i64(b) as f64 / 4_294_967_296.0,
        SampleType::Guid | SampleType::UtcDate | SampleType::Nest | SampleType::Complex => {
            return Err(GpmfError::UnsupportedType(ty.as_char()))
        }
    })
}

/// Читает целочисленный элемент без потери точности (делители SCAL).
pub fn read_integer(
    buf: &[u8],
    off: usize,
    ty: SampleType,
) -> GpmfResult<i64> {
    let b = slice_at(buf, off, ty.size_of())?;

    Ok(match ty {
        SampleType::Int8 => b[0] as i8 as i64,
        SampleType::UInt8 => b[0] as i64,
        SampleType::Int16 => BigEndian::read_i16(b) as i64,
        SampleType::UInt16 => BigEndian::read_u16(b) as i64,
        SampleType::Int32 => BigEndian::read_i32(b) as i64,
        SampleType::UInt32 => BigEndian::read_u32(b) as i64,
        SampleType::Int64 => BigEndian::read_i64(b),
        SampleType::UInt64 => BigEndian::read_u64(b) as i64,
        _ => return Err(GpmfError::UnsupportedType(ty.as_char())),
    })
}

/// Строка фиксированной ширины в Latin-1 (GoPro пишет `°` как 0xB0),
/// обрезанная по первому NUL.
pub fn read_latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}
