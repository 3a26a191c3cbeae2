use gpmf_types::FourCC;

use crate::{align4, GPMF_HEADER_SIZE};

/// Дописывает 8-байтный заголовок KLV.
pub fn write_header(
    buf: &mut Vec<u8>,
    key: FourCC,
    type_code: u8,
    struct_size: u8,
    repeat: u16,
) {
    buf.reserve(GPMF_HEADER_SIZE);
    buf.extend_from_slice(key.as_bytes());
    buf.push(type_code);
    buf.push(struct_size);
    buf.extend_from_slice(&repeat.to_be_bytes());
}

/// Дополняет буфер нулями до границы 4 байт.
pub fn pad_to_alignment(buf: &mut Vec<u8>) {
    let padded = align4(buf.len());
    buf.resize(padded, 0);
}
