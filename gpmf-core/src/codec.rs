//! Декодирование выборок записи в масштабированные значения `f64`.

use gpmf_types::{GpmfError, GpmfResult, SampleType};

use crate::{binary::read::read_element, cursor::RecordCursor, metadata};

/// Делители масштаба из записи SCAL.
///
/// Элемент `j` делится на `divisors[j % len]`; пустой набор означает
/// масштаб 1, нулевой делитель трактуется как 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleDescriptor {
    divisors: Vec<i64>,
}

impl ScaleDescriptor {
    pub fn new(divisors: Vec<i64>) -> Self {
        Self { divisors }
    }

    /// Масштаб 1 для всех элементов.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn divisors(&self) -> &[i64] {
        &self.divisors
    }

    pub fn divisor(
        &self,
        element: usize,
    ) -> f64 {
        if self.divisors.is_empty() {
            return 1.0;
        }

        match self.divisors[element % self.divisors.len()] {
            0 => 1.0,
            d => d as f64,
        }
    }
}

/// Положение одного элемента внутри выборки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSlot {
    pub ty: SampleType,
    /// Смещение от начала выборки
    pub offset: usize,
    pub width: usize,
}

/// Таблица смещений элементов одной выборки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLayout {
    slots: Vec<ElementSlot>,
    struct_size: usize,
}

impl SampleLayout {
    /// Строит таблицу по объявленному типу записи.
    ///
    /// `element_types` применяются только к записям `?`; для остальных
    /// все элементы имеют объявленный тип.
    pub fn new(
        declared: SampleType,
        struct_size: usize,
        element_types: &[SampleType],
    ) -> GpmfResult<Self> {
        let slots = match declared {
            SampleType::Nest => return Err(GpmfError::UnsupportedType(declared.as_char())),
            SampleType::Complex => {
                if element_types.is_empty() {
                    return Err(GpmfError::UnknownType(SampleType::Complex.as_u8()));
                }

                let mut offset = 0;
                let mut slots = Vec::with_capacity(element_types.len());
                for &ty in element_types {
                    let width = ty.size_of();
                    if width == 0 {
                        return Err(GpmfError::UnknownType(ty.as_u8()));
                    }
                    slots.push(ElementSlot { ty, offset, width });
                    offset += width;
                }

                if offset > struct_size {
                    return Err(GpmfError::corrupted(format!(
                        "element widths sum to {offset} bytes, struct size is {struct_size}"
                    )));
                }
                slots
            }
            ty => {
                let width = ty.size_of();
                if struct_size % width != 0 {
                    return Err(GpmfError::corrupted(format!(
                        "struct size {struct_size} is not a multiple of '{}' width {width}",
                        ty.as_char()
                    )));
                }

                (0..struct_size / width)
                    .map(|j| ElementSlot {
                        ty,
                        offset: j * width,
                        width,
                    })
                    .collect()
            }
        };

        Ok(Self { slots, struct_size })
    }

    /// Таблица для записи под курсором.
    pub fn for_cursor(
        cursor: &RecordCursor<'_>,
        element_types: &[SampleType],
    ) -> GpmfResult<Self> {
        Self::new(cursor.sample_type()?, cursor.struct_size(), element_types)
    }

    pub fn slots(&self) -> &[ElementSlot] {
        &self.slots
    }

    /// Элементов в выборке.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn struct_size(&self) -> usize {
        self.struct_size
    }
}

/// Декодирует все выборки записи под курсором.
///
/// Длина результата равна `repeat × элементов в выборке`.
pub fn decode_scaled(
    cursor: &RecordCursor<'_>,
    scale: &ScaleDescriptor,
    element_types: &[SampleType],
) -> GpmfResult<Vec<f64>> {
    let layout = SampleLayout::for_cursor(cursor, element_types)?;
    let mut out = vec![0.0; cursor.repeat() * layout.len()];
    decode_with_layout(cursor, &layout, scale, 0, cursor.repeat(), &mut out)?;
    Ok(out)
}

/// Декодирует `count` выборок начиная с `first_sample` в `out`.
///
/// Возвращает количество записанных значений.
pub fn decode_scaled_into(
    cursor: &RecordCursor<'_>,
    scale: &ScaleDescriptor,
    element_types: &[SampleType],
    first_sample: usize,
    count: usize,
    out: &mut [f64],
) -> GpmfResult<usize> {
    let layout = SampleLayout::for_cursor(cursor, element_types)?;
    decode_with_layout(cursor, &layout, scale, first_sample, count, out)
}

/// Первое значение записи с учётом её собственного SCAL (GPSF, GPSP).
pub fn decode_scalar(cursor: &RecordCursor<'_>) -> GpmfResult<f64> {
    let scale = metadata::resolve_scale(cursor)?;
    let layout = SampleLayout::for_cursor(cursor, &[])?;
    let mut out = vec![0.0; layout.len()];
    decode_with_layout(cursor, &layout, &scale, 0, 1, &mut out)?;

    out.first()
        .copied()
        .ok_or_else(|| GpmfError::corrupted(format!("{} holds no elements", cursor.key())))
}

pub fn decode_scalar_u32(cursor: &RecordCursor<'_>) -> GpmfResult<u32> {
    Ok(decode_scalar(cursor)? as u32)
}

fn decode_with_layout(
    cursor: &RecordCursor<'_>,
    layout: &SampleLayout,
    scale: &ScaleDescriptor,
    first_sample: usize,
    count: usize,
    out: &mut [f64],
) -> GpmfResult<usize> {
    let repeat = cursor.repeat();
    if first_sample + count > repeat {
        return Err(GpmfError::BufferTooSmall {
            needed: first_sample + count,
            available: repeat,
        });
    }

    let total = count * layout.len();
    if out.len() < total {
        return Err(GpmfError::BufferTooSmall {
            needed: total,
            available: out.len(),
        });
    }

    let data = cursor.raw_data();
    let mut pos = 0;

    for sample in first_sample..first_sample + count {
        let base = sample * layout.struct_size();

        for (j, slot) in layout.slots().iter().enumerate() {
            let raw = read_element(data, base + slot.offset, slot.ty)?;
            out[pos] = if slot.ty.is_scalable() {
                raw / scale.divisor(j)
            } else {
                raw
            };
            pos += 1;
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use gpmf_types::{keys, FourCC};

    use super::*;
    use crate::{
        cursor::{Scope, SearchMode},
        test_support::{i32_structs, klv, nest, string, u16s, u32s},
    };

    fn cursor_at<'a>(
        buf: &'a [u8],
        key: &[u8; 4],
    ) -> RecordCursor<'a> {
        let mut c = RecordCursor::new(buf).unwrap();
        assert!(c.find_next(FourCC::new(key), Scope::Recurse, SearchMode::Strict).is_found());
        c
    }

    #[test]
    fn test_identity_scale_returns_raw_values() {
        let buf = nest(b"STRM", &[i32_structs(b"GPS5", 5, &[1, -2, 3, -4, 5, 6, 7, 8, 9, 10])]);
        let c = cursor_at(&buf, b"GPS5");

        let values = decode_scaled(&c, &ScaleDescriptor::identity(), &[]).unwrap();
        assert_eq!(values.len(), c.repeat() * c.elements_in_struct());
        assert_eq!(values, vec![1.0, -2.0, 3.0, -4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_divisors_cycle_per_element() {
        let buf = nest(b"STRM", &[i32_structs(b"ACCL", 3, &[100, 100, 100, 300, 300, 300])]);
        let c = cursor_at(&buf, b"ACCL");

        let scale = ScaleDescriptor::new(vec![10, 100]);
        let values = decode_scaled(&c, &scale, &[]).unwrap();
        assert_eq!(values, vec![10.0, 1.0, 10.0, 30.0, 3.0, 30.0]);
    }

    #[test]
    fn test_zero_divisor_treated_as_one() {
        let scale = ScaleDescriptor::new(vec![0, 4]);
        assert_eq!(scale.divisor(0), 1.0);
        assert_eq!(scale.divisor(1), 4.0);
        assert_eq!(scale.divisor(2), 1.0);
        assert_eq!(ScaleDescriptor::identity().divisor(7), 1.0);
    }

    #[test]
    fn test_fixed_point_scaled() {
        let raw: Vec<u8> = [0x0002_0000i32, 0x0000_8000]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        let buf = nest(b"STRM", &[klv(b"QVAL", b'q', 4, 2, &raw)]);
        let c = cursor_at(&buf, b"QVAL");

        let values = decode_scaled(&c, &ScaleDescriptor::new(vec![2]), &[]).unwrap();
        assert_eq!(values, vec![1.0, 0.25]);
    }

    #[test]
    fn test_complex_layout_with_fourcc() {
        // TYPE "LfF": u32, f32, FourCC, 12 байт на выборку
        let mut sample = Vec::new();
        sample.extend_from_slice(&1000u32.to_be_bytes());
        sample.extend_from_slice(&2.5f32.to_be_bytes());
        sample.extend_from_slice(b"HERO");
        let buf = nest(b"STRM", &[klv(b"CPLX", b'?', 12, 1, &sample)]);
        let c = cursor_at(&buf, b"CPLX");

        let types = [SampleType::UInt32, SampleType::Float, SampleType::FourCC];
        let layout = SampleLayout::for_cursor(&c, &types).unwrap();
        assert_eq!(layout.slots()[2].offset, 8);

        let values = decode_scaled(&c, &ScaleDescriptor::new(vec![10]), &types).unwrap();
        assert_eq!(values[0], 100.0);
        assert_eq!(values[1], 0.25);
        // FourCC не масштабируется
        assert_eq!(values[2], u32::from_be_bytes(*b"HERO") as f64);
    }

    #[test]
    fn test_complex_without_types_is_unknown() {
        let buf = nest(b"STRM", &[klv(b"CPLX", b'?', 4, 1, &[0; 4])]);
        let c = cursor_at(&buf, b"CPLX");

        assert!(matches!(
            decode_scaled(&c, &ScaleDescriptor::identity(), &[]),
            Err(GpmfError::UnknownType(b'?'))
        ));
    }

    #[test]
    fn test_complex_widths_exceed_struct_size() {
        let err = SampleLayout::new(
            SampleType::Complex,
            4,
            &[SampleType::UInt32, SampleType::Int16],
        )
        .unwrap_err();
        assert!(matches!(err, GpmfError::Corrupted(_)));
    }

    #[test]
    fn test_decode_into_window() {
        let buf = nest(b"STRM", &[u16s(b"SHRT", &[1, 2, 3, 4])]);
        let c = cursor_at(&buf, b"SHRT");

        let mut out = [0.0; 2];
        let n = decode_scaled_into(&c, &ScaleDescriptor::identity(), &[], 2, 2, &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, [3.0, 4.0]);

        assert!(matches!(
            decode_scaled_into(&c, &ScaleDescriptor::identity(), &[], 3, 2, &mut out),
            Err(GpmfError::BufferTooSmall { needed: 5, available: 4 })
        ));

        let mut short = [0.0; 1];
        assert!(matches!(
            decode_scaled_into(&c, &ScaleDescriptor::identity(), &[], 0, 2, &mut short),
            Err(GpmfError::BufferTooSmall { needed: 2, available: 1 })
        ));
    }

    #[test]
    fn test_utc_date_is_unsupported() {
        let buf = nest(b"STRM", &[klv(keys::GPSU.as_bytes(), b'U', 16, 1, b"170101120000.000")]);
        let c = cursor_at(&buf, b"GPSU");

        assert!(matches!(
            decode_scaled(&c, &ScaleDescriptor::identity(), &[]),
            Err(GpmfError::UnsupportedType('U'))
        ));
    }

    #[test]
    fn test_string_record_passes_bytes_through() {
        let buf = nest(b"STRM", &[string(b"STNM", "GPS")]);
        let c = cursor_at(&buf, b"STNM");

        let values = decode_scaled(&c, &ScaleDescriptor::new(vec![100]), &[]).unwrap();
        assert_eq!(values, vec![b'G' as f64, b'P' as f64, b'S' as f64]);
    }

    #[test]
    fn test_decode_scalar_uses_own_scale() {
        let buf = nest(
            b"STRM",
            &[u32s(b"GPSF", &[3]), u16s(b"SCAL", &[10]), u16s(b"GPSP", &[1500])],
        );

        let gpsf = cursor_at(&buf, b"GPSF");
        assert_eq!(decode_scalar_u32(&gpsf).unwrap(), 3);

        let gpsp = cursor_at(&buf, b"GPSP");
        assert_eq!(decode_scalar(&gpsp).unwrap(), 150.0);
    }

    #[test]
    fn test_random_int16_records_decode_exactly() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let elements = rng.gen_range(1..=8usize);
            let samples = rng.gen_range(0..=16usize);
            let values: Vec<i16> = (0..elements * samples).map(|_| rng.gen()).collect();
            let raw: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();

            let buf = nest(
                b"STRM",
                &[klv(b"RAND", b's', (elements * 2) as u8, samples as u16, &raw)],
            );
            let c = cursor_at(&buf, b"RAND");

            let decoded = decode_scaled(&c, &ScaleDescriptor::identity(), &[]).unwrap();
            let expected: Vec<f64> = values.iter().map(|&v| v as f64).collect();
            assert_eq!(decoded, expected);
        }
    }
}
