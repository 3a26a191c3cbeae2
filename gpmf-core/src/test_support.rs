//! Построитель KLV-буферов для тестов и бенчмарков.
//!
//! Только для тестовых данных: запись формата не входит в задачи крейта.

use gpmf_types::{keys, FourCC};

use crate::binary::write::{pad_to_alignment, write_header};

/// Одна запись с произвольными данными, выровненная до 4 байт.
pub fn klv(
    key: &[u8; 4],
    type_code: u8,
    struct_size: u8,
    repeat: u16,
    data: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + data.len() + 3);
    write_header(&mut buf, FourCC::new(key), type_code, struct_size, repeat);
    buf.extend_from_slice(data);
    pad_to_alignment(&mut buf);
    buf
}

/// Вложенная запись из уже собранных дочерних.
pub fn nest(
    key: &[u8; 4],
    children: &[Vec<u8>],
) -> Vec<u8> {
    let body: Vec<u8> = children.concat();
    let (struct_size, repeat) = if body.len() <= u16::MAX as usize {
        (1u8, body.len() as u16)
    } else {
        (4u8, (body.len() / 4) as u16)
    };
    klv(key, 0, struct_size, repeat, &body)
}

/// Строка `c` одной выборкой.
pub fn string(
    key: &[u8; 4],
    s: &str,
) -> Vec<u8> {
    klv(key, b'c', s.len() as u8, 1, s.as_bytes())
}

/// Набор строк фиксированной ширины (`UNIT`, `SIUN`).
pub fn strings(
    key: &[u8; 4],
    width: u8,
    values: &[&str],
) -> Vec<u8> {
    let mut data = Vec::with_capacity(width as usize * values.len());
    for v in values {
        let mut field = v.as_bytes().to_vec();
        field.resize(width as usize, 0);
        data.extend_from_slice(&field);
    }
    klv(key, b'c', width, values.len() as u16, &data)
}

pub fn i16s(
    key: &[u8; 4],
    values: &[i16],
) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    klv(key, b's', 2, values.len() as u16, &data)
}

pub fn u16s(
    key: &[u8; 4],
    values: &[u16],
) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    klv(key, b'S', 2, values.len() as u16, &data)
}

pub fn u32s(
    key: &[u8; 4],
    values: &[u32],
) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    klv(key, b'L', 4, values.len() as u16, &data)
}

pub fn i32s(
    key: &[u8; 4],
    values: &[i32],
) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    klv(key, b'l', 4, values.len() as u16, &data)
}

/// Структуры `l` по `elements` элементов в выборке.
pub fn i32_structs(
    key: &[u8; 4],
    elements: usize,
    values: &[i32],
) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    klv(
        key,
        b'l',
        (elements * 4) as u8,
        (values.len() / elements) as u16,
        &data,
    )
}

/// Поток GPS5 с метаданными группы, как его пишут камеры GoPro.
#[derive(Debug, Clone, Default)]
pub struct GpsStreamBuilder {
    pub timestamp: Option<String>,
    pub fix: Option<u32>,
    pub precision: Option<u16>,
    pub units: Vec<&'static str>,
    pub scale: Vec<i32>,
    pub samples: Vec<[i32; 5]>,
}

impl GpsStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamp(
        mut self,
        ts: &str,
    ) -> Self {
        self.timestamp = Some(ts.to_string());
        self
    }

    pub fn fix(
        mut self,
        fix: u32,
    ) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn precision(
        mut self,
        dop_x100: u16,
    ) -> Self {
        self.precision = Some(dop_x100);
        self
    }

    pub fn units(
        mut self,
        units: &[&'static str],
    ) -> Self {
        self.units = units.to_vec();
        self
    }

    pub fn scale(
        mut self,
        scale: &[i32],
    ) -> Self {
        self.scale = scale.to_vec();
        self
    }

    pub fn sample(
        mut self,
        s: [i32; 5],
    ) -> Self {
        self.samples.push(s);
        self
    }

    /// Собирает `STRM` со всеми заданными полями перед `GPS5`.
    pub fn build(&self) -> Vec<u8> {
        let mut children = vec![string(b"STNM", "GPS (Lat., Long., Alt., 2D speed, 3D speed)")];

        if let Some(fix) = self.fix {
            children.push(u32s(keys::GPSF.as_bytes(), &[fix]));
        }
        if let Some(ts) = &self.timestamp {
            children.push(klv(
                keys::GPSU.as_bytes(),
                b'U',
                ts.len() as u8,
                1,
                ts.as_bytes(),
            ));
        }
        if let Some(p) = self.precision {
            children.push(u16s(keys::GPSP.as_bytes(), &[p]));
        }
        if !self.units.is_empty() {
            children.push(strings(keys::UNIT.as_bytes(), 4, &self.units));
        }
        if !self.scale.is_empty() {
            children.push(i32s(keys::SCAL.as_bytes(), &self.scale));
        }

        let flat: Vec<i32> = self.samples.iter().flatten().copied().collect();
        children.push(i32_structs(keys::GPS5.as_bytes(), 5, &flat));

        nest(keys::STRM.as_bytes(), &children)
    }
}

/// `DEVC` с заданными потоками: одна полезная нагрузка.
pub fn device(streams: &[Vec<u8>]) -> Vec<u8> {
    let mut children = vec![u32s(b"DVID", &[1]), string(b"DVNM", "Camera")];
    children.extend_from_slice(streams);
    nest(keys::DEVC.as_bytes(), &children)
}
