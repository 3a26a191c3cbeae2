//! Построение и вывод строк по выборкам записи данных.

use std::io::Write;

use gpmf_core::{
    binary::read::read_latin1,
    codec::{decode_scaled, SampleLayout},
    metadata::{resolve_element_types, resolve_scale, resolve_units},
    GpsFix, RecordCursor,
};
use gpmf_types::{keys, FourCC, GpmfResult, SampleType, TimeWindow};
use serde::Serialize;

use crate::{ExtractConfig, ExtractResult, OutputFormat};

/// Значение одного элемента выборки.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Scaled {
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    /// FourCC-элемент или строковая выборка
    Text(String),
}

/// Одна выходная строка, соответствующая одной выборке.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub tag: String,
    pub time: f64,
    pub accuracy: f64,
    pub fix: u32,
    pub values: Vec<Field>,
}

pub struct RowEmitter<'c> {
    config: &'c ExtractConfig,
}

impl<'c> RowEmitter<'c> {
    pub fn new(config: &'c ExtractConfig) -> Self {
        Self { config }
    }

    /// Строки для всех выборок записи под курсором.
    ///
    /// Время выборки `i` из `repeat` интерполируется по окну `window`.
    pub fn build_rows(
        &self,
        cursor: &RecordCursor<'_>,
        fix: &GpsFix,
        window: &TimeWindow,
    ) -> GpmfResult<Vec<Row>> {
        let repeat = cursor.repeat();
        let tag = cursor.key().to_string();

        let fields = if cursor.sample_type()? == SampleType::Ascii {
            text_fields(cursor)
        } else {
            self.numeric_fields(cursor)?
        };

        Ok(fields
            .into_iter()
            .enumerate()
            .map(|(i, values)| Row {
                tag: tag.clone(),
                time: fix.sample_time(i, repeat, window),
                accuracy: fix.accuracy,
                fix: fix.fix,
                values,
            })
            .collect())
    }

    fn numeric_fields(
        &self,
        cursor: &RecordCursor<'_>,
    ) -> GpmfResult<Vec<Vec<Field>>> {
        let types = resolve_element_types(cursor)?;
        let scale = resolve_scale(cursor)?;
        let units = if self.config.show_units {
            resolve_units(cursor)
        } else {
            Vec::new()
        };

        let layout = SampleLayout::for_cursor(cursor, &types)?;
        let values = decode_scaled(cursor, &scale, &types)?;
        let raw = cursor.raw_data();

        if layout.is_empty() {
            return Ok(vec![Vec::new(); cursor.repeat()]);
        }

        Ok(values
            .chunks_exact(layout.len())
            .enumerate()
            .map(|(i, sample)| {
                let base = i * layout.struct_size();
                layout
                    .slots()
                    .iter()
                    .zip(sample)
                    .enumerate()
                    .map(|(j, (slot, &value))| match slot.ty {
                        SampleType::FourCC => {
                            let at = base + slot.offset;
                            let code = FourCC([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
                            Field::Text(code.to_string())
                        }
                        _ => Field::Scaled {
                            value,
                            unit: (!units.is_empty()).then(|| units[j % units.len()].clone()),
                        },
                    })
                    .collect()
            })
            .collect())
    }

    /// Пишет строку в выбранном формате.
    pub fn write_row<W: Write>(
        &self,
        row: &Row,
        out: &mut W,
    ) -> ExtractResult<()> {
        match self.config.format {
            OutputFormat::Csv => {
                write!(out, "{}, {:.10}, {:.3}, {}", row.tag, row.time, row.accuracy, row.fix)?;
                for field in &row.values {
                    match field {
                        Field::Scaled { value, unit } => {
                            write!(out, ", {value:.10}{}", unit.as_deref().unwrap_or(""))?
                        }
                        Field::Text(text) => write!(out, ", {text}")?,
                    }
                }
                writeln!(out)?;
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut *out, row)?;
                writeln!(out)?;
            }
        }

        Ok(())
    }

    /// Заголовок CSV; для GPS5 с названиями колонок.
    pub fn csv_header(&self) -> String {
        if self.config.target == keys::GPS5 {
            "Label, GPS Time, Accuracy, Fix, Latitude, Longitude, Altitude, 2D Speed, 3D Speed"
                .to_string()
        } else {
            "Label, Time, Accuracy, Fix, Values".to_string()
        }
    }
}

/// Строковая запись: по одному полю на выборку.
fn text_fields(cursor: &RecordCursor<'_>) -> Vec<Vec<Field>> {
    let width = cursor.struct_size();
    if width == 0 {
        return vec![Vec::new(); cursor.repeat()];
    }

    cursor
        .raw_data()
        .chunks_exact(width)
        .map(|sample| vec![Field::Text(read_latin1(sample))])
        .collect()
}
