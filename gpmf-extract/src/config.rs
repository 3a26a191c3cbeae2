use gpmf_types::{keys, FourCC};

/// Формат выходных строк.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `GPS5, 1483272000.0000000000, 1.500, 3, ...`
    #[default]
    Csv,
    /// Один JSON-объект на строку
    JsonLines,
}

/// Конфигурация сессии извлечения.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Запись данных, из которой строятся строки
    pub target: FourCC,
    /// Контейнер потока, внутри которого ищется `target`
    pub stream: FourCC,
    /// Дописывать единицы измерения к числовым значениям
    pub show_units: bool,
    /// Логировать номер каждой полезной нагрузки
    pub show_payload_index: bool,
    /// Логировать временное окно каждой полезной нагрузки
    pub show_payload_time: bool,
    /// Выводить дерево записей перед строками
    pub show_structure: bool,
    pub format: OutputFormat,
}

impl ExtractConfig {
    fn new() -> Self {
        Self {
            target: keys::GPS5,
            stream: keys::STRM,
            show_units: true,
            show_payload_index: false,
            show_payload_time: false,
            show_structure: false,
            format: OutputFormat::Csv,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::JsonLines => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" | "jsonl" | "json-lines" => Ok(OutputFormat::JsonLines),
            _ => Err(format!("Unknown output format '{s}'. Use: csv, json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ExtractConfig::default();
        assert_eq!(cfg.target, keys::GPS5);
        assert_eq!(cfg.stream, keys::STRM);
        assert!(cfg.show_units);
        assert!(!cfg.show_structure);
        assert_eq!(cfg.format, OutputFormat::Csv);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::JsonLines);
        assert!("xml".parse::<OutputFormat>().is_err());

        for f in [OutputFormat::Csv, OutputFormat::JsonLines] {
            assert_eq!(f.to_string().parse::<OutputFormat>().unwrap(), f);
        }
    }
}
