/// Итоги сессии извлечения.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractStats {
    /// Полезных нагрузок в источнике
    pub payloads_total: usize,
    /// Разобраны до конца
    pub payloads_processed: usize,
    /// Пропущены: не прочитались или буфер меньше заголовка
    pub payloads_skipped: usize,
    /// Прерваны из-за повреждённой структуры
    pub payloads_corrupted: usize,
    /// Групп (записей данных), давших строки
    pub groups_emitted: usize,
    /// Групп, пропущенных из-за ошибки декодирования
    pub groups_skipped: usize,
    /// Групп без GPSU: время от начала окна, а не UTC
    pub groups_relative_time: usize,
    pub rows_emitted: usize,
    /// Остановлено по Ctrl+C
    pub stopped: bool,
    pub duration_secs: f64,
}

impl ExtractStats {
    pub fn has_corruption(&self) -> bool {
        self.payloads_corrupted > 0
    }
}

impl std::fmt::Display for ExtractStats {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.3}s", self.duration_secs)?;
        writeln!(
            f,
            "  Payloads      : {}/{}",
            self.payloads_processed, self.payloads_total
        )?;
        writeln!(f, "  Skipped       : {}", self.payloads_skipped)?;
        writeln!(f, "  Corrupted     : {}", self.payloads_corrupted)?;
        writeln!(
            f,
            "  Groups        : {} ({} skipped)",
            self.groups_emitted, self.groups_skipped
        )?;
        if self.groups_relative_time > 0 {
            writeln!(f, "  No GPSU       : {} groups", self.groups_relative_time)?;
        }
        writeln!(f, "  Rows          : {}", self.rows_emitted)?;
        if self.stopped {
            writeln!(f, "  Stopped       : Ctrl+C")?;
        }
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}
