/// Временное окно полезной нагрузки `[in, out)` в секундах от начала записи.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeWindow {
    pub in_secs: f64,
    pub out_secs: f64,
}

impl TimeWindow {
    pub fn new(
        in_secs: f64,
        out_secs: f64,
    ) -> Self {
        TimeWindow { in_secs, out_secs }
    }

    /// Длительность окна (`out - in`).
    pub fn span(&self) -> f64 {
        self.out_secs - self.in_secs
    }
}
