use crate::{GpmfError, GpmfResult};

/// Четырёхсимвольный ключ записи (FourCC), например `GPS5`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Нулевой ключ: признак выравнивания/конца уровня.
    pub const NULL: FourCC = FourCC([0; 4]);

    pub const fn new(bytes: &[u8; 4]) -> Self {
        FourCC(*bytes)
    }

    pub fn from_u32(v: u32) -> Self {
        FourCC(v.to_be_bytes())
    }

    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0; 4]
    }
}

/// Ключи, используемые при извлечении GPS.
pub mod keys {
    use super::FourCC;

    /// Device container
    pub const DEVC: FourCC = FourCC::new(b"DEVC");
    /// Stream container
    pub const STRM: FourCC = FourCC::new(b"STRM");
    /// Stream name
    pub const STNM: FourCC = FourCC::new(b"STNM");
    /// Делители масштаба
    pub const SCAL: FourCC = FourCC::new(b"SCAL");
    /// Единицы СИ
    pub const SIUN: FourCC = FourCC::new(b"SIUN");
    /// Произвольные единицы (если SIUN отсутствует)
    pub const UNIT: FourCC = FourCC::new(b"UNIT");
    /// Типы элементов complex-структуры
    pub const TYPE: FourCC = FourCC::new(b"TYPE");
    /// lat, lon, alt, 2D speed, 3D speed
    pub const GPS5: FourCC = FourCC::new(b"GPS5");
    /// UTC дата/время `YYMMDDhhmmss.sss`
    pub const GPSU: FourCC = FourCC::new(b"GPSU");
    /// Качество фикса (0 нет, 2 2D, 3 3D)
    pub const GPSF: FourCC = FourCC::new(b"GPSF");
    /// DOP × 100
    pub const GPSP: FourCC = FourCC::new(b"GPSP");
}

impl std::fmt::Display for FourCC {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for FourCC {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl std::str::FromStr for FourCC {
    type Err = GpmfError;

    /// Ровно четыре ASCII-символа.
    fn from_str(s: &str) -> GpmfResult<Self> {
        let bytes = s.as_bytes();

        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(GpmfError::corrupted(format!(
                "'{s}' is not a four character code"
            )));
        }

        Ok(FourCC([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
