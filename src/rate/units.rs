//! Byte-size multipliers for use with `rate_per`.

use serde::{Deserialize, Serialize};

/// 10^3 bytes
pub const KB: i64 = 1_000;
/// 10^6 bytes
pub const MB: i64 = 1_000_000;
/// 10^9 bytes
pub const GB: i64 = 1_000_000_000;
/// 10^12 bytes
pub const TB: i64 = 1_000_000_000_000;

/// 2^10 bytes
pub const KIB: i64 = 1 << 10;
/// 2^20 bytes
pub const MIB: i64 = 1 << 20;
/// 2^30 bytes
pub const GIB: i64 = 1 << 30;
/// 2^40 bytes
pub const TIB: i64 = 1 << 40;

/// Display unit for reported rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Plain tokens (bytes)
    #[default]
    B,
    /// Kilobytes (10^3)
    Kb,
    /// Megabytes (10^6)
    Mb,
    /// Gigabytes (10^9)
    Gb,
    /// Terabytes (10^12)
    Tb,
    /// Kibibytes (2^10)
    Kib,
    /// Mebibytes (2^20)
    Mib,
    /// Gibibytes (2^30)
    Gib,
    /// Tebibytes (2^40)
    Tib,
}

impl Unit {
    /// Get the divisor converting bytes into this unit.
    pub fn divisor(&self) -> i64 {
        match self {
            Unit::B => 1,
            Unit::Kb => KB,
            Unit::Mb => MB,
            Unit::Gb => GB,
            Unit::Tb => TB,
            Unit::Kib => KIB,
            Unit::Mib => MIB,
            Unit::Gib => GIB,
            Unit::Tib => TIB,
        }
    }

    /// Get the suffix printed after a value in this unit.
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::B => "B",
            Unit::Kb => "kB",
            Unit::Mb => "MB",
            Unit::Gb => "GB",
            Unit::Tb => "TB",
            Unit::Kib => "KiB",
            Unit::Mib => "MiB",
            Unit::Gib => "GiB",
            Unit::Tib => "TiB",
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" => Ok(Unit::B),
            "kb" => Ok(Unit::Kb),
            "mb" => Ok(Unit::Mb),
            "gb" => Ok(Unit::Gb),
            "tb" => Ok(Unit::Tb),
            "kib" => Ok(Unit::Kib),
            "mib" => Ok(Unit::Mib),
            "gib" => Ok(Unit::Gib),
            "tib" => Ok(Unit::Tib),
            other => Err(format!("unknown unit '{}'", other)),
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}
