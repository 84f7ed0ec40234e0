//! Byte sizes and clock frequencies.
//!
//! Configuration files write quantities the way hardware people say them
//! (`"32KiB"`, `"16kB"`, `"3GiB"`, `"3GHz"`). Both types deserialize from
//! either such a string or a plain integer.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::constants::TICKS_PER_SECOND;
use super::error::ConfigError;

/// Untagged wire form shared by [`ByteSize`] and [`Frequency`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(u64),
    Text(String),
}

/// Splits `"32KiB"` into `(32, "KiB")`.
fn split_quantity(input: &str) -> (&str, &str) {
    let trimmed = input.trim();
    let idx = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (num, unit) = trimmed.split_at(idx);
    (num, unit.trim())
}

/// A size in bytes.
///
/// Memory-size suffixes are binary: `kB`, `KB` and `KiB` all mean 1024 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "RawQuantity")]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// `n` kibibytes.
    pub const fn kib(n: u64) -> Self {
        Self(n * 1024)
    }

    /// `n` mebibytes.
    pub const fn mib(n: u64) -> Self {
        Self(n * 1024 * 1024)
    }

    /// `n` gibibytes.
    pub const fn gib(n: u64) -> Self {
        Self(n * 1024 * 1024 * 1024)
    }

    /// Size in bytes.
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::Parse {
            input: s.to_string(),
            what: "byte size",
        };
        let (num, unit) = split_quantity(s);
        let value: u64 = num.parse().map_err(|_| err())?;
        let scale: u64 = match unit {
            "" | "B" => 1,
            "kB" | "KB" | "KiB" => 1 << 10,
            "MB" | "MiB" => 1 << 20,
            "GB" | "GiB" => 1 << 30,
            "TB" | "TiB" => 1 << 40,
            _ => return Err(err()),
        };
        value.checked_mul(scale).map(Self).ok_or_else(err)
    }
}

impl TryFrom<RawQuantity> for ByteSize {
    type Error = ConfigError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        match raw {
            RawQuantity::Int(n) => Ok(Self(n)),
            RawQuantity::Text(s) => s.parse(),
        }
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(u64, &str); 4] = [(1 << 40, "TiB"), (1 << 30, "GiB"), (1 << 20, "MiB"), (1 << 10, "KiB")];
        for (scale, suffix) in UNITS {
            if self.0 >= scale && self.0 % scale == 0 {
                return write!(f, "{}{}", self.0 / scale, suffix);
            }
        }
        write!(f, "{}B", self.0)
    }
}

/// A clock frequency in hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawQuantity")]
pub struct Frequency(pub u64);

impl Frequency {
    /// `n` gigahertz.
    pub const fn ghz(n: u64) -> Self {
        Self(n * 1_000_000_000)
    }

    /// `n` megahertz.
    pub const fn mhz(n: u64) -> Self {
        Self(n * 1_000_000)
    }

    /// Frequency in hertz.
    pub const fn hz(self) -> u64 {
        self.0
    }

    /// Length of one clock cycle in simulation ticks, or `None` if the clock
    /// is zero or faster than the tick resolution.
    pub const fn period_ticks(self) -> Option<u64> {
        if self.0 == 0 || self.0 > TICKS_PER_SECOND {
            None
        } else {
            Some(TICKS_PER_SECOND / self.0)
        }
    }
}

impl FromStr for Frequency {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::Parse {
            input: s.to_string(),
            what: "frequency",
        };
        let (num, unit) = split_quantity(s);
        let value: u64 = num.parse().map_err(|_| err())?;
        let scale: u64 = match unit {
            "" | "Hz" => 1,
            "kHz" => 1_000,
            "MHz" => 1_000_000,
            "GHz" => 1_000_000_000,
            _ => return Err(err()),
        };
        value.checked_mul(scale).map(Self).ok_or_else(err)
    }
}

impl TryFrom<RawQuantity> for Frequency {
    type Error = ConfigError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        match raw {
            RawQuantity::Int(n) => Ok(Self(n)),
            RawQuantity::Text(s) => s.parse(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.0;
        if hz >= 1_000_000_000 && hz % 1_000_000_000 == 0 {
            write!(f, "{}GHz", hz / 1_000_000_000)
        } else if hz >= 1_000_000 && hz % 1_000_000 == 0 {
            write!(f, "{}MHz", hz / 1_000_000)
        } else {
            write!(f, "{hz}Hz")
        }
    }
}
