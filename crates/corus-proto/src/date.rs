//! Packed date/time codec.
//!
//! A Corus timestamp is a 32-bit integer with the following bit layout:
//!
//! ```text
//! bits  0..=5   second (0-59)
//! bits  6..=11  minute (0-59)
//! bits 12..=16  hour   (0-23)
//! bits 17..=21  day    (1-31)
//! bits 22..=25  month  (1-12)
//! bits 26..=31  year - 2000
//! ```
//!
//! The integer is serialized little-endian. Four zero bytes decode to, and
//! encode from, an absent timestamp.

/// A decoded Corus timestamp. Deliberately narrow: the wire format carries
/// no sub-second precision, timezone, or calendar validation beyond its bit
/// widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CorusDateTime {
    /// Full year, e.g. 2024.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
    /// Second, 0-59.
    pub second: u8,
}

const YEAR_EPOCH: u16 = 2000;

const SECOND_SHIFT: u32 = 0;
const MINUTE_SHIFT: u32 = 6;
const HOUR_SHIFT: u32 = 12;
const DAY_SHIFT: u32 = 17;
const MONTH_SHIFT: u32 = 22;
const YEAR_SHIFT: u32 = 26;

const SECOND_MASK: u32 = 0b11_1111;
const MINUTE_MASK: u32 = 0b11_1111;
const HOUR_MASK: u32 = 0b1_1111;
const DAY_MASK: u32 = 0b1_1111;
const MONTH_MASK: u32 = 0b1111;
const YEAR_MASK: u32 = 0b11_1111;

impl CorusDateTime {
    /// Packs this timestamp into its little-endian 4-byte wire form.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 4] {
        let year = u32::from(self.year - YEAR_EPOCH);
        let value = (u32::from(self.second) & SECOND_MASK) << SECOND_SHIFT
            | (u32::from(self.minute) & MINUTE_MASK) << MINUTE_SHIFT
            | (u32::from(self.hour) & HOUR_MASK) << HOUR_SHIFT
            | (u32::from(self.day) & DAY_MASK) << DAY_SHIFT
            | (u32::from(self.month) & MONTH_MASK) << MONTH_SHIFT
            | (year & YEAR_MASK) << YEAR_SHIFT;
        value.to_le_bytes()
    }

    /// Unpacks a little-endian 4-byte wire value into a timestamp.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        let value = u32::from_le_bytes(bytes);
        Self {
            year: ((value >> YEAR_SHIFT) & YEAR_MASK) as u16 + YEAR_EPOCH,
            month: ((value >> MONTH_SHIFT) & MONTH_MASK) as u8,
            day: ((value >> DAY_SHIFT) & DAY_MASK) as u8,
            hour: ((value >> HOUR_SHIFT) & HOUR_MASK) as u8,
            minute: ((value >> MINUTE_SHIFT) & MINUTE_MASK) as u8,
            second: ((value >> SECOND_SHIFT) & SECOND_MASK) as u8,
        }
    }
}

/// Encodes an optional timestamp. `None` packs to four zero bytes.
#[must_use]
pub fn encode(date: Option<CorusDateTime>) -> [u8; 4] {
    match date {
        Some(date) => date.to_bytes(),
        None => [0, 0, 0, 0],
    }
}

/// Decodes four wire bytes into an optional timestamp. All-zero bytes
/// decode to `None`.
#[must_use]
pub fn decode(bytes: [u8; 4]) -> Option<CorusDateTime> {
    if bytes == [0, 0, 0, 0] { None } else { Some(CorusDateTime::from_bytes(bytes)) }
}
