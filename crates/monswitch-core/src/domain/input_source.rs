//! Hardware input-selector codes.
//!
//! Monitors expose their active video input as a small integer (the MCCS
//! "input select" value).  The codes `1..=23` have well-known meanings; every
//! other value is displayed as `"Unknown"`.
//!
//! | Code | Name          | Code | Name          | Code | Name          |
//! |------|---------------|------|---------------|------|---------------|
//! | 1    | VGA 1         | 9    | Tuner 1       | 17   | HDMI 1        |
//! | 2    | VGA 2         | 10   | Tuner 2       | 18   | HDMI 2        |
//! | 3    | DVI 1         | 11   | Tuner 3       | 19   | HDMI 3        |
//! | 4    | DVI 2         | 12   | Component 1   | 20   | HDMI 4        |
//! | 5    | Composite 1   | 13   | Component 2   | 21   | USB-C 1       |
//! | 6    | Composite 2   | 14   | Component 3   | 22   | USB-C 2       |
//! | 7    | S-Video 1     | 15   | DisplayPort 1 | 23   | USB-C 3       |
//! | 8    | S-Video 2     | 16   | DisplayPort 2 |      |               |
//!
//! # Why a newtype instead of an enum?
//!
//! The code crosses the C function boundary as a bare `u16`, and the library
//! may hand back values outside the known table (vendor-specific inputs, or
//! the `0xFF` failure sentinel).  A Rust `enum` cannot hold an arbitrary
//! discriminant safely, so `InputSource` is a `#[repr(transparent)]` wrapper
//! whose name lookup falls back to `"Unknown"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label used for any code that is not in the static name table.
const UNKNOWN_LABEL: &str = "Unknown";

/// Static name table, indexed by `code - 1`.
const NAMES: [&str; 23] = [
    "VGA 1",
    "VGA 2",
    "DVI 1",
    "DVI 2",
    "Composite 1",
    "Composite 2",
    "S-Video 1",
    "S-Video 2",
    "Tuner 1",
    "Tuner 2",
    "Tuner 3",
    "Component 1",
    "Component 2",
    "Component 3",
    "DisplayPort 1",
    "DisplayPort 2",
    "HDMI 1",
    "HDMI 2",
    "HDMI 3",
    "HDMI 4",
    "USB-C 1",
    "USB-C 2",
    "USB-C 3",
];

/// An opaque hardware input-selector code.
///
/// Equality is by code.  The type is `#[repr(transparent)]`, so a
/// `*mut InputSource` and a `*mut u16` have the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct InputSource(u16);

impl InputSource {
    pub const VGA1: Self = Self(0x01);
    pub const VGA2: Self = Self(0x02);
    pub const DVI1: Self = Self(0x03);
    pub const DVI2: Self = Self(0x04);
    pub const COMPOSITE1: Self = Self(0x05);
    pub const COMPOSITE2: Self = Self(0x06);
    pub const SVIDEO1: Self = Self(0x07);
    pub const SVIDEO2: Self = Self(0x08);
    pub const TUNER1: Self = Self(0x09);
    pub const TUNER2: Self = Self(0x0A);
    pub const TUNER3: Self = Self(0x0B);
    pub const COMPONENT1: Self = Self(0x0C);
    pub const COMPONENT2: Self = Self(0x0D);
    pub const COMPONENT3: Self = Self(0x0E);
    pub const DISPLAY_PORT1: Self = Self(0x0F);
    pub const DISPLAY_PORT2: Self = Self(0x10);
    pub const HDMI1: Self = Self(0x11);
    pub const HDMI2: Self = Self(0x12);
    pub const HDMI3: Self = Self(0x13);
    pub const HDMI4: Self = Self(0x14);
    pub const USB_C1: Self = Self(0x15);
    pub const USB_C2: Self = Self(0x16);
    pub const USB_C3: Self = Self(0x17);

    /// Sentinel the native library reports when the current input could not
    /// be read (or the monitor index was invalid).
    pub const UNKNOWN: Self = Self(0xFF);

    /// Wraps a raw code.  Any value is accepted; unknown codes simply display
    /// as `"Unknown"`.
    pub const fn from_code(code: u16) -> Self {
        Self(code)
    }

    /// Returns the raw code as sent across the C boundary.
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Returns `true` if the code has an entry in the static name table.
    pub const fn is_known(self) -> bool {
        self.0 >= 1 && self.0 as usize <= NAMES.len()
    }

    /// Returns the static display name, or `"Unknown"` for unrecognised codes.
    pub fn name(self) -> &'static str {
        if self.is_known() {
            NAMES[self.0 as usize - 1]
        } else {
            UNKNOWN_LABEL
        }
    }

    /// Iterates over every code in the static name table, in code order.
    pub fn known() -> impl Iterator<Item = InputSource> {
        (1..=NAMES.len() as u16).map(InputSource)
    }
}

impl Default for InputSource {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl From<u16> for InputSource {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<InputSource> for u16 {
    fn from(input: InputSource) -> Self {
        input.0
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when text cannot be interpreted as an input source.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputParseError {
    #[error("empty input name")]
    Empty,

    #[error("unrecognised input {0:?} (expected a code such as 17 or 0x11, or a name such as \"HDMI 1\")")]
    Unrecognised(String),
}

impl FromStr for InputSource {
    type Err = InputParseError;

    /// Accepts a decimal code (`"17"`), a hex code (`"0x11"`), or a table name
    /// compared case-insensitively with spaces, dashes and underscores ignored
    /// (`"HDMI 1"`, `"hdmi1"`, `"usb-c 2"`).  `"dp1"` is accepted as a
    /// shorthand for DisplayPort.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InputParseError::Empty);
        }

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return u16::from_str_radix(hex, 16)
                .map(InputSource)
                .map_err(|_| InputParseError::Unrecognised(s.to_string()));
        }
        if let Ok(code) = trimmed.parse::<u16>() {
            return Ok(InputSource(code));
        }

        let wanted = squash(trimmed);
        let wanted = match wanted.strip_prefix("dp") {
            Some(rest) => format!("displayport{rest}"),
            None => wanted,
        };
        InputSource::known()
            .find(|input| squash(input.name()) == wanted)
            .ok_or_else(|| InputParseError::Unrecognised(s.to_string()))
    }
}

/// Lower-cases `s` and drops separators so `"USB-C 1"` matches `"usbc1"`.
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_to_fixed_labels() {
        assert_eq!(InputSource::VGA1.name(), "VGA 1");
        assert_eq!(InputSource::SVIDEO2.name(), "S-Video 2");
        assert_eq!(InputSource::DISPLAY_PORT1.name(), "DisplayPort 1");
        assert_eq!(InputSource::HDMI1.name(), "HDMI 1");
        assert_eq!(InputSource::HDMI4.name(), "HDMI 4");
        assert_eq!(InputSource::USB_C1.name(), "USB-C 1");
        assert_eq!(InputSource::USB_C3.name(), "USB-C 3");
    }

    #[test]
    fn test_codes_outside_table_display_as_unknown() {
        for code in [0u16, 24, 0x60, 0xFF, u16::MAX] {
            let input = InputSource::from_code(code);
            assert!(!input.is_known(), "code {code} must not be known");
            assert_eq!(input.name(), "Unknown");
        }
    }

    #[test]
    fn test_known_iterates_all_twenty_three_codes_in_order() {
        let codes: Vec<u16> = InputSource::known().map(InputSource::code).collect();
        assert_eq!(codes.len(), 23);
        assert_eq!(codes.first(), Some(&1));
        assert_eq!(codes.last(), Some(&23));
        assert!(codes.windows(2).all(|w| w[0] + 1 == w[1]));
    }

    #[test]
    fn test_equality_is_by_code() {
        assert_eq!(InputSource::from_code(17), InputSource::HDMI1);
        assert_ne!(InputSource::from_code(18), InputSource::HDMI1);
    }

    #[test]
    fn test_default_is_unknown_sentinel() {
        assert_eq!(InputSource::default(), InputSource::UNKNOWN);
        assert_eq!(InputSource::default().code(), 0xFF);
    }

    #[test]
    fn test_display_uses_table_name() {
        assert_eq!(InputSource::USB_C2.to_string(), "USB-C 2");
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_decimal_and_hex_codes() {
        assert_eq!("17".parse::<InputSource>(), Ok(InputSource::HDMI1));
        assert_eq!("0x15".parse::<InputSource>(), Ok(InputSource::USB_C1));
        assert_eq!("0X0f".parse::<InputSource>(), Ok(InputSource::DISPLAY_PORT1));
    }

    #[test]
    fn test_parse_names_ignores_case_and_separators() {
        assert_eq!("HDMI 2".parse::<InputSource>(), Ok(InputSource::HDMI2));
        assert_eq!("hdmi2".parse::<InputSource>(), Ok(InputSource::HDMI2));
        assert_eq!("usb-c 3".parse::<InputSource>(), Ok(InputSource::USB_C3));
        assert_eq!("S_Video_1".parse::<InputSource>(), Ok(InputSource::SVIDEO1));
        assert_eq!("dp2".parse::<InputSource>(), Ok(InputSource::DISPLAY_PORT2));
    }

    #[test]
    fn test_parse_rejects_empty_and_unknown_names() {
        assert_eq!("  ".parse::<InputSource>(), Err(InputParseError::Empty));
        assert!(matches!(
            "thunderbolt".parse::<InputSource>(),
            Err(InputParseError::Unrecognised(_))
        ));
        assert!(matches!(
            "0xZZ".parse::<InputSource>(),
            Err(InputParseError::Unrecognised(_))
        ));
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Wrapper {
            input: InputSource,
        }

        let text = toml::to_string(&Wrapper { input: InputSource::HDMI1 }).expect("serialize");
        assert_eq!(text.trim(), "input = 17");

        let back: Wrapper = toml::from_str(&text).expect("deserialize");
        assert_eq!(back.input, InputSource::HDMI1);
    }
}
