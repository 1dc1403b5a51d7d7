//! Generator current modes `I1`..`I19`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MIN_CURRENT_MODE: u8 = 1;
pub const MAX_CURRENT_MODE: u8 = 19;

/// Peak current per mode step [A].
const AMPS_PER_MODE: f64 = 12.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown current mode '{label}' (expected I1..I19)")]
pub struct UnknownCurrentMode {
    pub label: String,
}

/// Discrete generator current setting. Peak current is `12 A · n` for `In`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrentMode(u8);

impl CurrentMode {
    pub fn new(index: u8) -> Result<Self, UnknownCurrentMode> {
        if (MIN_CURRENT_MODE..=MAX_CURRENT_MODE).contains(&index) {
            Ok(Self(index))
        } else {
            Err(UnknownCurrentMode {
                label: format!("I{index}"),
            })
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Peak discharge current [A].
    pub fn peak_current(self) -> f64 {
        AMPS_PER_MODE * f64::from(self.0)
    }

    pub fn all() -> impl Iterator<Item = CurrentMode> {
        (MIN_CURRENT_MODE..=MAX_CURRENT_MODE).map(CurrentMode)
    }
}

impl Default for CurrentMode {
    fn default() -> Self {
        Self(5)
    }
}

impl fmt::Display for CurrentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}

impl FromStr for CurrentMode {
    type Err = UnknownCurrentMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCurrentMode {
            label: s.to_string(),
        };
        let digits = s.trim().strip_prefix('I').ok_or_else(unknown)?;
        let index: u8 = digits.parse().map_err(|_| unknown())?;
        Self::new(index).map_err(|_| unknown())
    }
}

impl TryFrom<String> for CurrentMode {
    type Error = UnknownCurrentMode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrentMode> for String {
    fn from(mode: CurrentMode) -> Self {
        mode.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values() {
        assert_eq!("I1".parse::<CurrentMode>().unwrap().peak_current(), 12.0);
        assert_eq!(CurrentMode::default().peak_current(), 60.0);
        assert_eq!("I19".parse::<CurrentMode>().unwrap().peak_current(), 228.0);
        assert_eq!(CurrentMode::all().count(), 19);
    }

    #[test]
    fn unknown_labels() {
        for label in ["I0", "I20", "5", "i5", "Ix", ""] {
            let err = label.parse::<CurrentMode>().unwrap_err();
            assert_eq!(err.label, label);
        }
    }

    #[test]
    fn serde_as_label() {
        let mode: CurrentMode = serde_json::from_str("\"I7\"").unwrap();
        assert_eq!(mode.index(), 7);
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"I7\"");
        assert!(serde_json::from_str::<CurrentMode>("\"I42\"").is_err());
    }
}
