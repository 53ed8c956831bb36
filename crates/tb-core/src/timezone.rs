//! The fixed table of supported timezones.
//!
//! Offsets are constant: daylight saving is never observed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// A supported named UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timezone {
    Kaliningrad,
    #[default]
    Moscow,
    Samara,
    Yekaterinburg,
    Novosibirsk,
    Vladivostok,
}

impl Timezone {
    /// Every supported timezone, west to east.
    pub const ALL: [Self; 6] = [
        Self::Kaliningrad,
        Self::Moscow,
        Self::Samara,
        Self::Yekaterinburg,
        Self::Novosibirsk,
        Self::Vladivostok,
    ];

    /// Name used for storage and for matching user input.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Kaliningrad => "Kaliningrad",
            Self::Moscow => "Moscow",
            Self::Samara => "Samara",
            Self::Yekaterinburg => "Yekaterinburg",
            Self::Novosibirsk => "Novosibirsk",
            Self::Vladivostok => "Vladivostok",
        }
    }

    pub const fn utc_offset_hours(self) -> i64 {
        match self {
            Self::Kaliningrad => 2,
            Self::Moscow => 3,
            Self::Samara => 4,
            Self::Yekaterinburg => 5,
            Self::Novosibirsk => 7,
            Self::Vladivostok => 10,
        }
    }

    /// Button label, e.g. `Moscow (UTC+3)`.
    pub fn label(self) -> String {
        format!("{} (UTC+{})", self.name(), self.utc_offset_hours())
    }

    /// Shifts a UTC instant into this timezone's wall-clock time.
    pub fn to_local(self, utc: DateTime<Utc>) -> NaiveDateTime {
        utc.naive_utc() + TimeDelta::hours(self.utc_offset_hours())
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Timezone {
    type Err = ValidationError;

    /// Accepts a bare name or a button label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.split('(').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|tz| tz.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnsupportedTimezone {
                value: s.trim().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_labels() {
        assert_eq!("moscow".parse::<Timezone>().unwrap(), Timezone::Moscow);
        assert_eq!(
            "Novosibirsk (UTC+7)".parse::<Timezone>().unwrap(),
            Timezone::Novosibirsk
        );
        for tz in Timezone::ALL {
            assert_eq!(tz.label().parse::<Timezone>().unwrap(), tz);
        }
    }

    #[test]
    fn rejects_unsupported_names() {
        assert_eq!(
            "Europe/Berlin".parse::<Timezone>(),
            Err(ValidationError::UnsupportedTimezone {
                value: "Europe/Berlin".to_string()
            })
        );
        assert!("".parse::<Timezone>().is_err());
    }

    #[test]
    fn default_is_moscow() {
        assert_eq!(Timezone::default(), Timezone::Moscow);
    }

    #[test]
    fn local_time_rolls_over_midnight() {
        let utc = DateTime::parse_from_rfc3339("2025-06-30T20:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            Timezone::Vladivostok.to_local(utc).to_string(),
            "2025-07-01 06:15:00"
        );
        assert_eq!(
            Timezone::Kaliningrad.to_local(utc).to_string(),
            "2025-06-30 22:15:00"
        );
    }
}
