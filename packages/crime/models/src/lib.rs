#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime category, time-of-day, season, and day-type definitions.
//!
//! This crate defines the closed category set used across the dashboard.
//! The Montreal open data feed labels incidents in French; every raw label
//! is mapped onto [`CrimeCategory`] through [`CrimeCategory::from_raw_label`],
//! which never fails and falls back to [`CrimeCategory::Other`].

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Incident categories reported by the Montreal police service.
///
/// Variant order is the palette order used by the map legend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum CrimeCategory {
    /// Theft of a motor vehicle
    #[serde(rename = "Motor Vehicle Theft")]
    #[strum(serialize = "Motor Vehicle Theft")]
    MotorVehicleTheft,
    /// Vandalism and other willful damage
    #[serde(rename = "Mischief")]
    #[strum(serialize = "Mischief")]
    Mischief,
    /// Theft of property from or inside a motor vehicle
    #[serde(rename = "Theft From/In Motor Vehicle")]
    #[strum(serialize = "Theft From/In Motor Vehicle")]
    TheftFromMotorVehicle,
    /// Unlawful entry into a building
    #[serde(rename = "Breaking And Entering")]
    #[strum(serialize = "Breaking And Entering")]
    BreakingAndEntering,
    /// Theft by force or threat
    #[serde(rename = "Robbery")]
    #[strum(serialize = "Robbery")]
    Robbery,
    /// Offences resulting in a death
    #[serde(rename = "Offences Causing Death")]
    #[strum(serialize = "Offences Causing Death")]
    OffencesCausingDeath,
    /// Labels that don't match any known category
    #[serde(rename = "Other")]
    #[strum(serialize = "Other")]
    Other,
}

/// `(source label, category)` pairs, compared case-insensitively.
const RAW_LABELS: &[(&str, CrimeCategory)] = &[
    ("vol de véhicule à moteur", CrimeCategory::MotorVehicleTheft),
    ("méfait", CrimeCategory::Mischief),
    (
        "vol dans / sur véhicule à moteur",
        CrimeCategory::TheftFromMotorVehicle,
    ),
    ("introduction", CrimeCategory::BreakingAndEntering),
    ("vols qualifiés", CrimeCategory::Robbery),
    (
        "infractions entrainant la mort",
        CrimeCategory::OffencesCausingDeath,
    ),
];

impl CrimeCategory {
    /// Maps a raw source label onto a category.
    ///
    /// Matching ignores case and surrounding whitespace and accepts both the
    /// French source labels and the English display labels. Unknown labels
    /// map to [`Self::Other`].
    #[must_use]
    pub fn from_raw_label(raw: &str) -> Self {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let lower = normalized.to_lowercase();

        if let Some((_, category)) = RAW_LABELS.iter().find(|(label, _)| *label == lower) {
            return *category;
        }

        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_ref().to_lowercase() == lower)
            .unwrap_or(Self::Other)
    }

    /// Returns the map marker colour, or `None` for categories that aren't
    /// drawn on the map.
    #[must_use]
    pub const fn color(self) -> Option<&'static str> {
        match self {
            Self::MotorVehicleTheft => Some("#626ff5"),
            Self::Mischief => Some("#E74C3C"),
            Self::TheftFromMotorVehicle => Some("#1ABC9C"),
            Self::BreakingAndEntering => Some("#9B59B6"),
            Self::Robbery => Some("#F39C12"),
            Self::OffencesCausingDeath => Some("#00BCD4"),
            Self::Other => None,
        }
    }

    /// Returns all variants of this enum in palette order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MotorVehicleTheft,
            Self::Mischief,
            Self::TheftFromMotorVehicle,
            Self::BreakingAndEntering,
            Self::Robbery,
            Self::OffencesCausingDeath,
            Self::Other,
        ]
    }
}

/// Patrol shift during which an incident was reported (`QUART` column).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TimeOfDay {
    /// 09:01 to 16:00
    Day,
    /// 16:01 to 00:00
    Evening,
    /// 00:01 to 08:00
    Night,
}

impl TimeOfDay {
    /// Parses a raw `QUART` value (`jour`, `soir`, `nuit`).
    #[must_use]
    pub fn from_shift(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "jour" => Some(Self::Day),
            "soir" => Some(Self::Evening),
            "nuit" => Some(Self::Night),
            _ => None,
        }
    }

    /// Label including the shift hours.
    #[must_use]
    pub const fn long_label(self) -> &'static str {
        match self {
            Self::Day => "Day (09:01–16:00)",
            Self::Evening => "Evening (16:01–00:00)",
            Self::Night => "Night (00:01–08:00)",
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Day => "#FFD580",
            Self::Evening => "#D7BDE2",
            Self::Night => "#85C1E9",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Day, Self::Evening, Self::Night]
    }
}

/// Meteorological season.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Returns the season for a calendar month (1-12).
    ///
    /// December through February is winter.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month % 12 / 3 {
            0 => Self::Winter,
            1 => Self::Spring,
            2 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    /// Returns all seasons in calendar order, starting with winter.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Winter, Self::Spring, Self::Summer, Self::Autumn]
    }
}

/// Whether an incident happened on a weekday or over the weekend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    #[must_use]
    pub const fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Weekday => "#AED6F1",
            Self::Weekend => "#F5B7B1",
        }
    }
}
