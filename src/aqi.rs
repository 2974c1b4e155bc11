//! US EPA PM2.5 Air Quality Index calculation.
//!
//! Maps a PM2.5 concentration (µg/m³, 24-hour average) onto the 0-500 AQI
//! scale by piecewise-linear interpolation over the EPA breakpoint table.

use crate::constants::{AQI_MAX, AQI_MIN, MAX_BREAKPOINT_CONCENTRATION};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the breakpoint table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub aqi_low: u16,
    pub aqi_high: u16,
}

impl Breakpoint {
    const fn new(c_low: f64, c_high: f64, aqi_low: u16, aqi_high: u16) -> Self {
        Self {
            c_low,
            c_high,
            aqi_low,
            aqi_high,
        }
    }

    /// Check if a concentration lies inside this range (inclusive at both ends)
    pub fn contains(&self, concentration: f64) -> bool {
        self.c_low <= concentration && concentration <= self.c_high
    }

    fn interpolate(&self, concentration: f64) -> f64 {
        let aqi_span = f64::from(self.aqi_high - self.aqi_low);
        (aqi_span / (self.c_high - self.c_low)) * (concentration - self.c_low)
            + f64::from(self.aqi_low)
    }
}

/// PM2.5 breakpoints, ordered by concentration
const BREAKPOINTS: [Breakpoint; 7] = [
    Breakpoint::new(0.0, 12.0, 0, 50),
    Breakpoint::new(12.1, 35.4, 51, 100),
    Breakpoint::new(35.5, 55.4, 101, 150),
    Breakpoint::new(55.5, 150.4, 151, 200),
    Breakpoint::new(150.5, 250.4, 201, 300),
    Breakpoint::new(250.5, 350.4, 301, 400),
    Breakpoint::new(350.5, 500.4, 401, 500),
];

/// Rounding convention applied to the interpolated AQI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// 12.5 -> 13
    #[default]
    HalfAwayFromZero,
    /// 12.5 -> 12, 13.5 -> 14
    HalfEven,
}

impl RoundingMode {
    fn apply(self, value: f64) -> f64 {
        match self {
            RoundingMode::HalfAwayFromZero => value.round(),
            RoundingMode::HalfEven => value.round_ties_even(),
        }
    }
}

/// Convert a PM2.5 concentration to an AQI score using the default rounding
pub fn aqi(concentration: f64) -> u16 {
    pm25_to_aqi(concentration, RoundingMode::default())
}

/// Convert a PM2.5 concentration to an AQI score
///
/// Concentrations above the table saturate at 500; negative (and NaN)
/// concentrations floor at 0. Values falling in the 0.1 µg/m³ gap between two
/// ranges take the upper AQI of the lower range, which keeps the scale
/// monotonic.
pub fn pm25_to_aqi(concentration: f64, rounding: RoundingMode) -> u16 {
    if concentration.is_nan() || concentration < 0.0 {
        return AQI_MIN;
    }

    for (index, breakpoint) in BREAKPOINTS.iter().enumerate() {
        if breakpoint.contains(concentration) {
            let value = rounding.apply(breakpoint.interpolate(concentration));
            // interpolation stays within the band, clamp absorbs float noise
            return (value as u16).clamp(breakpoint.aqi_low, breakpoint.aqi_high);
        }

        if concentration < breakpoint.c_low {
            return match index {
                0 => AQI_MIN,
                _ => BREAKPOINTS[index - 1].aqi_high,
            };
        }
    }

    debug_assert!(concentration > MAX_BREAKPOINT_CONCENTRATION);
    AQI_MAX
}

/// EPA health category for an AQI score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Categorise an AQI score
    pub fn from_aqi(aqi: u16) -> Self {
        match aqi {
            0..=50 => AqiCategory::Good,
            51..=100 => AqiCategory::Moderate,
            101..=150 => AqiCategory::UnhealthyForSensitiveGroups,
            151..=200 => AqiCategory::Unhealthy,
            201..=300 => AqiCategory::VeryUnhealthy,
            _ => AqiCategory::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
