//! Time-of-use grid tariff.

use serde::Serialize;

use crate::config::TariffConfig;

use super::types::SUNDAY;

/// Tariff band in effect at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TariffPeriod {
    OffPeak,
    Normal,
    Peak,
}

/// Half-open window `[start, end)` in hours of the day.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    start: f64,
    end: f64,
}

impl Window {
    fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// Rate lookup by time of day and weekday.
///
/// Sunday is billed at the normal rate all day. On other days the off-peak
/// band wraps midnight and is checked before the two peak windows.
#[derive(Debug, Clone)]
pub struct TariffSchedule {
    off_peak_rate: f64,
    normal_rate: f64,
    peak_rate: f64,
    off_peak_start: f64,
    off_peak_end: f64,
    peaks: [Window; 2],
}

impl TariffSchedule {
    pub fn from_config(cfg: &TariffConfig) -> Self {
        Self {
            off_peak_rate: cfg.off_peak_rate,
            normal_rate: cfg.normal_rate,
            peak_rate: cfg.peak_rate,
            off_peak_start: cfg.off_peak_start,
            off_peak_end: cfg.off_peak_end,
            peaks: [
                Window {
                    start: cfg.morning_peak_start,
                    end: cfg.morning_peak_end,
                },
                Window {
                    start: cfg.evening_peak_start,
                    end: cfg.evening_peak_end,
                },
            ],
        }
    }

    /// Classifies a point in time.
    ///
    /// # Arguments
    ///
    /// * `time_of_day` - Hour of the day in `[0, 24)`
    /// * `weekday` - `0` = Monday through `6` = Sunday
    pub fn period(&self, time_of_day: f64, weekday: u8) -> TariffPeriod {
        if weekday == SUNDAY {
            return TariffPeriod::Normal;
        }
        if self.in_off_peak_hours(time_of_day) {
            return TariffPeriod::OffPeak;
        }
        if self.peaks.iter().any(|w| w.contains(time_of_day)) {
            return TariffPeriod::Peak;
        }
        TariffPeriod::Normal
    }

    /// Whether `time_of_day` lies in the overnight off-peak hours, on any
    /// weekday. Sunday bills these hours at the normal rate but they still
    /// count as an overnight top-up window.
    pub fn in_off_peak_hours(&self, time_of_day: f64) -> bool {
        time_of_day < self.off_peak_end || time_of_day >= self.off_peak_start
    }

    /// Price of a band ($/kWh).
    pub fn rate_for(&self, period: TariffPeriod) -> f64 {
        match period {
            TariffPeriod::OffPeak => self.off_peak_rate,
            TariffPeriod::Normal => self.normal_rate,
            TariffPeriod::Peak => self.peak_rate,
        }
    }

    /// Grid import price at a point in time ($/kWh).
    pub fn rate(&self, time_of_day: f64, weekday: u8) -> f64 {
        self.rate_for(self.period(time_of_day, weekday))
    }

    /// Whether `time_of_day` falls within `lead_hours` before the start of a
    /// peak window. Never true on Sunday.
    pub fn is_pre_peak(&self, time_of_day: f64, weekday: u8, lead_hours: f64) -> bool {
        if weekday == SUNDAY || lead_hours <= 0.0 {
            return false;
        }
        self.peaks.iter().any(|w| {
            Window {
                start: w.start - lead_hours,
                end: w.start,
            }
            .contains(time_of_day)
        })
    }
}
