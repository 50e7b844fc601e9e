use std::f64::consts::PI;

use rand::Rng;

/// First hour of the generation window (inclusive).
pub const SUNRISE_HOUR: f64 = 6.0;
/// Last hour of the generation window (inclusive).
pub const SUNSET_HOUR: f64 = 18.0;

/// A solar array with a half-sine daily profile and a uniform weather derate.
///
/// Between sunrise and sunset production follows
/// `capacity * sin(pi * (t - 6) / 12)`, scaled by a factor drawn uniformly from
/// `[1 - variability, 1)`. Outside that window production is exactly zero and
/// no random number is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarModel {
    /// Nameplate capacity in kilowatts.
    pub capacity_kw: f64,

    /// Width of the derate interval, in `[0, 0.5]`.
    pub variability: f64,
}

impl SolarModel {
    /// Creates a new solar model.
    ///
    /// # Arguments
    ///
    /// * `capacity_kw` - Nameplate capacity in kW (negative values clamp to 0)
    /// * `variability` - Derate spread; `0.0` makes production deterministic
    pub fn new(capacity_kw: f64, variability: f64) -> Self {
        Self {
            capacity_kw: capacity_kw.max(0.0),
            variability: variability.clamp(0.0, 1.0),
        }
    }

    /// Whether `time_of_day` lies inside the generation window.
    pub fn is_daylight(time_of_day: f64) -> bool {
        (SUNRISE_HOUR..=SUNSET_HOUR).contains(&time_of_day)
    }

    /// Clear-sky fraction of capacity at `time_of_day`.
    pub fn clear_sky_fraction(time_of_day: f64) -> f64 {
        if !Self::is_daylight(time_of_day) {
            return 0.0;
        }
        let span = SUNSET_HOUR - SUNRISE_HOUR;
        (PI * (time_of_day - SUNRISE_HOUR) / span).sin().max(0.0)
    }

    /// Energy produced over one step starting at `time_of_day`.
    ///
    /// # Arguments
    ///
    /// * `time_of_day` - Hour of the day in `[0, 24)`
    /// * `dt_hours` - Step length in hours
    /// * `rng` - Run-wide random source, consulted once per daylight step when
    ///   `variability > 0`
    ///
    /// # Returns
    ///
    /// Energy in kWh, always `>= 0`.
    pub fn energy_kwh<R: Rng + ?Sized>(&self, time_of_day: f64, dt_hours: f64, rng: &mut R) -> f64 {
        if !Self::is_daylight(time_of_day) {
            return 0.0;
        }
        let derate = if self.variability > 0.0 {
            rng.random_range((1.0 - self.variability)..1.0)
        } else {
            1.0
        };
        self.capacity_kw * Self::clear_sky_fraction(time_of_day) * derate * dt_hours
    }
}
