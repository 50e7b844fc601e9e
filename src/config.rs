//! TOML-based site configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigErrors, Error, Result};
use crate::sim::types::{HOURS_PER_DAY, STEPS_PER_DAY};

/// Top-level site configuration parsed from TOML.
///
/// All sections have defaults matching the baseline site. Load from TOML
/// with [`Config::from_toml_file`] or use [`Config::baseline`]. A config
/// must pass [`Config::validated`] before a simulation accepts it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Horizon, seed and calendar.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Charging station count, rating and tariff charged to drivers.
    #[serde(default)]
    pub station: StationConfig,
    /// How EV demand is generated.
    #[serde(default)]
    pub demand: DemandConfig,
    /// Solar array.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Battery storage and dispatch policy.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Time-of-use grid tariff.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Capital costs and component lifetimes.
    #[serde(default)]
    pub capital: CapitalConfig,
    /// Export of surplus solar.
    #[serde(default)]
    pub selling: SellingConfig,
}

/// Horizon, seed and calendar.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Seed for the per-run random number generator.
    pub seed: u64,
    /// Weekday of day 0, `0` = Monday through `6` = Sunday.
    pub start_weekday: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 30,
            seed: 42,
            start_weekday: 0,
        }
    }
}

/// Charging stations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// Number of identical stations on the site (must be >= 1).
    pub count: u32,
    /// Rated charging power per station (kW).
    pub power_kw: f64,
    /// Price charged to drivers ($/kWh).
    pub charging_price: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            count: 1,
            power_kw: 30.0,
            charging_price: 0.17,
        }
    }
}

/// Demand generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandMode {
    /// A fixed number of full-power half-hour sessions at random slots each day.
    Sessions,
    /// A deterministic daily energy spread over a 24-hour usage profile.
    Profile,
}

/// Built-in 24-hour usage profiles, plus a user-supplied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageProfile {
    Standard,
    #[serde(rename = "working_9_5")]
    Working9To5,
    StayAtHome,
    NightOwl,
    /// Uses `demand.custom_profile`.
    Custom,
}

/// EV demand parameters, per station.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    pub mode: DemandMode,
    /// Sessions per station per day in `sessions` mode (at most 48).
    pub sessions_per_day: usize,
    /// Energy per station per day in `profile` mode (kWh).
    pub daily_demand_kwh: f64,
    pub profile: UsageProfile,
    /// 24 hourly weights, required when `profile = "custom"`.
    pub custom_profile: Option<Vec<f64>>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            mode: DemandMode::Sessions,
            sessions_per_day: 12,
            daily_demand_kwh: 50.0,
            profile: UsageProfile::Standard,
            custom_profile: None,
        }
    }
}

/// Solar array for the whole site.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Nameplate capacity (kW), shared evenly between stations.
    pub capacity_kw: f64,
    /// Weather derate spread; production is scaled by a draw from `[1 - v, 1)`.
    pub variability: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            capacity_kw: 20.0,
            variability: 0.1,
        }
    }
}

/// When the battery may discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DischargePolicy {
    /// Whenever demand remains after direct solar.
    Always,
    /// Only when the grid rate is at or above `battery.price_threshold`.
    PriceThreshold,
}

/// Battery storage parameters, per station.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    pub enabled: bool,
    /// Capacity of one pack (Ah).
    pub pack_ah: f64,
    /// Nominal pack voltage (V).
    pub pack_voltage: f64,
    /// Packs installed per station.
    pub pack_count: u32,
    /// Purchase price of one pack ($).
    pub pack_price: f64,
    /// Initial state of charge (0.0–1.0).
    pub initial_soc: f64,
    /// Maximum charging power (kW).
    pub max_charge_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f64,
    /// When set, overrides both power limits with `c_rate * capacity_kwh`.
    pub c_rate: Option<f64>,
    /// Fraction of grid energy that ends up stored (0.0–1.0].
    pub battery_efficiency: f64,
    /// DC/AC conversion efficiency on the solar path (0.0–1.0].
    pub inverter_efficiency: f64,
    /// Wear cost per kWh discharged ($/kWh).
    pub degradation_cost: f64,
    /// State of charge kept in reserve (0.0–1.0).
    pub reserve_fraction: f64,
    /// Lead time before each peak window in which the battery tops up to full (h).
    pub prepeak_hours: f64,
    pub discharge_policy: DischargePolicy,
    /// Minimum grid rate for discharge under `price_threshold` ($/kWh).
    pub price_threshold: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pack_ah: 100.0,
            pack_voltage: 51.2,
            pack_count: 4,
            pack_price: 1000.0,
            initial_soc: 0.5,
            max_charge_kw: 15.0,
            max_discharge_kw: 15.0,
            c_rate: None,
            battery_efficiency: 0.9,
            inverter_efficiency: 0.95,
            degradation_cost: 0.05,
            reserve_fraction: 0.2,
            prepeak_hours: 1.0,
            discharge_policy: DischargePolicy::Always,
            price_threshold: 0.17,
        }
    }
}

impl BatteryConfig {
    /// Usable capacity of one station's battery (kWh); zero when disabled.
    pub fn capacity_kwh(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        f64::from(self.pack_count) * self.pack_ah * self.pack_voltage / 1000.0
    }

    /// Effective `(charge_kw, discharge_kw)` limits after applying `c_rate`.
    pub fn power_limits_kw(&self) -> (f64, f64) {
        match self.c_rate {
            Some(c) => {
                let kw = c * self.capacity_kwh();
                (kw, kw)
            }
            None => (self.max_charge_kw, self.max_discharge_kw),
        }
    }
}

/// Time-of-use tariff. Hours are fractional hours of the day.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    pub off_peak_rate: f64,
    pub normal_rate: f64,
    pub peak_rate: f64,
    /// Off-peak runs from this hour through midnight.
    pub off_peak_start: f64,
    /// Off-peak runs from midnight until this hour.
    pub off_peak_end: f64,
    pub morning_peak_start: f64,
    pub morning_peak_end: f64,
    pub evening_peak_start: f64,
    pub evening_peak_end: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            off_peak_rate: 0.06,
            normal_rate: 0.108,
            peak_rate: 0.188,
            off_peak_start: 22.0,
            off_peak_end: 4.0,
            morning_peak_start: 9.5,
            morning_peak_end: 11.5,
            evening_peak_start: 17.0,
            evening_peak_end: 20.0,
        }
    }
}

/// Capital costs ($) and lifetimes (years).
///
/// Solar panel and installation costs are quoted per 10 kW of array. The
/// battery cost comes from `battery.pack_price`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapitalConfig {
    pub station_cost: f64,
    pub transformer_cost: f64,
    pub solar_panel_cost: f64,
    /// Hybrid inverter, used when the battery is enabled.
    pub inverter_cost: f64,
    /// Grid-tie inverter, used without a battery.
    pub plain_inverter_cost: f64,
    pub installation_cost: f64,
    pub station_lifetime: f64,
    pub transformer_lifetime: f64,
    pub solar_lifetime: f64,
    pub inverter_lifetime: f64,
    pub installation_lifetime: f64,
    pub battery_lifetime: f64,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            station_cost: 7000.0,
            transformer_cost: 1000.0,
            solar_panel_cost: 2000.0,
            inverter_cost: 3000.0,
            plain_inverter_cost: 2000.0,
            installation_cost: 1000.0,
            station_lifetime: 10.0,
            transformer_lifetime: 15.0,
            solar_lifetime: 25.0,
            inverter_lifetime: 10.0,
            installation_lifetime: 10.0,
            battery_lifetime: 10.0,
        }
    }
}

/// Export of surplus solar to the grid.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SellingConfig {
    pub enabled: bool,
    /// Export price ($/kWh).
    pub price: f64,
    /// Share of each day's cumulative production that may be exported (0.0–1.0).
    pub percentage: f64,
}

impl Default for SellingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            price: 0.07,
            percentage: 0.5,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.initial_soc"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Returns the baseline site: one 30 kW station, 20 kW solar, 4-pack battery.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the grid-only preset: no solar and no battery.
    pub fn grid_only() -> Self {
        Self {
            solar: SolarConfig {
                capacity_kw: 0.0,
                ..SolarConfig::default()
            },
            battery: BatteryConfig {
                enabled: false,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the solar-only preset: baseline array, no battery.
    pub fn solar_only() -> Self {
        Self {
            battery: BatteryConfig {
                enabled: false,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns a two-station commuter site on the 9-to-5 profile with surplus export.
    pub fn commuter() -> Self {
        Self {
            station: StationConfig {
                count: 2,
                ..StationConfig::default()
            },
            demand: DemandConfig {
                mode: DemandMode::Profile,
                daily_demand_kwh: 90.0,
                profile: UsageProfile::Working9To5,
                ..DemandConfig::default()
            },
            solar: SolarConfig {
                capacity_kw: 30.0,
                ..SolarConfig::default()
            },
            selling: SellingConfig {
                enabled: true,
                ..SellingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the baseline site with discharge gated on the grid rate.
    pub fn price_threshold() -> Self {
        Self {
            battery: BatteryConfig {
                discharge_policy: DischargePolicy::PriceThreshold,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &[
        "baseline",
        "grid_only",
        "solar_only",
        "commuter",
        "price_threshold",
    ];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPreset`] if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "grid_only" => Ok(Self::grid_only()),
            "solar_only" => Ok(Self::solar_only()),
            "commuter" => Ok(Self::commuter()),
            "price_threshold" => Ok(Self::price_threshold()),
            _ => Err(Error::UnknownPreset {
                name: name.to_string(),
                available: Self::PRESETS.join(", "),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Toml`] if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Consumes the config and returns it unchanged if every field is valid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] listing every violation.
    pub fn validated(self) -> Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::InvalidConfig(ConfigErrors(errors)))
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        if s.start_weekday > 6 {
            errors.push(ConfigError::new(
                "simulation.start_weekday",
                "must be in 0..=6 (0 = Monday)",
            ));
        }

        let st = &self.station;
        if st.count == 0 {
            errors.push(ConfigError::new("station.count", "must be >= 1"));
        }
        non_negative(&mut errors, "station.power_kw", st.power_kw);
        non_negative(&mut errors, "station.charging_price", st.charging_price);

        let d = &self.demand;
        if d.sessions_per_day > STEPS_PER_DAY {
            errors.push(ConfigError::new(
                "demand.sessions_per_day",
                format!("must be <= {STEPS_PER_DAY}"),
            ));
        }
        non_negative(&mut errors, "demand.daily_demand_kwh", d.daily_demand_kwh);
        if d.profile == UsageProfile::Custom {
            match &d.custom_profile {
                None => errors.push(ConfigError::new(
                    "demand.custom_profile",
                    "required when demand.profile = \"custom\"",
                )),
                Some(p) => validate_profile(&mut errors, p),
            }
        }

        let sol = &self.solar;
        non_negative(&mut errors, "solar.capacity_kw", sol.capacity_kw);
        in_range(&mut errors, "solar.variability", sol.variability, 0.0, 0.5);

        let b = &self.battery;
        non_negative(&mut errors, "battery.pack_ah", b.pack_ah);
        non_negative(&mut errors, "battery.pack_voltage", b.pack_voltage);
        non_negative(&mut errors, "battery.pack_price", b.pack_price);
        in_range(&mut errors, "battery.initial_soc", b.initial_soc, 0.0, 1.0);
        non_negative(&mut errors, "battery.max_charge_kw", b.max_charge_kw);
        non_negative(&mut errors, "battery.max_discharge_kw", b.max_discharge_kw);
        if let Some(c) = b.c_rate {
            non_negative(&mut errors, "battery.c_rate", c);
        }
        efficiency(&mut errors, "battery.battery_efficiency", b.battery_efficiency);
        efficiency(&mut errors, "battery.inverter_efficiency", b.inverter_efficiency);
        non_negative(&mut errors, "battery.degradation_cost", b.degradation_cost);
        in_range(&mut errors, "battery.reserve_fraction", b.reserve_fraction, 0.0, 1.0);
        in_range(&mut errors, "battery.prepeak_hours", b.prepeak_hours, 0.0, HOURS_PER_DAY);
        non_negative(&mut errors, "battery.price_threshold", b.price_threshold);

        let t = &self.tariff;
        non_negative(&mut errors, "tariff.off_peak_rate", t.off_peak_rate);
        non_negative(&mut errors, "tariff.normal_rate", t.normal_rate);
        non_negative(&mut errors, "tariff.peak_rate", t.peak_rate);
        in_range(&mut errors, "tariff.off_peak_start", t.off_peak_start, 0.0, HOURS_PER_DAY);
        in_range(&mut errors, "tariff.off_peak_end", t.off_peak_end, 0.0, HOURS_PER_DAY);
        peak_window(
            &mut errors,
            "tariff.morning_peak_start",
            t.morning_peak_start,
            t.morning_peak_end,
        );
        peak_window(
            &mut errors,
            "tariff.evening_peak_start",
            t.evening_peak_start,
            t.evening_peak_end,
        );

        let c = &self.capital;
        let pairs = [
            ("capital.station_cost", c.station_cost, "capital.station_lifetime", c.station_lifetime),
            (
                "capital.transformer_cost",
                c.transformer_cost,
                "capital.transformer_lifetime",
                c.transformer_lifetime,
            ),
            ("capital.solar_panel_cost", c.solar_panel_cost, "capital.solar_lifetime", c.solar_lifetime),
            ("capital.inverter_cost", c.inverter_cost, "capital.inverter_lifetime", c.inverter_lifetime),
            (
                "capital.plain_inverter_cost",
                c.plain_inverter_cost,
                "capital.inverter_lifetime",
                c.inverter_lifetime,
            ),
            (
                "capital.installation_cost",
                c.installation_cost,
                "capital.installation_lifetime",
                c.installation_lifetime,
            ),
        ];
        for (cost_field, cost, life_field, life) in pairs {
            non_negative(&mut errors, cost_field, cost);
            lifetime(&mut errors, life_field, life, (cost > 0.0).then_some(cost_field));
        }
        // packs are only bought when the battery is installed
        let buys_packs = b.enabled && b.pack_count > 0 && b.pack_price > 0.0;
        lifetime(
            &mut errors,
            "capital.battery_lifetime",
            c.battery_lifetime,
            buys_packs.then_some("battery.pack_price"),
        );

        let sell = &self.selling;
        non_negative(&mut errors, "selling.price", sell.price);
        in_range(&mut errors, "selling.percentage", sell.percentage, 0.0, 1.0);

        errors
    }
}

/// A lifetime must be non-negative, and positive when `paid_by` names a
/// non-zero cost that it amortises.
fn lifetime(errors: &mut Vec<ConfigError>, field: &str, life: f64, paid_by: Option<&str>) {
    if errors.iter().any(|e| e.field == field) {
        return;
    }
    if !(life >= 0.0) || life.is_infinite() {
        errors.push(ConfigError::new(field, "must be a finite value >= 0"));
    } else if life == 0.0
        && let Some(cost_field) = paid_by
    {
        errors.push(ConfigError::new(field, format!("must be > 0 when {cost_field} is non-zero")));
    }
}

// NaN fails every comparison, so the checks are written as `!(ok)`.
fn non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value >= 0.0) || value.is_infinite() {
        errors.push(ConfigError::new(field, "must be a finite value >= 0"));
    }
}

fn in_range(errors: &mut Vec<ConfigError>, field: &str, value: f64, lo: f64, hi: f64) {
    if !(value >= lo && value <= hi) {
        errors.push(ConfigError::new(field, format!("must be in [{lo}, {hi}]")));
    }
}

fn efficiency(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
    }
}

fn peak_window(errors: &mut Vec<ConfigError>, field: &str, start: f64, end: f64) {
    if !(start >= 0.0 && start < end && end <= HOURS_PER_DAY) {
        errors.push(ConfigError::new(
            field,
            format!("peak window must satisfy 0 <= start < end <= 24, got [{start}, {end})"),
        ));
    }
}

fn validate_profile(errors: &mut Vec<ConfigError>, profile: &[f64]) {
    let field = "demand.custom_profile";
    if profile.len() != 24 {
        errors.push(ConfigError::new(
            field,
            format!("must have exactly 24 entries, got {}", profile.len()),
        ));
        return;
    }
    if profile.iter().any(|v| !(*v >= 0.0) || v.is_infinite()) {
        errors.push(ConfigError::new(field, "entries must be finite and >= 0"));
        return;
    }
    if profile.iter().sum::<f64>() <= 0.0 {
        errors.push(ConfigError::new(field, "entries must have a positive sum"));
    }
}
