//! Core simulation types: time constants, step records and run results.

use std::fmt;

use serde::Serialize;

/// Duration of one timestep in hours.
pub const DT_HOURS: f64 = 0.5;
/// Number of timesteps per simulated day.
pub const STEPS_PER_DAY: usize = 48;
/// Hours in a day, as a float for time-of-day arithmetic.
pub const HOURS_PER_DAY: f64 = 24.0;
/// Days per year used when annualising.
pub const DAYS_PER_YEAR: f64 = 365.0;
/// Weekday index of Sunday (`0` = Monday).
pub const SUNDAY: u8 = 6;

/// Complete energy and money record of one timestep. Energies in kWh, money in $.
///
/// For every record `demand_kwh == solar_direct_kwh + battery_discharged_kwh
/// + grid_import_kwh` within floating-point tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Timestep index from the start of the run.
    pub step: usize,
    /// Hours since the start of the run.
    pub time_hr: f64,
    /// Hour of the day in `[0, 24)`.
    pub time_of_day: f64,
    pub day: usize,
    /// `0` = Monday through `6` = Sunday.
    pub weekday: u8,
    /// Grid import price in effect ($/kWh).
    pub grid_rate: f64,
    pub demand_kwh: f64,
    pub solar_produced_kwh: f64,
    /// Solar delivered straight to EV demand.
    pub solar_direct_kwh: f64,
    pub battery_discharged_kwh: f64,
    /// Grid energy delivered to EV demand.
    pub grid_import_kwh: f64,
    /// Energy stored from solar (after inverter losses).
    pub solar_to_battery_kwh: f64,
    /// Grid energy drawn to charge the battery (before charging losses).
    pub grid_to_battery_kwh: f64,
    /// Stored energy after this step.
    pub battery_soc_kwh: f64,
    /// Cost of grid energy for demand and battery charging.
    pub cost_grid: f64,
    /// Degradation cost of battery discharge.
    pub cost_battery: f64,
    /// Charging revenue plus export revenue.
    pub revenue: f64,
    pub solar_sold_kwh: f64,
    /// Solar that could neither be used, stored nor sold.
    pub solar_curtailed_kwh: f64,
}

impl StepRecord {
    /// Solar consumed on site: direct use plus the surplus drawn by the
    /// battery charger, counted before inverter losses.
    pub fn solar_used_kwh(&self) -> f64 {
        self.solar_produced_kwh - self.solar_sold_kwh - self.solar_curtailed_kwh
    }

    /// Returns a copy with every energy and money field multiplied by `factor`.
    pub(crate) fn scaled(mut self, factor: f64) -> Self {
        self.demand_kwh *= factor;
        self.solar_produced_kwh *= factor;
        self.solar_direct_kwh *= factor;
        self.battery_discharged_kwh *= factor;
        self.grid_import_kwh *= factor;
        self.solar_to_battery_kwh *= factor;
        self.grid_to_battery_kwh *= factor;
        self.battery_soc_kwh *= factor;
        self.cost_grid *= factor;
        self.cost_battery *= factor;
        self.revenue *= factor;
        self.solar_sold_kwh *= factor;
        self.solar_curtailed_kwh *= factor;
        self
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>4} (d{} {:>4.1}h @ {:.3}) | demand={:>6.2}  solar={:>6.2}  direct={:>6.2}  \
             bat-={:>5.2}  grid={:>6.2} | bat+ solar={:.2} grid={:.2} soc={:.2} kWh | \
             cost={:.3}  rev={:.3}  sold={:.2}  curtailed={:.2}",
            self.step,
            self.day,
            self.time_of_day,
            self.grid_rate,
            self.demand_kwh,
            self.solar_produced_kwh,
            self.solar_direct_kwh,
            self.battery_discharged_kwh,
            self.grid_import_kwh,
            self.solar_to_battery_kwh,
            self.grid_to_battery_kwh,
            self.battery_soc_kwh,
            self.cost_grid + self.cost_battery,
            self.revenue,
            self.solar_sold_kwh,
            self.solar_curtailed_kwh,
        )
    }
}

/// Horizon totals of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationTotals {
    /// EV energy delivered (kWh).
    pub ev_energy_kwh: f64,
    /// Grid and battery-degradation cost.
    pub operating_cost: f64,
    /// Capital amortisation over the simulated days.
    pub depreciation: f64,
    pub revenue: f64,
    /// `revenue - operating_cost - depreciation`.
    pub net_profit: f64,
}

/// Output of one dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub records: Vec<StepRecord>,
    pub days: usize,
    pub stations: u32,
    /// Site battery capacity summed over stations (kWh).
    pub battery_capacity_kwh: f64,
    pub totals: SimulationTotals,
}
