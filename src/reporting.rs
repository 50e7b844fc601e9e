//! Human-readable and JSON summaries of a single run.

use std::fmt;

use serde::Serialize;

use crate::config::Config;
use crate::economics::{AnnualReport, CapitalCost};
use crate::sim::kpi::{EnergyBreakdown, HourlyRow, typical_day};
use crate::sim::types::{SimulationResult, SimulationTotals};

/// Everything reported about one run, without the per-step records.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub days: usize,
    pub stations: u32,
    pub battery_capacity_kwh: f64,
    pub totals: SimulationTotals,
    pub capital: CapitalCost,
    pub annual: AnnualReport,
    pub energy: EnergyBreakdown,
    pub typical_day: Vec<HourlyRow>,
}

impl RunReport {
    /// Builds the report for a finished run of `config`.
    pub fn new(result: &SimulationResult, config: &Config) -> Self {
        let capital = CapitalCost::from_config(config);
        Self {
            days: result.days,
            stations: result.stations,
            battery_capacity_kwh: result.battery_capacity_kwh,
            totals: result.totals.clone(),
            capital,
            annual: AnnualReport::from_parts(result, &capital),
            energy: EnergyBreakdown::from_result(result),
            typical_day: typical_day(&result.records),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.totals;
        writeln!(f, "--- Run Summary ---")?;
        writeln!(
            f,
            "Horizon:                {} days, {} station(s), {:.2} kWh storage",
            self.days, self.stations, self.battery_capacity_kwh
        )?;
        writeln!(f, "EV energy:              {:.2} kWh", t.ev_energy_kwh)?;
        writeln!(f, "Operating cost:         ${:.2}", t.operating_cost)?;
        writeln!(f, "Depreciation:           ${:.2}", t.depreciation)?;
        writeln!(f, "Revenue:                ${:.2}", t.revenue)?;
        writeln!(f, "Net profit:             ${:.2}", t.net_profit)?;
        writeln!(f)?;
        writeln!(f, "{}", self.capital)?;
        writeln!(f)?;
        writeln!(f, "{}", self.energy)?;
        writeln!(f)?;
        writeln!(f, "{}", TypicalDay(&self.typical_day))?;
        writeln!(f)?;
        write!(f, "{}", self.annual)
    }
}

/// Renders the averaged day as a table.
pub struct TypicalDay<'a>(pub &'a [HourlyRow]);

impl fmt::Display for TypicalDay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Typical Day (kWh per hour) ---")?;
        write!(
            f,
            "{:>4}{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}{:>9}",
            "hour", "demand", "grid", "solar", "direct", "bat+", "bat-", "soc", "cost$"
        )?;
        for r in self.0 {
            write!(
                f,
                "\n{:>4}{:>9.2}{:>9.2}{:>9.2}{:>9.2}{:>9.2}{:>9.2}{:>9.2}{:>9.3}",
                r.hour,
                r.demand,
                r.grid_import,
                r.solar_produced,
                r.solar_direct,
                r.battery_charged,
                r.battery_discharged,
                r.battery_soc,
                r.cost
            )?;
        }
        Ok(())
    }
}
