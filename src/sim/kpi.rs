//! Post-hoc energy summaries computed from step records.

use std::fmt;

use serde::Serialize;

use super::types::{DAYS_PER_YEAR, DT_HOURS, SimulationResult, StepRecord};

/// Days per month used by the monthly breakdown.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Energy quantities over one period (kWh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyTotals {
    pub solar_produced: f64,
    pub grid_import: f64,
    /// Solar exported to the grid.
    pub grid_export: f64,
    /// Solar consumed on site, directly or through the battery.
    pub solar_used: f64,
    pub solar_wasted: f64,
}

impl EnergyTotals {
    fn scaled(self, factor: f64) -> Self {
        Self {
            solar_produced: self.solar_produced * factor,
            grid_import: self.grid_import * factor,
            grid_export: self.grid_export * factor,
            solar_used: self.solar_used * factor,
            solar_wasted: self.solar_wasted * factor,
        }
    }
}

/// Average daily energy flows extrapolated to a month and a year.
///
/// Grid import includes energy drawn to charge the battery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyBreakdown {
    pub daily: EnergyTotals,
    pub monthly: EnergyTotals,
    pub yearly: EnergyTotals,
}

impl EnergyBreakdown {
    /// Computes the breakdown from a complete run.
    ///
    /// # Arguments
    ///
    /// * `result` - Finished simulation
    ///
    /// # Returns
    ///
    /// All-zero totals if the run has no days.
    pub fn from_result(result: &SimulationResult) -> Self {
        let mut sum = EnergyTotals::default();
        for r in &result.records {
            sum.solar_produced += r.solar_produced_kwh;
            sum.grid_import += r.grid_import_kwh + r.grid_to_battery_kwh;
            sum.grid_export += r.solar_sold_kwh;
            sum.solar_used += r.solar_used_kwh();
            sum.solar_wasted += r.solar_curtailed_kwh;
        }
        let daily = if result.days > 0 {
            sum.scaled(1.0 / result.days as f64)
        } else {
            EnergyTotals::default()
        };
        Self {
            daily,
            monthly: daily.scaled(DAYS_PER_MONTH),
            yearly: daily.scaled(DAYS_PER_YEAR),
        }
    }
}

impl fmt::Display for EnergyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Breakdown (kWh) ---")?;
        writeln!(
            f,
            "{:<16}{:>12}{:>12}{:>14}",
            "", "daily", "monthly", "yearly"
        )?;
        let rows: [(&str, fn(&EnergyTotals) -> f64); 5] = [
            ("Solar produced", |t| t.solar_produced),
            ("Grid import", |t| t.grid_import),
            ("Grid export", |t| t.grid_export),
            ("Solar used", |t| t.solar_used),
            ("Solar wasted", |t| t.solar_wasted),
        ];
        for (i, (name, get)) in rows.iter().enumerate() {
            write!(
                f,
                "{:<16}{:>12.2}{:>12.2}{:>14.2}",
                name,
                get(&self.daily),
                get(&self.monthly),
                get(&self.yearly)
            )?;
            if i + 1 < rows.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// One hour of the averaged day. Energies in kWh per hour, `cost` in $.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HourlyRow {
    pub hour: usize,
    pub demand: f64,
    pub grid_import: f64,
    pub solar_produced: f64,
    pub solar_direct: f64,
    pub battery_charged: f64,
    pub battery_discharged: f64,
    /// Mean stored energy over the hour.
    pub battery_soc: f64,
    pub cost: f64,
}

/// Averages the run into 24 hourly rows, pairing half-hour steps.
pub fn typical_day(records: &[StepRecord]) -> Vec<HourlyRow> {
    let mut rows: Vec<HourlyRow> = (0..24)
        .map(|hour| HourlyRow {
            hour,
            ..HourlyRow::default()
        })
        .collect();
    let mut counts = [0_usize; 24];

    for r in records {
        let hour = ((r.time_of_day / (2.0 * DT_HOURS)) as usize).min(23);
        let row = &mut rows[hour];
        row.demand += r.demand_kwh;
        row.grid_import += r.grid_import_kwh + r.grid_to_battery_kwh;
        row.solar_produced += r.solar_produced_kwh;
        row.solar_direct += r.solar_direct_kwh;
        row.battery_charged += r.solar_to_battery_kwh + r.grid_to_battery_kwh;
        row.battery_discharged += r.battery_discharged_kwh;
        row.battery_soc += r.battery_soc_kwh;
        row.cost += r.cost_grid + r.cost_battery;
        counts[hour] += 1;
    }

    // Sums over two half-hour steps per day become per-hour means.
    for (row, &n) in rows.iter_mut().zip(&counts) {
        if n == 0 {
            continue;
        }
        let days = n as f64 / 2.0;
        row.demand /= days;
        row.grid_import /= days;
        row.solar_produced /= days;
        row.solar_direct /= days;
        row.battery_charged /= days;
        row.battery_discharged /= days;
        row.cost /= days;
        row.battery_soc /= n as f64;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sim::engine::simulate;

    fn run(days: usize) -> SimulationResult {
        let mut cfg = Config::baseline();
        cfg.simulation.days = days;
        cfg.selling.enabled = true;
        match simulate(&cfg) {
            Ok(r) => r,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn yearly_is_365_daily() {
        let b = EnergyBreakdown::from_result(&run(2));
        assert!((b.yearly.solar_produced - 365.0 * b.daily.solar_produced).abs() < 1e-6);
        assert!((b.monthly.grid_import - 30.0 * b.daily.grid_import).abs() < 1e-6);
    }

    #[test]
    fn produced_splits_into_used_exported_wasted() {
        let b = EnergyBreakdown::from_result(&run(3));
        let d = b.daily;
        assert!((d.solar_produced - d.solar_used - d.grid_export - d.solar_wasted).abs() < 1e-6);
    }

    #[test]
    fn empty_run_is_all_zero() {
        let result = SimulationResult {
            records: Vec::new(),
            days: 0,
            stations: 1,
            battery_capacity_kwh: 0.0,
            totals: Default::default(),
        };
        let b = EnergyBreakdown::from_result(&result);
        assert_eq!(b.yearly, EnergyTotals::default());
    }

    #[test]
    fn typical_day_preserves_daily_demand() {
        let result = run(2);
        let rows = typical_day(&result.records);
        assert_eq!(rows.len(), 24);
        let per_day: f64 = rows.iter().map(|r| r.demand).sum();
        let total: f64 = result.records.iter().map(|r| r.demand_kwh).sum();
        assert!((per_day - total / 2.0).abs() < 1e-6);
    }

    #[test]
    fn typical_day_has_no_night_solar() {
        let rows = typical_day(&run(1).records);
        assert_eq!(rows[2].solar_produced, 0.0);
        assert!(rows[12].solar_produced > 0.0);
    }

    #[test]
    fn breakdown_display_does_not_panic() {
        let s = EnergyBreakdown::from_result(&run(1)).to_string();
        assert!(s.contains("Solar wasted"));
    }
}
