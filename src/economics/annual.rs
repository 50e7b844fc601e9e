//! Annualised cost, revenue and return metrics for one run.

use std::fmt;

use serde::Serialize;

use crate::config::Config;
use crate::sim::types::{DAYS_PER_YEAR, SimulationResult};

use super::capital::CapitalCost;
use super::payback::{Payback, payback_period};

/// Yearly economics extrapolated from a simulated horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualReport {
    /// EV energy delivered per year (kWh).
    pub annual_energy: f64,
    /// Grid energy and battery degradation per year.
    pub annual_operating_cost: f64,
    /// Straight-line amortisation of the capital cost.
    pub annual_capital_cost: f64,
    pub total_capital_cost: f64,
    /// `None` when no energy is delivered.
    pub effective_cost_per_kwh: Option<f64>,
    pub annual_revenue: f64,
    /// `annual_revenue - annual_operating_cost`, before amortisation.
    pub annual_cash_flow: f64,
    /// Revenue minus operating and annualised capital cost.
    pub net_profit: f64,
    /// `net_profit / total_capital_cost`; `None` without investment.
    pub roi: Option<f64>,
    pub payback: Payback,
}

impl AnnualReport {
    /// Computes the annual report for a finished run of `config`.
    ///
    /// # Arguments
    ///
    /// * `result` - Finished simulation of `config`
    /// * `config` - Configuration the run used, for capital costs
    pub fn from_result(result: &SimulationResult, config: &Config) -> Self {
        Self::from_parts(result, &CapitalCost::from_config(config))
    }

    /// Computes the annual report against an explicit capital cost.
    pub fn from_parts(result: &SimulationResult, capital: &CapitalCost) -> Self {
        let scale = if result.days > 0 {
            DAYS_PER_YEAR / result.days as f64
        } else {
            0.0
        };

        let (mut grid_cost, mut battery_cost) = (0.0, 0.0);
        for r in &result.records {
            grid_cost += r.cost_grid;
            battery_cost += r.cost_battery;
        }

        let annual_energy = result.totals.ev_energy_kwh * scale;
        let annual_operating_cost = (grid_cost + battery_cost) * scale;
        let annual_capital_cost = capital.annual();
        let total_capital_cost = capital.total();
        let annual_revenue = result.totals.revenue * scale;
        let annual_cash_flow = annual_revenue - annual_operating_cost;
        let net_profit = annual_revenue - annual_operating_cost - annual_capital_cost;

        Self {
            annual_energy,
            annual_operating_cost,
            annual_capital_cost,
            total_capital_cost,
            effective_cost_per_kwh: (annual_energy > 0.0)
                .then(|| (annual_operating_cost + annual_capital_cost) / annual_energy),
            annual_revenue,
            annual_cash_flow,
            net_profit,
            roi: (total_capital_cost > 0.0).then(|| net_profit / total_capital_cost),
            payback: payback_period(total_capital_cost, annual_cash_flow),
        }
    }
}

fn or_na(value: Option<f64>, fmt_value: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "n/a".to_string(), fmt_value)
}

impl fmt::Display for AnnualReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Annual Report ---")?;
        writeln!(f, "Annual energy:          {:.1} kWh", self.annual_energy)?;
        writeln!(f, "Annual operating cost:  ${:.2}", self.annual_operating_cost)?;
        writeln!(f, "Annual capital cost:    ${:.2}", self.annual_capital_cost)?;
        writeln!(f, "Total capital cost:     ${:.2}", self.total_capital_cost)?;
        writeln!(
            f,
            "Effective cost:         {}",
            or_na(self.effective_cost_per_kwh, |v| format!("${v:.4}/kWh"))
        )?;
        writeln!(f, "Annual revenue:         ${:.2}", self.annual_revenue)?;
        writeln!(f, "Annual cash flow:       ${:.2}", self.annual_cash_flow)?;
        writeln!(f, "Net profit:             ${:.2}", self.net_profit)?;
        writeln!(
            f,
            "ROI:                    {}",
            or_na(self.roi, |v| format!("{:.2}%", v * 100.0))
        )?;
        write!(f, "Payback:                {}", self.payback)
    }
}
