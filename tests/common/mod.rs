//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use ev_roi_sim::config::{Config, DemandMode};
use ev_roi_sim::sim::engine::simulate;
use ev_roi_sim::sim::types::{SimulationResult, StepRecord};

/// Tolerance for per-step energy balances.
pub const TOL: f64 = 1e-9;

/// Baseline site shortened to `days`.
pub fn baseline(days: usize) -> Config {
    let mut cfg = Config::baseline();
    cfg.simulation.days = days;
    cfg
}

/// 180 kWh/day of deterministic demand, 20 kW solar, no battery, no randomness.
pub fn deterministic_solar_site(days: usize) -> Config {
    let mut cfg = Config::solar_only();
    cfg.simulation.days = days;
    cfg.demand.mode = DemandMode::Profile;
    cfg.demand.daily_demand_kwh = 180.0;
    cfg.solar.variability = 0.0;
    cfg
}

/// Runs a config that is expected to be valid.
pub fn run(cfg: &Config) -> SimulationResult {
    match simulate(cfg) {
        Ok(r) => r,
        Err(e) => panic!("simulation should succeed: {e}"),
    }
}

/// Asserts the per-step supply balance and non-negative flows.
pub fn assert_balanced(records: &[StepRecord]) {
    for r in records {
        let supplied = r.solar_direct_kwh + r.battery_discharged_kwh + r.grid_import_kwh;
        assert!(
            (r.demand_kwh - supplied).abs() < TOL,
            "step {}: demand {} != supplied {}",
            r.step,
            r.demand_kwh,
            supplied
        );
        for (name, v) in [
            ("solar_direct", r.solar_direct_kwh),
            ("battery_discharged", r.battery_discharged_kwh),
            ("grid_import", r.grid_import_kwh),
            ("solar_to_battery", r.solar_to_battery_kwh),
            ("grid_to_battery", r.grid_to_battery_kwh),
            ("solar_sold", r.solar_sold_kwh),
            ("solar_curtailed", r.solar_curtailed_kwh),
        ] {
            assert!(v >= -TOL, "step {}: {name} is negative ({v})", r.step);
        }
    }
}

/// Sum of a field over every record.
pub fn total(records: &[StepRecord], field: impl Fn(&StepRecord) -> f64) -> f64 {
    records.iter().map(field).sum()
}
