//! Integration tests for multi-day dispatch runs.

mod common;

use ev_roi_sim::config::{Config, DischargePolicy};
use ev_roi_sim::sim::engine::DispatchSimulator;
use ev_roi_sim::sim::kpi::EnergyBreakdown;
use ev_roi_sim::sim::types::STEPS_PER_DAY;
use ev_roi_sim::{Error, Result};

#[test]
fn full_run_produces_correct_step_count() {
    let result = common::run(&common::baseline(7));
    assert_eq!(result.records.len(), 7 * STEPS_PER_DAY);
    assert_eq!(result.days, 7);
    assert_eq!(result.records.last().map(|r| r.day), Some(6));
}

#[test]
fn every_preset_conserves_energy() {
    for name in Config::PRESETS {
        let mut cfg = Config::from_preset(name).unwrap_or_else(|e| panic!("{name}: {e}"));
        cfg.simulation.days = 5;
        common::assert_balanced(&common::run(&cfg).records);
    }
}

#[test]
fn soc_never_leaves_bounds_over_a_month() {
    let result = common::run(&common::baseline(30));
    for r in &result.records {
        assert!(r.battery_soc_kwh >= -common::TOL);
        assert!(r.battery_soc_kwh <= result.battery_capacity_kwh + common::TOL);
    }
}

#[test]
fn determinism_two_identical_runs_produce_identical_records() {
    let a = common::run(&common::baseline(3));
    let b = common::run(&common::baseline(3));
    assert_eq!(a.records, b.records);
    assert_eq!(a.totals, b.totals);
}

#[test]
fn zero_variability_noon_matches_clear_sky() {
    let result = common::run(&common::deterministic_solar_site(1));
    let noon = &result.records[24];
    assert_eq!(noon.time_of_day, 12.0);
    assert!((noon.solar_produced_kwh - 10.0).abs() < 1e-12);
}

#[test]
fn daily_demand_is_exact_in_profile_mode() {
    let result = common::run(&common::deterministic_solar_site(3));
    for day in 0..3 {
        let demand: f64 = result
            .records
            .iter()
            .filter(|r| r.day == day)
            .map(|r| r.demand_kwh)
            .sum();
        assert!((demand - 180.0).abs() < 180.0 * 1e-9);
    }
}

#[test]
fn sunday_is_billed_at_normal_rate() {
    let mut cfg = common::baseline(1);
    cfg.simulation.start_weekday = 6;
    let result = common::run(&cfg);
    assert!(result.records.iter().all(|r| r.grid_rate == 0.108));
    assert!(result.records.iter().all(|r| r.weekday == 6));
}

#[test]
fn sunday_night_tops_up_at_the_normal_rate() {
    let mut cfg = common::baseline(1);
    cfg.simulation.start_weekday = 6;
    cfg.battery.initial_soc = 0.2;
    cfg.demand.sessions_per_day = 0;
    let result = common::run(&cfg);
    let midnight = &result.records[0];
    assert!((midnight.grid_to_battery_kwh - 7.5).abs() < 1e-9);
    assert!((midnight.cost_grid - 7.5 * 0.108).abs() < 1e-9);
    // no pre-peak window on Sunday
    let before_evening_peak = &result.records[32];
    assert_eq!(before_evening_peak.time_of_day, 16.0);
    assert_eq!(before_evening_peak.grid_to_battery_kwh, 0.0);
}

#[test]
fn grid_draw_respects_charge_power_on_every_step() {
    let mut cfg = common::baseline(3);
    cfg.battery.initial_soc = 0.0;
    cfg.solar.capacity_kw = 0.0;
    cfg.demand.sessions_per_day = 0;
    let limit = cfg.battery.max_charge_kw * 0.5;
    let result = common::run(&cfg);
    for r in &result.records {
        assert!(
            r.grid_to_battery_kwh <= limit + 1e-9,
            "step {}: grid draw {} exceeds {limit}",
            r.step,
            r.grid_to_battery_kwh
        );
    }
    let commuter = common::run(&Config::commuter());
    let per_station = commuter.records.iter().map(|r| r.grid_to_battery_kwh / 2.0);
    assert!(per_station.fold(0.0, f64::max) <= limit + 1e-9);
}

#[test]
fn battery_discharges_without_solar() {
    let mut cfg = common::baseline(1);
    cfg.solar.capacity_kw = 0.0;
    let result = common::run(&cfg);
    assert_eq!(common::total(&result.records, |r| r.solar_to_battery_kwh), 0.0);
    assert!(common::total(&result.records, |r| r.battery_discharged_kwh) > 0.0);
}

#[test]
fn battery_tops_up_overnight_to_eighty_percent() {
    let mut cfg = common::baseline(1);
    cfg.battery.initial_soc = 0.2;
    cfg.demand.sessions_per_day = 0;
    cfg.solar.capacity_kw = 0.0;
    let result = common::run(&cfg);
    let capacity = result.battery_capacity_kwh;
    // after the 00:00-04:00 off-peak band
    let at_four = &result.records[7];
    assert!((at_four.battery_soc_kwh - 0.8 * capacity).abs() < 1e-9);
    // pre-peak window before the morning peak fills it
    let before_peak = &result.records[18];
    assert_eq!(before_peak.time_of_day, 9.0);
    assert!((before_peak.battery_soc_kwh - capacity).abs() < 1e-9);
}

#[test]
fn threshold_policy_discharges_only_on_expensive_steps() {
    let mut cfg = common::baseline(5);
    cfg.battery.discharge_policy = DischargePolicy::PriceThreshold;
    cfg.battery.price_threshold = 0.17;
    let result = common::run(&cfg);
    for r in &result.records {
        if r.battery_discharged_kwh > 0.0 {
            assert!(r.grid_rate >= 0.17, "discharged at {} $/kWh", r.grid_rate);
        }
    }
}

#[test]
fn no_battery_runs_have_no_battery_flows() {
    let mut cfg = Config::solar_only();
    cfg.simulation.days = 5;
    let result = common::run(&cfg);
    assert_eq!(common::total(&result.records, |r| r.battery_discharged_kwh), 0.0);
    assert_eq!(common::total(&result.records, |r| r.solar_to_battery_kwh), 0.0);
}

#[test]
fn energy_breakdown_is_consistent_with_records() {
    let mut cfg = common::baseline(4);
    cfg.selling.enabled = true;
    let result = common::run(&cfg);
    let breakdown = EnergyBreakdown::from_result(&result);
    let produced = common::total(&result.records, |r| r.solar_produced_kwh);
    assert!((breakdown.daily.solar_produced - produced / 4.0).abs() < 1e-9);
    let sold = common::total(&result.records, |r| r.solar_sold_kwh);
    assert!((breakdown.yearly.grid_export - sold / 4.0 * 365.0).abs() < 1e-6);
}

#[test]
fn invalid_config_is_rejected_before_running() -> Result<()> {
    let mut cfg = Config::baseline();
    cfg.capital.battery_lifetime = 0.0;
    cfg.simulation.days = 0;
    match DispatchSimulator::new(cfg) {
        Err(Error::InvalidConfig(errors)) => {
            assert!(errors.contains_field("simulation.days"));
            assert!(errors.contains_field("capital.battery_lifetime"));
            Ok(())
        }
        Err(e) => Err(e),
        Ok(_) => panic!("invalid config should be rejected"),
    }
}
