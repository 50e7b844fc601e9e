//! Dispatch simulator that walks the clock and balances every step.

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, trace};

use crate::config::Config;
use crate::devices::{BatteryController, DemandGenerator, SolarModel, TopUpWindow};
use crate::economics::capital::CapitalCost;
use crate::error::Result;

use super::clock::{Clock, SimTime};
use super::tariff::TariffSchedule;
use super::types::{DAYS_PER_YEAR, DT_HOURS, SimulationResult, SimulationTotals, StepRecord};

/// Per-run mutable state that is not owned by a device.
#[derive(Debug, Default)]
struct SimulationState {
    /// Solar produced so far today (kWh).
    daily_solar_kwh: f64,
    /// Solar exported so far today (kWh).
    daily_sold_kwh: f64,
    /// Demand vector for the current day.
    day_demand: Vec<f64>,
}

/// Simulates one representative station and scales it to the whole site.
///
/// Each station owns its battery packs, an equal share of the solar array and
/// its own demand, so the site result is the station result times the station
/// count. One `StdRng` seeded from the config feeds both demand and solar, so
/// identical configs give bit-identical records.
pub struct DispatchSimulator {
    config: Config,
    tariff: TariffSchedule,
    solar: SolarModel,
    demand: DemandGenerator,
    battery: BatteryController,
    rng: StdRng,
    state: SimulationState,
    stations: f64,
}

impl DispatchSimulator {
    /// Creates a simulator for a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] before any step runs if the
    /// configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        let config = config.validated()?;
        let stations = f64::from(config.station.count);
        Ok(Self {
            tariff: TariffSchedule::from_config(&config.tariff),
            solar: SolarModel::new(config.solar.capacity_kw / stations, config.solar.variability),
            demand: DemandGenerator::from_config(&config.station, &config.demand),
            battery: BatteryController::from_config(&config.battery),
            rng: StdRng::seed_from_u64(config.simulation.seed),
            state: SimulationState::default(),
            stations,
            config,
        })
    }

    /// Returns a reference to the configuration being simulated.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the per-station battery.
    pub fn battery(&self) -> &BatteryController {
        &self.battery
    }

    /// Grid top-up opportunity at `time`.
    ///
    /// Pre-peak windows exist on weekdays only. The overnight window follows
    /// the clock, so Sunday nights top up too.
    fn top_up_window(&self, time: &SimTime) -> TopUpWindow {
        if self
            .tariff
            .is_pre_peak(time.time_of_day, time.weekday, self.config.battery.prepeak_hours)
        {
            TopUpWindow::PrePeak
        } else if self.tariff.in_off_peak_hours(time.time_of_day) {
            TopUpWindow::OffPeak
        } else {
            TopUpWindow::Closed
        }
    }

    /// Executes one timestep and returns its site-level record.
    ///
    /// Order within the step: direct solar, battery discharge, grid import,
    /// battery charge from leftover solar, grid top-up, export, curtailment.
    pub fn step(&mut self, time: SimTime) -> StepRecord {
        if time.is_day_start() || self.state.day_demand.is_empty() {
            self.state.day_demand = self.demand.draw_day(&mut self.rng);
            self.state.daily_solar_kwh = 0.0;
            self.state.daily_sold_kwh = 0.0;
            trace!(day = time.day, weekday = time.weekday, "new day");
        }

        let grid_rate = self.tariff.rate(time.time_of_day, time.weekday);
        let solar_produced = self.solar.energy_kwh(time.time_of_day, DT_HOURS, &mut self.rng);
        let demand = self.state.day_demand.get(time.slot).copied().unwrap_or(0.0);
        self.state.daily_solar_kwh += solar_produced;

        let solar_direct = solar_produced.min(demand);
        let remaining = demand - solar_direct;
        let discharge = self.battery.discharge(remaining, grid_rate, DT_HOURS);
        let grid_import = remaining - discharge.energy_kwh;

        let surplus = solar_produced - solar_direct;
        let window = self.top_up_window(&time);
        let charge = self.battery.charge(surplus, window, grid_rate, DT_HOURS);
        let mut residual = (surplus - charge.solar_consumed_kwh).max(0.0);

        let selling = &self.config.selling;
        let mut solar_sold = 0.0;
        if selling.enabled && residual > 0.0 {
            let quota = selling.percentage * self.state.daily_solar_kwh - self.state.daily_sold_kwh;
            solar_sold = residual.min(quota.max(0.0));
            self.state.daily_sold_kwh += solar_sold;
            residual -= solar_sold;
        }

        let revenue = demand * self.config.station.charging_price + solar_sold * selling.price;

        StepRecord {
            step: time.step,
            time_hr: time.hours_elapsed(),
            time_of_day: time.time_of_day,
            day: time.day,
            weekday: time.weekday,
            grid_rate,
            demand_kwh: demand,
            solar_produced_kwh: solar_produced,
            solar_direct_kwh: solar_direct,
            battery_discharged_kwh: discharge.energy_kwh,
            grid_import_kwh: grid_import,
            solar_to_battery_kwh: charge.from_solar_kwh,
            grid_to_battery_kwh: charge.from_grid_kwh,
            battery_soc_kwh: self.battery.soc_kwh(),
            cost_grid: grid_import * grid_rate + charge.grid_cost,
            cost_battery: discharge.cost,
            revenue,
            solar_sold_kwh: solar_sold,
            solar_curtailed_kwh: residual,
        }
        .scaled(self.stations)
    }

    /// Executes every timestep and returns the records plus horizon totals.
    pub fn run(mut self) -> SimulationResult {
        let days = self.config.simulation.days;
        let mut clock = Clock::new(days, self.config.simulation.start_weekday);
        let mut records = Vec::with_capacity(clock.total_steps());
        debug!(
            days,
            stations = self.config.station.count,
            seed = self.config.simulation.seed,
            "starting dispatch run"
        );
        clock.run(|time| records.push(self.step(time)));

        let annual_capital = CapitalCost::from_config(&self.config).annual();
        let totals = totals(&records, annual_capital * days as f64 / DAYS_PER_YEAR);
        debug!(
            ev_energy_kwh = totals.ev_energy_kwh,
            net_profit = totals.net_profit,
            "dispatch run finished"
        );

        SimulationResult {
            records,
            days,
            stations: self.config.station.count,
            battery_capacity_kwh: self.battery.capacity_kwh * self.stations,
            totals,
        }
    }
}

fn totals(records: &[StepRecord], depreciation: f64) -> SimulationTotals {
    let mut t = SimulationTotals {
        depreciation,
        ..SimulationTotals::default()
    };
    for r in records {
        t.ev_energy_kwh += r.demand_kwh;
        t.operating_cost += r.cost_grid + r.cost_battery;
        t.revenue += r.revenue;
    }
    t.net_profit = t.revenue - t.operating_cost - t.depreciation;
    t
}

/// Validates `config` and runs it to completion.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfig`] if the configuration is invalid.
pub fn simulate(config: &Config) -> Result<SimulationResult> {
    Ok(DispatchSimulator::new(config.clone())?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DemandMode, UsageProfile};
    use crate::error::Error;

    const TOL: f64 = 1e-9;

    fn one_day(mut cfg: Config) -> SimulationResult {
        cfg.simulation.days = 1;
        match simulate(&cfg) {
            Ok(r) => r,
            Err(e) => panic!("simulation failed: {e}"),
        }
    }

    #[test]
    fn one_day_has_48_records() {
        let r = one_day(Config::baseline());
        assert_eq!(r.records.len(), 48);
        assert_eq!(r.records.last().map(|s| s.time_of_day), Some(23.5));
    }

    #[test]
    fn every_step_conserves_energy() {
        let r = one_day(Config::baseline());
        for s in &r.records {
            let supplied = s.solar_direct_kwh + s.battery_discharged_kwh + s.grid_import_kwh;
            assert!((s.demand_kwh - supplied).abs() < TOL, "step {}", s.step);
            assert!(s.grid_import_kwh >= -TOL);
        }
    }

    #[test]
    fn solar_is_fully_accounted() {
        let mut cfg = Config::commuter();
        cfg.simulation.days = 2;
        let r = match simulate(&cfg) {
            Ok(r) => r,
            Err(e) => panic!("{e}"),
        };
        let inverter = cfg.battery.inverter_efficiency;
        for s in &r.records {
            let accounted = s.solar_direct_kwh
                + s.solar_to_battery_kwh / inverter
                + s.solar_sold_kwh
                + s.solar_curtailed_kwh;
            assert!((s.solar_produced_kwh - accounted).abs() < 1e-6, "step {}", s.step);
            assert!(s.solar_curtailed_kwh >= -TOL);
        }
    }

    #[test]
    fn soc_stays_within_capacity() {
        let mut cfg = Config::baseline();
        cfg.simulation.days = 3;
        let r = match simulate(&cfg) {
            Ok(r) => r,
            Err(e) => panic!("{e}"),
        };
        for s in &r.records {
            assert!(s.battery_soc_kwh >= -TOL);
            assert!(s.battery_soc_kwh <= r.battery_capacity_kwh + TOL);
        }
    }

    #[test]
    fn no_battery_means_no_battery_flows() {
        let r = one_day(Config::solar_only());
        assert_eq!(r.battery_capacity_kwh, 0.0);
        assert!(r.records.iter().all(|s| s.battery_discharged_kwh == 0.0));
        assert!(r.records.iter().all(|s| s.solar_to_battery_kwh == 0.0));
        assert!(r.records.iter().all(|s| s.grid_to_battery_kwh == 0.0));
    }

    #[test]
    fn grid_only_buys_everything() {
        let r = one_day(Config::grid_only());
        for s in &r.records {
            assert_eq!(s.solar_produced_kwh, 0.0);
            assert!((s.grid_import_kwh - s.demand_kwh).abs() < TOL);
            assert!((s.cost_grid - s.demand_kwh * s.grid_rate).abs() < TOL);
        }
    }

    #[test]
    fn revenue_is_demand_times_price() {
        let r = one_day(Config::grid_only());
        let demand: f64 = r.records.iter().map(|s| s.demand_kwh).sum();
        assert!((r.totals.revenue - demand * 0.17).abs() < 1e-6);
        assert!((demand - 180.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_records() {
        let a = one_day(Config::baseline());
        let b = one_day(Config::baseline());
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn different_seed_different_demand() {
        let a = one_day(Config::baseline());
        let mut cfg = Config::baseline();
        cfg.simulation.seed = 43;
        let b = one_day(cfg);
        assert_ne!(a.records, b.records);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut cfg = Config::baseline();
        cfg.battery.initial_soc = -0.1;
        assert!(matches!(
            DispatchSimulator::new(cfg),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn selling_respects_daily_quota() {
        let mut cfg = Config::solar_only();
        cfg.demand.mode = DemandMode::Profile;
        cfg.demand.profile = UsageProfile::NightOwl;
        cfg.demand.daily_demand_kwh = 5.0;
        cfg.selling.enabled = true;
        cfg.selling.percentage = 0.3;
        let r = one_day(cfg);
        let produced: f64 = r.records.iter().map(|s| s.solar_produced_kwh).sum();
        let sold: f64 = r.records.iter().map(|s| s.solar_sold_kwh).sum();
        assert!(sold > 0.0);
        assert!(sold <= 0.3 * produced + TOL);
        let mut produced_so_far = 0.0;
        let mut sold_so_far = 0.0;
        for s in &r.records {
            produced_so_far += s.solar_produced_kwh;
            sold_so_far += s.solar_sold_kwh;
            assert!(sold_so_far <= 0.3 * produced_so_far + TOL);
        }
    }

    #[test]
    fn stations_scale_linearly() {
        let mut single = Config::baseline();
        single.solar.capacity_kw = 10.0;
        let mut double = Config::baseline();
        double.station.count = 2;
        double.solar.capacity_kw = 20.0;
        let a = one_day(single);
        let b = one_day(double);
        for (x, y) in a.records.iter().zip(&b.records) {
            assert!((2.0 * x.demand_kwh - y.demand_kwh).abs() < TOL);
            assert!((2.0 * x.grid_import_kwh - y.grid_import_kwh).abs() < TOL);
            assert!((2.0 * x.battery_soc_kwh - y.battery_soc_kwh).abs() < TOL);
        }
    }

    #[test]
    fn depreciation_prorates_annual_capital() {
        let r = one_day(Config::baseline());
        let annual = CapitalCost::from_config(&Config::baseline()).annual();
        assert!((r.totals.depreciation - annual / 365.0).abs() < 1e-9);
        let t = &r.totals;
        assert!((t.net_profit - (t.revenue - t.operating_cost - t.depreciation)).abs() < 1e-9);
    }
}
