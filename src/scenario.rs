//! Scenario comparison, design-space sweeps and Monte Carlo repetitions.
//!
//! Every run here is an independent [`DispatchSimulator`] with its own
//! seeded generator, so sweeps fan out with rayon and results come back in
//! input order.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::economics::{AnnualReport, CapitalCost, Payback};
use crate::error::Result;
use crate::sim::engine::DispatchSimulator;
use crate::sim::types::SimulationResult;

/// The three canonical site layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioKind {
    GridOnly,
    SolarOnly,
    SolarStorage,
}

impl ScenarioKind {
    pub const ALL: [Self; 3] = [Self::GridOnly, Self::SolarOnly, Self::SolarStorage];

    pub fn label(self) -> &'static str {
        match self {
            Self::GridOnly => "Grid only",
            Self::SolarOnly => "Solar only",
            Self::SolarStorage => "Solar + storage",
        }
    }

    /// Derives this layout from `base`, leaving every other field and the seed alone.
    pub fn apply(self, base: &Config) -> Config {
        let mut cfg = base.clone();
        match self {
            Self::GridOnly => {
                cfg.solar.capacity_kw = 0.0;
                cfg.battery.enabled = false;
            }
            Self::SolarOnly => cfg.battery.enabled = false,
            Self::SolarStorage => cfg.battery.enabled = true,
        }
        cfg
    }
}

/// One canonical layout with its run and annual economics.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub kind: ScenarioKind,
    pub result: SimulationResult,
    pub report: AnnualReport,
}

/// Runs grid-only, solar-only and solar+storage variants of `base`.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfig`] if any variant is invalid.
pub fn compare_scenarios(base: &Config) -> Result<Vec<ScenarioOutcome>> {
    ScenarioKind::ALL[..]
        .par_iter()
        .map(|&kind| -> Result<ScenarioOutcome> {
            let cfg = kind.apply(base);
            let result = DispatchSimulator::new(cfg.clone())?.run();
            let report = AnnualReport::from_result(&result, &cfg);
            Ok(ScenarioOutcome {
                kind,
                result,
                report,
            })
        })
        .collect()
}

/// Renders a side-by-side table of scenario outcomes.
pub struct ComparisonTable<'a>(pub &'a [ScenarioOutcome]);

impl fmt::Display for ComparisonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Scenario Comparison ---")?;
        writeln!(
            f,
            "{:<16}{:>14}{:>12}{:>12}{:>12}{:>10}  {}",
            "Scenario", "Opex $/y", "Capex $", "$/kWh", "Profit $/y", "ROI", "Payback"
        )?;
        for (i, o) in self.0.iter().enumerate() {
            let r = &o.report;
            write!(
                f,
                "{:<16}{:>14.2}{:>12.2}{:>12}{:>12.2}{:>10}  {}",
                o.kind.label(),
                r.annual_operating_cost,
                r.total_capital_cost,
                r.effective_cost_per_kwh
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}")),
                r.net_profit,
                r.roi
                    .map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0)),
                r.payback,
            )?;
            if i + 1 < self.0.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// One combination of design variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DesignPoint {
    pub stations: u32,
    pub battery: bool,
    /// Packs per station; zero whenever `battery` is false.
    pub pack_count: u32,
    pub solar_kw: f64,
}

impl DesignPoint {
    /// Applies this point to a copy of `base`.
    pub fn apply(&self, base: &Config) -> Config {
        let mut cfg = base.clone();
        cfg.station.count = self.stations;
        cfg.battery.enabled = self.battery;
        if self.battery {
            cfg.battery.pack_count = self.pack_count;
        }
        cfg.solar.capacity_kw = self.solar_kw;
        cfg
    }

    fn features(&self) -> [f64; 4] {
        [
            f64::from(self.stations),
            if self.battery { 1.0 } else { 0.0 },
            f64::from(self.pack_count),
            self.solar_kw,
        ]
    }
}

/// Discrete grid of design variables. A pack count of zero means no battery.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    pub station_counts: Vec<u32>,
    pub battery_pack_counts: Vec<u32>,
    pub solar_capacities_kw: Vec<f64>,
}

impl Default for DesignSpace {
    fn default() -> Self {
        Self {
            station_counts: vec![1, 2],
            battery_pack_counts: vec![0, 1, 2, 3, 4],
            solar_capacities_kw: (1..=9).map(|i| f64::from(i) * 2.0).collect(),
        }
    }
}

impl DesignSpace {
    /// Every combination, stations outermost and solar innermost.
    pub fn points(&self) -> Vec<DesignPoint> {
        let mut points = Vec::with_capacity(
            self.station_counts.len() * self.battery_pack_counts.len() * self.solar_capacities_kw.len(),
        );
        for &stations in &self.station_counts {
            for &pack_count in &self.battery_pack_counts {
                for &solar_kw in &self.solar_capacities_kw {
                    points.push(DesignPoint {
                        stations,
                        battery: pack_count > 0,
                        pack_count,
                        solar_kw,
                    });
                }
            }
        }
        points
    }
}

/// Economics of one design point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub point: DesignPoint,
    pub roi: Option<f64>,
    pub annual_profit: f64,
    pub capital_cost: f64,
    pub effective_cost_per_kwh: Option<f64>,
    pub payback: Payback,
}

/// Simulates every point of `space` against `base`.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfig`] if any point yields an invalid config.
pub fn grid_search(base: &Config, space: &DesignSpace) -> Result<Vec<ScenarioResult>> {
    let points = space.points();
    if points.is_empty() {
        warn!("design space is empty, nothing to sweep");
        return Ok(Vec::new());
    }
    info!(points = points.len(), "running design-space sweep");

    points
        .par_iter()
        .map(|point| -> Result<ScenarioResult> {
            let cfg = point.apply(base);
            let result = DispatchSimulator::new(cfg.clone())?.run();
            let report = AnnualReport::from_parts(&result, &CapitalCost::from_config(&cfg));
            Ok(ScenarioResult {
                point: *point,
                roi: report.roi,
                annual_profit: report.net_profit,
                capital_cost: report.total_capital_cost,
                effective_cost_per_kwh: report.effective_cost_per_kwh,
                payback: report.payback,
            })
        })
        .collect()
}

/// The result with the highest defined ROI; the earliest one wins ties.
pub fn best_by_roi(results: &[ScenarioResult]) -> Option<&ScenarioResult> {
    results
        .iter()
        .filter_map(|r| r.roi.map(|roi| (roi, r)))
        .fold(None, |best: Option<(f64, &ScenarioResult)>, (roi, r)| match best {
            Some((b, _)) if b >= roi => best,
            _ => Some((roi, r)),
        })
        .map(|(_, r)| r)
}

/// Least-squares linear model of ROI over the four design variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityFit {
    pub intercept: f64,
    /// ROI change per extra station.
    pub stations: f64,
    /// ROI change from adding a battery at all.
    pub battery: f64,
    /// ROI change per extra pack.
    pub pack_count: f64,
    /// ROI change per extra kW of solar.
    pub solar_kw: f64,
    /// Coefficient of determination on the fitted points.
    pub r_squared: f64,
}

impl SensitivityFit {
    /// Fits the model to every result with a defined ROI.
    ///
    /// Collinear or constant design variables are resolved with the SVD
    /// pseudo-inverse. Returns `None` with fewer than two usable points.
    pub fn fit(results: &[ScenarioResult]) -> Option<Self> {
        let rows: Vec<([f64; 4], f64)> = results
            .iter()
            .filter_map(|r| r.roi.map(|roi| (r.point.features(), roi)))
            .collect();
        if rows.len() < 2 {
            return None;
        }

        let x = DMatrix::from_fn(rows.len(), 5, |i, j| if j == 0 { 1.0 } else { rows[i].0[j - 1] });
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|(_, roi)| *roi));
        let beta = x.clone().svd(true, true).solve(&y, 1e-12).ok()?;

        let predicted = &x * &beta;
        let mean = y.mean();
        let ss_res = (&y - &predicted).norm_squared();
        let ss_tot = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Some(Self {
            intercept: beta[0],
            stations: beta[1],
            battery: beta[2],
            pack_count: beta[3],
            solar_kw: beta[4],
            r_squared,
        })
    }

    /// Model ROI at `point`.
    pub fn predict(&self, point: &DesignPoint) -> f64 {
        let [s, b, p, kw] = point.features();
        self.intercept + self.stations * s + self.battery * b + self.pack_count * p + self.solar_kw * kw
    }
}

impl fmt::Display for SensitivityFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- ROI Sensitivity (linear fit, R^2 = {:.3}) ---", self.r_squared)?;
        writeln!(f, "Intercept:        {:+.5}", self.intercept)?;
        writeln!(f, "Per station:      {:+.5}", self.stations)?;
        writeln!(f, "Battery present:  {:+.5}", self.battery)?;
        writeln!(f, "Per pack:         {:+.5}", self.pack_count)?;
        write!(f, "Per solar kW:     {:+.5}", self.solar_kw)
    }
}

/// Distribution of annual net profit over repeated seeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonteCarloSummary {
    pub iterations: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p95: f64,
}

impl fmt::Display for MonteCarloSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Monte Carlo ({} runs, annual net profit) ---", self.iterations)?;
        writeln!(f, "Mean:     ${:.2}", self.mean)?;
        writeln!(f, "Std dev:  ${:.2}", self.std_dev)?;
        writeln!(f, "Min/Max:  ${:.2} / ${:.2}", self.min, self.max)?;
        write!(f, "P5/P95:   ${:.2} / ${:.2}", self.p5, self.p95)
    }
}

/// Runs `base` with seeds `seed, seed + 1, ..` and summarises annual net profit.
///
/// Returns `Ok(None)` when `iterations` is zero.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfig`] if `base` is invalid.
pub fn monte_carlo(base: &Config, iterations: usize) -> Result<Option<MonteCarloSummary>> {
    if iterations == 0 {
        return Ok(None);
    }
    let base = base.clone().validated()?;
    let capital = CapitalCost::from_config(&base);

    let mut profits = (0..iterations)
        .into_par_iter()
        .map(|i| -> Result<f64> {
            let mut cfg = base.clone();
            cfg.simulation.seed = base.simulation.seed.wrapping_add(i as u64);
            let result = DispatchSimulator::new(cfg)?.run();
            Ok(AnnualReport::from_parts(&result, &capital).net_profit)
        })
        .collect::<Result<Vec<f64>>>()?;
    profits.sort_by(f64::total_cmp);

    let n = profits.len() as f64;
    let mean = profits.iter().sum::<f64>() / n;
    let variance = profits.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    info!(iterations, mean, "monte carlo finished");

    Ok(Some(MonteCarloSummary {
        iterations,
        mean,
        std_dev: variance.sqrt(),
        min: profits[0],
        max: profits[profits.len() - 1],
        p5: percentile(&profits, 0.05),
        p95: percentile(&profits, 0.95),
    }))
}

/// Linear-interpolated percentile of sorted, non-empty data.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(mut cfg: Config) -> Config {
        cfg.simulation.days = 7;
        cfg
    }

    #[test]
    fn canonical_layouts() {
        let base = Config::baseline();
        let grid = ScenarioKind::GridOnly.apply(&base);
        assert_eq!(grid.solar.capacity_kw, 0.0);
        assert!(!grid.battery.enabled);
        let solar = ScenarioKind::SolarOnly.apply(&base);
        assert_eq!(solar.solar.capacity_kw, base.solar.capacity_kw);
        assert!(!solar.battery.enabled);
        assert!(ScenarioKind::SolarStorage.apply(&Config::solar_only()).battery.enabled);
        assert_eq!(solar.simulation.seed, base.simulation.seed);
    }

    #[test]
    fn compare_returns_canonical_order() {
        let outcomes = compare_scenarios(&short(Config::baseline())).unwrap();
        let kinds: Vec<_> = outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, ScenarioKind::ALL.to_vec());
    }

    #[test]
    fn default_space_matches_sweep_size() {
        let points = DesignSpace::default().points();
        assert_eq!(points.len(), 2 * 5 * 9);
        assert!(!points[0].battery);
        assert_eq!(points[0].solar_kw, 2.0);
        assert!(points[9].battery);
        assert_eq!(points[9].pack_count, 1);
    }

    #[test]
    fn grid_search_preserves_point_order() {
        let space = DesignSpace {
            station_counts: vec![1, 2],
            battery_pack_counts: vec![0, 2],
            solar_capacities_kw: vec![4.0, 12.0],
        };
        let results = grid_search(&short(Config::baseline()), &space).expect("sweep should run");
        let points: Vec<_> = results.iter().map(|r| r.point).collect();
        assert_eq!(points, space.points());
    }

    #[test]
    fn empty_space_is_empty() {
        let space = DesignSpace {
            station_counts: Vec::new(),
            ..DesignSpace::default()
        };
        assert!(grid_search(&Config::baseline(), &space).unwrap().is_empty());
    }

    fn scenario(roi: Option<f64>, solar_kw: f64) -> ScenarioResult {
        ScenarioResult {
            point: DesignPoint {
                stations: 1,
                battery: false,
                pack_count: 0,
                solar_kw,
            },
            roi,
            annual_profit: 0.0,
            capital_cost: 1.0,
            effective_cost_per_kwh: None,
            payback: Payback::NotAchievable,
        }
    }

    #[test]
    fn best_by_roi_skips_undefined_and_keeps_first_tie() {
        let results = [
            scenario(None, 1.0),
            scenario(Some(0.2), 2.0),
            scenario(Some(0.3), 3.0),
            scenario(Some(0.3), 4.0),
        ];
        assert_eq!(best_by_roi(&results).map(|r| r.point.solar_kw), Some(3.0));
        assert!(best_by_roi(&[scenario(None, 1.0)]).is_none());
    }

    #[test]
    fn sensitivity_recovers_exact_linear_roi() {
        let mut results = Vec::new();
        for stations in 1..=2 {
            for packs in 0..=3 {
                for kw in [2.0, 6.0, 10.0] {
                    let point = DesignPoint {
                        stations,
                        battery: packs > 0,
                        pack_count: packs,
                        solar_kw: kw,
                    };
                    let battery = if packs > 0 { 1.0 } else { 0.0 };
                    let roi = 0.1 + 0.05 * f64::from(stations) - 0.02 * battery
                        - 0.01 * f64::from(packs)
                        + 0.003 * kw;
                    results.push(ScenarioResult {
                        point,
                        roi: Some(roi),
                        ..scenario(None, 0.0)
                    });
                }
            }
        }
        let Some(fit) = SensitivityFit::fit(&results) else {
            panic!("fit should succeed on a full-rank design");
        };
        assert!((fit.intercept - 0.1).abs() < 1e-9);
        assert!((fit.stations - 0.05).abs() < 1e-9);
        assert!((fit.battery + 0.02).abs() < 1e-9);
        assert!((fit.pack_count + 0.01).abs() < 1e-9);
        assert!((fit.solar_kw - 0.003).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!((fit.predict(&results[5].point) - results[5].roi.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn sensitivity_needs_two_points() {
        assert!(SensitivityFit::fit(&[scenario(Some(0.1), 2.0)]).is_none());
    }

    #[test]
    fn monte_carlo_summary_is_ordered() {
        let s = monte_carlo(&short(Config::baseline()), 8)
            .unwrap()
            .expect("eight iterations give a summary");
        assert_eq!(s.iterations, 8);
        assert!(s.min <= s.p5 && s.p95 <= s.max);
        assert!(s.min <= s.mean && s.mean <= s.max);
        assert!(s.std_dev > 0.0);
    }

    #[test]
    fn monte_carlo_zero_iterations() {
        assert!(matches!(monte_carlo(&Config::baseline(), 0), Ok(None)));
    }

    #[test]
    fn percentile_interpolates() {
        let data = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&data, 0.5), 20.0);
        assert!((percentile(&data, 0.05) - 2.0).abs() < 1e-12);
    }
}
