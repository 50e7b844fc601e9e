//! Up-front investment and its straight-line amortisation.

use std::fmt;

use serde::Serialize;

use crate::config::Config;

/// Array size that solar panel and installation prices are quoted for (kW).
pub const SOLAR_PRICE_UNIT_KW: f64 = 10.0;

/// Purchase cost of one kind of equipment and how long it lasts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Component {
    pub cost: f64,
    /// Years.
    pub lifetime: f64,
}

impl Component {
    /// Straight-line yearly cost; zero when nothing was bought.
    pub fn annualised(&self) -> f64 {
        if self.cost <= 0.0 || self.lifetime <= 0.0 {
            0.0
        } else {
            self.cost / self.lifetime
        }
    }
}

/// Site capital cost broken down by component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CapitalCost {
    pub stations: Component,
    pub transformer: Component,
    pub solar_panels: Component,
    pub inverters: Component,
    pub installation: Component,
    pub batteries: Component,
}

impl CapitalCost {
    /// Prices the site described by `config`.
    ///
    /// Stations, inverters and battery packs are bought per station. One
    /// transformer serves the site. Panels and installation scale with array
    /// size. A site with a battery uses the hybrid inverter price.
    pub fn from_config(config: &Config) -> Self {
        let c = &config.capital;
        let n = f64::from(config.station.count);
        let solar_units = config.solar.capacity_kw / SOLAR_PRICE_UNIT_KW;
        let battery = &config.battery;

        let inverter_unit = if battery.enabled {
            c.inverter_cost
        } else {
            c.plain_inverter_cost
        };
        let battery_cost = if battery.enabled {
            battery.pack_price * f64::from(battery.pack_count) * n
        } else {
            0.0
        };

        Self {
            stations: Component {
                cost: c.station_cost * n,
                lifetime: c.station_lifetime,
            },
            transformer: Component {
                cost: c.transformer_cost,
                lifetime: c.transformer_lifetime,
            },
            solar_panels: Component {
                cost: solar_units * c.solar_panel_cost,
                lifetime: c.solar_lifetime,
            },
            inverters: Component {
                cost: inverter_unit * n,
                lifetime: c.inverter_lifetime,
            },
            installation: Component {
                cost: solar_units * c.installation_cost,
                lifetime: c.installation_lifetime,
            },
            batteries: Component {
                cost: battery_cost,
                lifetime: c.battery_lifetime,
            },
        }
    }

    fn components(&self) -> [(&'static str, Component); 6] {
        [
            ("Stations", self.stations),
            ("Transformer", self.transformer),
            ("Solar panels", self.solar_panels),
            ("Inverters", self.inverters),
            ("Installation", self.installation),
            ("Batteries", self.batteries),
        ]
    }

    /// Total up-front investment.
    pub fn total(&self) -> f64 {
        self.components().iter().map(|(_, c)| c.cost).sum()
    }

    /// Sum of every component's yearly amortisation.
    pub fn annual(&self) -> f64 {
        self.components().iter().map(|(_, c)| c.annualised()).sum()
    }
}

impl fmt::Display for CapitalCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Capital Cost ---")?;
        for (name, c) in self.components() {
            writeln!(
                f,
                "{:<14} ${:>10.2}  over {:>4.1} y  = ${:>9.2}/y",
                name,
                c.cost,
                c.lifetime,
                c.annualised()
            )?;
        }
        write!(
            f,
            "{:<14} ${:>10.2}              = ${:>9.2}/y",
            "Total",
            self.total(),
            self.annual()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_site_cost() {
        let cap = CapitalCost::from_config(&Config::baseline());
        // 7000 + 1000 + 2*2000 + 3000 + 2*1000 + 4*1000
        assert!((cap.total() - 21_000.0).abs() < 1e-9);
        // 700 + 66.67 + 160 + 300 + 200 + 400
        let expected = 700.0 + 1000.0 / 15.0 + 160.0 + 300.0 + 200.0 + 400.0;
        assert!((cap.annual() - expected).abs() < 1e-9);
    }

    #[test]
    fn grid_only_uses_plain_inverter_and_no_packs() {
        let cap = CapitalCost::from_config(&Config::grid_only());
        assert_eq!(cap.inverters.cost, 2000.0);
        assert_eq!(cap.batteries.cost, 0.0);
        assert_eq!(cap.solar_panels.cost, 0.0);
        assert_eq!(cap.installation.cost, 0.0);
        assert!((cap.total() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn per_station_items_scale_with_count() {
        let mut cfg = Config::baseline();
        cfg.station.count = 3;
        let cap = CapitalCost::from_config(&cfg);
        assert_eq!(cap.stations.cost, 21_000.0);
        assert_eq!(cap.inverters.cost, 9_000.0);
        assert_eq!(cap.batteries.cost, 12_000.0);
        assert_eq!(cap.transformer.cost, 1_000.0);
    }

    #[test]
    fn free_component_with_zero_lifetime_amortises_to_zero() {
        let c = Component {
            cost: 0.0,
            lifetime: 0.0,
        };
        assert_eq!(c.annualised(), 0.0);
    }

    #[test]
    fn display_lists_every_component() {
        let s = CapitalCost::from_config(&Config::baseline()).to_string();
        assert!(s.contains("Transformer"));
        assert!(s.contains("Total"));
    }
}
