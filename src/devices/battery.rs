use crate::config::{BatteryConfig, DischargePolicy};

/// Grid top-up opportunity for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUpWindow {
    /// No grid charging this step.
    Closed,
    /// Overnight off-peak hours: charge toward 80% of capacity.
    OffPeak,
    /// Shortly before a peak window: charge toward full.
    PrePeak,
}

impl TopUpWindow {
    /// Target state of charge as a fraction of capacity.
    pub fn target_fraction(self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::OffPeak => 0.8,
            Self::PrePeak => 1.0,
        }
    }
}

/// Energy released to EV demand in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Discharge {
    pub energy_kwh: f64,
    /// Degradation cost of the released energy.
    pub cost: f64,
}

/// Energy added to the battery in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Charge {
    /// Stored from solar, after inverter losses.
    pub from_solar_kwh: f64,
    /// Solar surplus consumed to store `from_solar_kwh`.
    pub solar_consumed_kwh: f64,
    /// Drawn from the grid, before charging losses. Never exceeds the
    /// charge power headroom left by solar.
    pub from_grid_kwh: f64,
    /// Price paid for `from_grid_kwh`.
    pub grid_cost: f64,
}

/// Battery state of charge plus the rules that move it.
///
/// Discharge keeps a reserve (20% of capacity by default) and is limited by
/// the discharge power. Charging takes solar surplus first and then, inside
/// a top-up window, tops up from the grid with the power headroom that solar
/// left unused. The state of charge stays within `[0, capacity]`.
#[derive(Debug, Clone)]
pub struct BatteryController {
    /// Usable capacity in kWh; zero means no battery.
    pub capacity_kwh: f64,

    /// Stored energy in kWh.
    soc_kwh: f64,

    /// Charge power limit in kW, shared by solar and grid charging.
    pub max_charge_kw: f64,

    /// Discharge power limit in kW.
    pub max_discharge_kw: f64,

    /// Fraction of grid energy that is stored.
    pub battery_efficiency: f64,

    /// Fraction of solar surplus that reaches the cells.
    pub inverter_efficiency: f64,

    /// $/kWh charged on discharged energy.
    pub degradation_cost: f64,

    /// Fraction of capacity that discharge never touches.
    pub reserve_fraction: f64,

    /// When discharge is allowed.
    pub policy: DischargePolicy,

    /// Minimum grid rate for discharge under [`DischargePolicy::PriceThreshold`].
    pub price_threshold: f64,
}

impl BatteryController {
    /// Builds one station's battery from its config. Expects a validated config.
    pub fn from_config(cfg: &BatteryConfig) -> Self {
        let capacity_kwh = cfg.capacity_kwh();
        let (max_charge_kw, max_discharge_kw) = cfg.power_limits_kw();
        Self {
            capacity_kwh,
            soc_kwh: (cfg.initial_soc * capacity_kwh).clamp(0.0, capacity_kwh),
            max_charge_kw,
            max_discharge_kw,
            battery_efficiency: cfg.battery_efficiency,
            inverter_efficiency: cfg.inverter_efficiency,
            degradation_cost: cfg.degradation_cost,
            reserve_fraction: cfg.reserve_fraction,
            policy: cfg.discharge_policy,
            price_threshold: cfg.price_threshold,
        }
    }

    /// Stored energy in kWh.
    pub fn soc_kwh(&self) -> f64 {
        self.soc_kwh
    }

    /// Stored energy as a fraction of capacity, `0.0` without a battery.
    pub fn soc_fraction(&self) -> f64 {
        if self.capacity_kwh > 0.0 {
            self.soc_kwh / self.capacity_kwh
        } else {
            0.0
        }
    }

    /// Covers as much of `remaining_kwh` as the reserve, the power limit and
    /// the discharge policy allow.
    ///
    /// # Arguments
    ///
    /// * `remaining_kwh` - EV demand left after direct solar
    /// * `grid_rate` - Grid price this step ($/kWh)
    /// * `dt_hours` - Step length in hours
    pub fn discharge(&mut self, remaining_kwh: f64, grid_rate: f64, dt_hours: f64) -> Discharge {
        if self.capacity_kwh <= 0.0 || remaining_kwh <= 0.0 {
            return Discharge::default();
        }
        if self.policy == DischargePolicy::PriceThreshold && grid_rate < self.price_threshold {
            return Discharge::default();
        }

        let available = (self.soc_kwh - self.reserve_fraction * self.capacity_kwh).max(0.0);
        let energy_kwh = available
            .min(remaining_kwh)
            .min(self.max_discharge_kw * dt_hours)
            .max(0.0);
        self.set_soc(self.soc_kwh - energy_kwh);

        Discharge {
            energy_kwh,
            cost: energy_kwh * self.degradation_cost,
        }
    }

    /// Stores solar surplus, then tops up from the grid when `window` allows.
    ///
    /// # Arguments
    ///
    /// * `surplus_kwh` - Solar left after serving demand
    /// * `window` - Grid top-up opportunity this step
    /// * `grid_rate` - Grid price this step ($/kWh)
    /// * `dt_hours` - Step length in hours
    pub fn charge(
        &mut self,
        surplus_kwh: f64,
        window: TopUpWindow,
        grid_rate: f64,
        dt_hours: f64,
    ) -> Charge {
        if self.capacity_kwh <= 0.0 {
            return Charge::default();
        }
        let power_limit = self.max_charge_kw * dt_hours;

        let from_solar_kwh = if surplus_kwh > 0.0 {
            (surplus_kwh * self.inverter_efficiency)
                .min(power_limit)
                .min(self.capacity_kwh - self.soc_kwh)
                .max(0.0)
        } else {
            0.0
        };
        self.set_soc(self.soc_kwh + from_solar_kwh);
        let solar_consumed_kwh = (from_solar_kwh / self.inverter_efficiency).min(surplus_kwh.max(0.0));

        let mut from_grid_kwh = 0.0;
        if window != TopUpWindow::Closed {
            let target = window.target_fraction() * self.capacity_kwh;
            // the draw itself is capped by the headroom solar left
            from_grid_kwh = ((target - self.soc_kwh) / self.battery_efficiency)
                .min(power_limit - from_solar_kwh)
                .max(0.0);
            self.set_soc(self.soc_kwh + from_grid_kwh * self.battery_efficiency);
        }

        Charge {
            from_solar_kwh,
            solar_consumed_kwh,
            from_grid_kwh,
            grid_cost: from_grid_kwh * grid_rate,
        }
    }

    fn set_soc(&mut self, soc_kwh: f64) {
        self.soc_kwh = soc_kwh.clamp(0.0, self.capacity_kwh);
    }
}
