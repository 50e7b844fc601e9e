use rand::Rng;
use rand::seq::index;

use crate::config::{DemandConfig, DemandMode, StationConfig, UsageProfile};
use crate::sim::types::{DT_HOURS, STEPS_PER_DAY};

/// Hourly weights of the built-in usage profiles (not normalised).
fn preset_weights(profile: UsageProfile) -> Option<[f64; 24]> {
    let mut w = [0.0; 24];
    let bands: &[(usize, usize, f64)] = match profile {
        UsageProfile::Standard => &[(0, 6, 0.02), (6, 10, 0.06), (10, 16, 0.03), (16, 21, 0.08), (21, 24, 0.02)],
        UsageProfile::Working9To5 => &[(0, 6, 0.02), (6, 8, 0.05), (8, 17, 0.01), (17, 22, 0.10), (22, 24, 0.03)],
        UsageProfile::StayAtHome => &[(0, 6, 0.02), (6, 18, 0.06), (18, 24, 0.04)],
        UsageProfile::NightOwl => &[(0, 4, 0.08), (4, 16, 0.02), (16, 24, 0.05)],
        UsageProfile::Custom => return None,
    };
    for &(from, to, value) in bands {
        w[from..to].fill(value);
    }
    Some(w)
}

/// Daily EV demand per station, in kWh per half-hour slot.
///
/// In session mode each day picks `count` distinct slots at random and
/// charges at full station power in each. In profile mode the same
/// deterministic shape repeats every day.
#[derive(Debug, Clone, PartialEq)]
pub enum DemandGenerator {
    Sessions {
        /// Sessions per day (at most `STEPS_PER_DAY`).
        count: usize,
        /// Energy of one session: station power times step length.
        energy_kwh: f64,
    },
    Profile {
        /// Demand per slot, summing to the configured daily energy.
        slots: Vec<f64>,
    },
}

impl DemandGenerator {
    /// Builds the generator for one station. Expects a validated config.
    pub fn from_config(station: &StationConfig, demand: &DemandConfig) -> Self {
        match demand.mode {
            DemandMode::Sessions => Self::Sessions {
                count: demand.sessions_per_day.min(STEPS_PER_DAY),
                energy_kwh: station.power_kw * DT_HOURS,
            },
            DemandMode::Profile => {
                let weights: Vec<f64> = match preset_weights(demand.profile) {
                    Some(w) => w.to_vec(),
                    None => demand.custom_profile.clone().unwrap_or_default(),
                };
                Self::Profile {
                    slots: expand_profile(&weights, demand.daily_demand_kwh),
                }
            }
        }
    }

    /// Energy the generator delivers every day (kWh).
    pub fn daily_energy_kwh(&self) -> f64 {
        match self {
            Self::Sessions { count, energy_kwh } => *count as f64 * energy_kwh,
            Self::Profile { slots } => slots.iter().sum(),
        }
    }

    /// Draws the demand vector for one day.
    ///
    /// Profile mode never touches `rng`.
    pub fn draw_day<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        match self {
            Self::Sessions { count, energy_kwh } => {
                let mut day = vec![0.0; STEPS_PER_DAY];
                if *count == 0 {
                    return day;
                }
                for slot in index::sample(rng, STEPS_PER_DAY, *count).iter() {
                    day[slot] = *energy_kwh;
                }
                day
            }
            Self::Profile { slots } => slots.clone(),
        }
    }
}

/// Spreads `daily_kwh` over 48 slots, each half-hour taking half of its hour's share.
fn expand_profile(weights: &[f64], daily_kwh: f64) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    let mut slots = vec![0.0; STEPS_PER_DAY];
    if weights.len() != 24 || total <= 0.0 {
        return slots;
    }
    for (slot, value) in slots.iter_mut().enumerate() {
        *value = daily_kwh * weights[slot / 2] / (2.0 * total);
    }
    slots
}
