//! Inflation-adjusted payback period.

use std::fmt;

use serde::Serialize;

/// Yearly growth applied to the cash flow.
pub const INFLATION_RATE: f64 = 0.05;
/// Horizon beyond which payback is reported as not achievable.
pub const MAX_PAYBACK_YEARS: u32 = 100;

/// Time until cumulative cash flow covers the investment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum Payback {
    Years(f64),
    NotAchievable,
}

impl Payback {
    /// Years to payback, if achievable.
    pub fn years(&self) -> Option<f64> {
        match self {
            Self::Years(y) => Some(*y),
            Self::NotAchievable => None,
        }
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Years(y) => write!(f, "{y:.2} years"),
            Self::NotAchievable => write!(f, "not achievable"),
        }
    }
}

/// Computes the payback period of `capital` given a first-year cash flow
/// that grows by [`INFLATION_RATE`] each year.
///
/// Year `n` contributes `cash_flow * 1.05^(n-1)`. The result is fractional
/// within the year the running total first reaches `capital`.
///
/// # Returns
///
/// * `Payback::Years(0.0)` - when nothing was invested
/// * `Payback::NotAchievable` - when the cash flow is not positive or the
///   horizon of [`MAX_PAYBACK_YEARS`] passes first
pub fn payback_period(capital: f64, annual_cash_flow: f64) -> Payback {
    if capital <= 0.0 {
        return Payback::Years(0.0);
    }
    if !(annual_cash_flow > 0.0) {
        return Payback::NotAchievable;
    }

    let mut cumulative = 0.0;
    let mut flow = annual_cash_flow;
    for year in 1..=MAX_PAYBACK_YEARS {
        if cumulative + flow >= capital {
            let fraction = (capital - cumulative) / flow;
            return Payback::Years(f64::from(year - 1) + fraction);
        }
        cumulative += flow;
        flow *= 1.0 + INFLATION_RATE;
    }
    Payback::NotAchievable
}
