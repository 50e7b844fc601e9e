//! EV charging site simulator: solar, battery storage and return on investment.

pub mod cli;
pub mod config;
/// Solar, EV demand and battery models.
pub mod devices;
pub mod economics;
pub mod error;
pub mod io;
pub mod logging;
pub mod reporting;
pub mod scenario;
/// Dispatch engine, tariff, clock and energy summaries.
pub mod sim;

pub use config::Config;
pub use error::{Error, Result};
