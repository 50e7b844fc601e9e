//! Site equipment models: solar array, EV demand and battery storage.

/// Battery state of charge and dispatch rules.
pub mod battery;
/// EV charging demand generators.
pub mod ev_demand;
/// Solar production model.
pub mod solar;

pub use battery::{BatteryController, Charge, Discharge, TopUpWindow};
pub use ev_demand::DemandGenerator;
pub use solar::SolarModel;
