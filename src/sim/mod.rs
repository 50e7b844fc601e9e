/// Simulation clock for timestep and calendar management.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Time-of-use tariff lookup.
pub mod tariff;
pub mod types;
