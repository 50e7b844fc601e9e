//! Investment economics: capital cost, annual report and payback.

pub mod annual;
pub mod capital;
pub mod payback;

pub use annual::AnnualReport;
pub use capital::CapitalCost;
pub use payback::{Payback, payback_period};
