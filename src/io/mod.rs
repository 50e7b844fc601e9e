/// CSV and JSON export.
pub mod export;
