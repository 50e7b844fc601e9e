//! CSV and JSON export for step records, sweep rows and reports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::scenario::ScenarioResult;
use crate::sim::types::StepRecord;

/// Column header for step-record export.
const STEP_HEADER: &str = "step,time_hr,day,weekday,time_of_day,grid_rate,demand_kwh,\
                           solar_produced_kwh,solar_direct_kwh,battery_discharged_kwh,\
                           grid_import_kwh,solar_to_battery_kwh,grid_to_battery_kwh,\
                           battery_soc_kwh,cost_grid,cost_battery,revenue,\
                           solar_sold_kwh,solar_curtailed_kwh";

/// Column header for design-space sweep export.
const SWEEP_HEADER: &str = "stations,battery,pack_count,solar_kw,roi,annual_profit,\
                            capital_cost,effective_cost_per_kwh,payback_years";

/// Exports step records to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_steps_csv(records: &[StepRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_steps_csv(records, io::BufWriter::new(file))
}

/// Writes step records as CSV to any writer, one row per step.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_steps_csv(records: &[StepRecord], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(STEP_HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.step.to_string(),
            format!("{:.1}", r.time_hr),
            r.day.to_string(),
            r.weekday.to_string(),
            format!("{:.1}", r.time_of_day),
            format!("{:.4}", r.grid_rate),
            format!("{:.6}", r.demand_kwh),
            format!("{:.6}", r.solar_produced_kwh),
            format!("{:.6}", r.solar_direct_kwh),
            format!("{:.6}", r.battery_discharged_kwh),
            format!("{:.6}", r.grid_import_kwh),
            format!("{:.6}", r.solar_to_battery_kwh),
            format!("{:.6}", r.grid_to_battery_kwh),
            format!("{:.6}", r.battery_soc_kwh),
            format!("{:.6}", r.cost_grid),
            format!("{:.6}", r.cost_battery),
            format!("{:.6}", r.revenue),
            format!("{:.6}", r.solar_sold_kwh),
            format!("{:.6}", r.solar_curtailed_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Exports sweep rows to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_sweep_csv(results: &[ScenarioResult], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_sweep_csv(results, io::BufWriter::new(file))
}

/// Writes sweep rows as CSV. Undefined metrics are left empty.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_sweep_csv(results: &[ScenarioResult], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SWEEP_HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.point.stations.to_string(),
            r.point.battery.to_string(),
            r.point.pack_count.to_string(),
            format!("{:.1}", r.point.solar_kw),
            optional(r.roi),
            format!("{:.2}", r.annual_profit),
            format!("{:.2}", r.capital_cost),
            optional(r.effective_cost_per_kwh),
            optional(r.payback.years()),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes any serialisable report as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialisation or writing fails.
pub fn write_json<T: Serialize>(value: &T, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
