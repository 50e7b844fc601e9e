//! EV charging site simulator entry point: CLI wiring and mode dispatch.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use tracing::info;

use ev_roi_sim::cli::{Args, Mode};
use ev_roi_sim::config::Config;
use ev_roi_sim::error::Result;
use ev_roi_sim::io::export::{export_steps_csv, export_sweep_csv, write_json};
use ev_roi_sim::logging;
use ev_roi_sim::reporting::RunReport;
use ev_roi_sim::scenario::{
    ComparisonTable, DesignSpace, SensitivityFit, best_by_roi, compare_scenarios, grid_search,
    monte_carlo,
};
use ev_roi_sim::sim::engine::simulate;

/// Loads the config: `--scenario` takes priority, then `--preset`, then baseline.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(ref path) = args.scenario {
        Config::from_toml_file(path)?
    } else if let Some(ref name) = args.preset {
        Config::from_preset(name)?
    } else {
        Config::baseline()
    };

    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(days) = args.days {
        config.simulation.days = days;
    }
    config.validated()
}

fn run_report(args: &Args, config: &Config, out: &mut impl Write) -> Result<()> {
    let result = simulate(config)?;
    let report = RunReport::new(&result, config);

    if args.json {
        write_json(&report, &mut *out)?;
    } else {
        writeln!(out, "{report}")?;
    }

    if let Some(ref path) = args.telemetry_out {
        export_steps_csv(&result.records, path)?;
        info!(path = %path.display(), rows = result.records.len(), "telemetry written");
        eprintln!("Telemetry written to {}", path.display());
    }
    Ok(())
}

fn run_compare(args: &Args, config: &Config, out: &mut impl Write) -> Result<()> {
    let outcomes = compare_scenarios(config)?;
    if args.json {
        let reports: Vec<_> = outcomes.iter().map(|o| (o.kind, o.report)).collect();
        write_json(&reports, &mut *out)?;
    } else {
        writeln!(out, "{}", ComparisonTable(&outcomes))?;
    }
    Ok(())
}

fn run_sweep(args: &Args, config: &Config, out: &mut impl Write) -> Result<()> {
    let results = grid_search(config, &DesignSpace::default())?;
    let best = best_by_roi(&results);
    let fit = SensitivityFit::fit(&results);

    if args.json {
        write_json(&(best, fit, &results), &mut *out)?;
    } else {
        writeln!(out, "--- Design Sweep ({} points) ---", results.len())?;
        match best {
            Some(b) => writeln!(
                out,
                "Best ROI:  {:.2}% with {} station(s), {}, {} kW solar (payback {})",
                b.roi.unwrap_or_default() * 100.0,
                b.point.stations,
                if b.point.battery {
                    format!("{} pack(s)/station", b.point.pack_count)
                } else {
                    "no battery".to_string()
                },
                b.point.solar_kw,
                b.payback
            )?,
            None => writeln!(out, "Best ROI:  n/a")?,
        }
        if let Some(fit) = fit {
            writeln!(out, "\n{fit}")?;
        }
    }

    if let Some(ref path) = args.sweep_out {
        export_sweep_csv(&results, path)?;
        eprintln!("Sweep written to {}", path.display());
    }
    Ok(())
}

fn run_monte_carlo(args: &Args, config: &Config, out: &mut impl Write) -> Result<()> {
    let summary = monte_carlo(config, args.iterations)?;
    if args.json {
        write_json(&summary, &mut *out)?;
    } else {
        match summary {
            Some(s) => writeln!(out, "{s}")?,
            None => writeln!(out, "Monte Carlo: no iterations requested")?,
        }
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    match args.mode {
        Mode::Report => run_report(args, &config, &mut out)?,
        Mode::Compare => run_compare(args, &config, &mut out)?,
        Mode::Sweep => run_sweep(args, &config, &mut out)?,
        Mode::MonteCarlo => run_monte_carlo(args, &config, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
