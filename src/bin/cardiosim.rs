//! Headless simulation driver.
//!
//! Runs the engine against a synthetic clock and prints the vital signs once
//! per simulated second, followed by a summary of the run.
//!
//! Usage:
//!   cargo run --release --bin cardiosim -- [OPTIONS]
//!
//! Options:
//!   --preset <id>        Clinical preset (normal, fa, sinus-tachy, ...)
//!   --rhythm <id>        Override the rhythm (normal, fa, flutter, pvcs, ...)
//!   --duration <s>       Simulated seconds to run (default 30)
//!   --tick <ms>          Tick period in milliseconds (default 10)
//!   --seed <n>           Seed for the random source
//!   --no-baroreflex      Disable baroreflex compensation
//!   --config <path>      Load a JSON engine configuration (serde feature)
//!   --json               Print the final snapshot as JSON (serde feature)
//!
//! Logging is controlled by `RUST_LOG` and defaults to `info`.

use std::process::ExitCode;

use cardiosim::prelude::*;
use cardiosim::CardioError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Options {
    preset: Option<Preset>,
    rhythm: Option<Arrhythmia>,
    duration_s: f64,
    tick_ms: f64,
    seed: Option<u64>,
    baroreflex: bool,
    config: Option<String>,
    json: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preset: None,
            rhythm: None,
            duration_s: 30.0,
            tick_ms: 10.0,
            seed: None,
            baroreflex: true,
            config: None,
            json: false,
        }
    }
}

fn print_help() {
    println!("Usage: cardiosim [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --preset <id>        Clinical preset: {}", ids(&Preset::ALL.map(Preset::id)));
    println!(
        "  --rhythm <id>        Rhythm override: {}",
        ids(&Arrhythmia::ALL.map(Arrhythmia::id))
    );
    println!("  --duration <s>       Simulated seconds to run (default 30)");
    println!("  --tick <ms>          Tick period in milliseconds (default 10)");
    println!("  --seed <n>           Seed for the random source");
    println!("  --no-baroreflex      Disable baroreflex compensation");
    println!("  --config <path>      Load a JSON engine configuration");
    println!("  --json               Print the final snapshot as JSON");
    println!("  --help, -h           Show this help message");
}

fn ids(list: &[&str]) -> String {
    list.join(", ")
}

fn invalid(name: &'static str, message: String) -> CardioError {
    CardioError::InvalidParameter { name, message }
}

fn value<'a>(args: &'a [String], i: usize, flag: &'static str) -> cardiosim::Result<&'a str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| invalid(flag, "Missing value".to_string()))
}

fn parse_number(flag: &'static str, raw: &str) -> cardiosim::Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(invalid(flag, format!("Expected a positive number, got '{raw}'"))),
    }
}

/// Returns `None` when help was requested.
fn parse_args(args: &[String]) -> cardiosim::Result<Option<Options>> {
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--preset" => {
                i += 1;
                opts.preset = Some(value(args, i, "--preset")?.parse()?);
            }
            "--rhythm" => {
                i += 1;
                opts.rhythm = Some(value(args, i, "--rhythm")?.parse()?);
            }
            "--duration" => {
                i += 1;
                opts.duration_s = parse_number("--duration", value(args, i, "--duration")?)?;
            }
            "--tick" => {
                i += 1;
                opts.tick_ms = parse_number("--tick", value(args, i, "--tick")?)?;
            }
            "--seed" => {
                i += 1;
                let raw = value(args, i, "--seed")?;
                opts.seed = Some(
                    raw.parse()
                        .map_err(|_| invalid("--seed", format!("Expected an integer, got '{raw}'")))?,
                );
            }
            "--no-baroreflex" => {
                opts.baroreflex = false;
            }
            "--config" => {
                i += 1;
                opts.config = Some(value(args, i, "--config")?.to_string());
            }
            "--json" => {
                opts.json = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other => {
                return Err(invalid("argument", format!("Unknown option '{other}'")));
            }
        }
        i += 1;
    }

    Ok(Some(opts))
}

#[cfg(feature = "serde")]
fn load_config(path: Option<&str>) -> cardiosim::Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::load_from_file(path, SerializableFormat::Json),
        None => Ok(SimulationConfig::default()),
    }
}

#[cfg(not(feature = "serde"))]
fn load_config(path: Option<&str>) -> cardiosim::Result<SimulationConfig> {
    match path {
        Some(_) => Err(invalid(
            "--config",
            "Configuration files need the `serde` feature".to_string(),
        )),
        None => Ok(SimulationConfig::default()),
    }
}

fn print_vitals(t_s: f64, ind: &Indicators) {
    println!(
        "{t_s:>6.1}s  HR {:>5.1}  SV {:>3}  CO {:>4.1}  BP {:>3}/{:<3} ({:>3})  SpO2 {:>3}%  {}",
        ind.heart_rate,
        ind.stroke_volume,
        ind.cardiac_output,
        ind.systolic_bp,
        ind.diastolic_bp,
        ind.mean_bp,
        ind.spo2,
        ind.rhythm
    );
}

fn run(opts: &Options) -> cardiosim::Result<()> {
    let mut config = load_config(opts.config.as_deref())?;
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }

    let mut model = PhysiologyModel::new(config, 0.0)?;
    info!(seed = model.random().seed(), "engine ready");

    if let Some(preset) = opts.preset {
        model.apply_preset(preset)?;
    }
    model.update_params(ParamUpdate {
        arrhythmia: opts.rhythm,
        baroreflex_enabled: Some(opts.baroreflex),
        ..Default::default()
    })?;

    let end = opts.duration_s * 1000.0;
    let mut cues = HeartSoundCues::new();
    let mut beats = 0u64;
    let mut dropped = 0u64;
    let mut sounds = [0u64; 2];
    let mut next_report = 1000.0;

    let mut step = 0u64;
    loop {
        let now = step as f64 * opts.tick_ms;
        if now > end {
            break;
        }
        if let Some(beat) = model.tick(now)? {
            beats += 1;
            if beat.dropped {
                dropped += 1;
            }
        }
        for sound in cues.poll_model(&model, now) {
            sounds[usize::from(sound == HeartSound::S2)] += 1;
        }
        if now >= next_report {
            print_vitals(now / 1000.0, model.indicators());
            next_report += 1000.0;
        }
        step += 1;
    }

    println!();
    println!("Summary");
    println!("=======");
    println!("  Beats fired:     {beats} ({dropped} not conducted)");
    println!("  Heart sounds:    {} S1, {} S2", sounds[0], sounds[1]);
    println!("  Final HR:        {:.1} bpm", model.params().heart_rate);
    println!("  SpO2 target:     {:.1}%", model.spo2_target());
    println!("  Contractility:   {:.1}%", model.current_contractility());
    println!("  ECG samples:     {}", model.ecg_window().len());

    if opts.json {
        print_snapshot(&model)?;
    }

    Ok(())
}

#[cfg(feature = "serde")]
fn print_snapshot(model: &PhysiologyModel) -> cardiosim::Result<()> {
    println!("{}", model.snapshot().to_json()?);
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn print_snapshot(_model: &PhysiologyModel) -> cardiosim::Result<()> {
    Err(invalid(
        "--json",
        "JSON output needs the `serde` feature".to_string(),
    ))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let opts = match parse_args(&args) {
        Ok(Some(opts)) => opts,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("Run with --help for usage.");
            return ExitCode::FAILURE;
        }
    };

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
