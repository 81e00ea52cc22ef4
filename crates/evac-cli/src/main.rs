//! evac — headless driver for the building-evacuation engine.
//!
//! Two subcommands:
//!
//! ```text
//! evac visualize <building.json> [num_firefighters] [fire_weight]
//!                [--seed N] [--max-ticks T] [--tick-log FILE.csv]
//! evac benchmark <building.json> --trials N --output FILE.json
//!                [--fire-weight W] [--firefighters R] [--seed S]
//!                [--max-ticks T] [--lp]
//! ```
//!
//! `visualize` runs one seeded trial printing per-tick progress lines (the
//! pygame-free stand-in for a graphical frontend).  `benchmark` runs N
//! independent trials on the Rayon pool, cycling fire origins across the
//! rooms, and writes a JSON array of per-trial summaries.
//!
//! Exit codes: 0 on success, 1 on config or I/O failure, 2 on usage errors.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use evac_core::VertexKind;
use evac_graph::BuildingConfig;
use evac_model::{ModelConfig, RescueModel};
use evac_sim::Simulation;

const DEFAULT_MAX_TICKS: u64 = 2_000;
const DEFAULT_FIREFIGHTERS: u32 = 2;
const PROGRESS_INTERVAL: u64 = 10;

fn main() {
    let args: Vec<String> = env::args().collect();
    let code = match args.get(1).map(String::as_str) {
        Some("visualize") => report(visualize(&args[2..])),
        Some("benchmark") => report(benchmark(&args[2..])),
        _ => {
            print_usage();
            2
        }
    };
    std::process::exit(code);
}

fn report(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

fn print_usage() {
    println!("evac <command>");
    println!("commands:");
    println!("  visualize <building.json> [num_firefighters] [fire_weight]");
    println!("            [--seed N] [--max-ticks T] [--tick-log FILE.csv]");
    println!("  benchmark <building.json> --trials N --output FILE.json");
    println!("            [--fire-weight W] [--firefighters R] [--seed S]");
    println!("            [--max-ticks T] [--lp]");
}

// ── Trial runner ──────────────────────────────────────────────────────────────

/// One trial's summary row, serialized into the benchmark output.
#[derive(Serialize)]
struct TrialSummary {
    seed: u64,
    fire_origin: String,
    rescued: u32,
    dead: u32,
    total_initial: u32,
    survival_rate: f64,
    time_ticks: u64,
    last_rescue_tick: Option<u64>,
    replan_count: u32,
}

/// Drive one simulation to completion (or the tick cap).  Occupants still in
/// the building at the cap stay in `remaining` — unaccounted, not dead.
fn run_trial(
    config: &BuildingConfig,
    firefighters: u32,
    fire_origin: &str,
    seed: u64,
    model_config: ModelConfig,
    max_ticks: u64,
    mut on_tick: impl FnMut(&Simulation),
) -> Result<(Simulation, RescueModel)> {
    let mut sim = Simulation::new(config, firefighters, fire_origin, seed)
        .with_context(|| format!("starting trial with fire origin `{fire_origin}`"))?;
    let mut model = RescueModel::new(model_config);

    for _ in 0..max_ticks {
        if sim.stats().remaining == 0 {
            break;
        }
        let actions = {
            let snap = sim.read();
            model.decide(&snap)
        };
        sim.update(&actions);
        on_tick(&sim);
    }
    Ok((sim, model))
}

fn summarize(sim: &Simulation, model: &RescueModel, seed: u64, fire_origin: &str) -> TrialSummary {
    let stats = sim.stats();
    let survival_rate = if stats.total_initial > 0 {
        stats.rescued as f64 / stats.total_initial as f64 * 100.0
    } else {
        100.0
    };
    TrialSummary {
        seed,
        fire_origin: fire_origin.to_string(),
        rescued: stats.rescued,
        dead: stats.dead,
        total_initial: stats.total_initial,
        survival_rate,
        time_ticks: stats.tick.0,
        last_rescue_tick: stats.last_rescue_tick.map(|t| t.0),
        replan_count: model.replan_count(),
    }
}

// ── visualize ─────────────────────────────────────────────────────────────────

fn visualize(args: &[String]) -> Result<()> {
    let mut positional = Vec::new();
    let mut seed = 42u64;
    let mut max_ticks = DEFAULT_MAX_TICKS;
    let mut tick_log: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => seed = parse_next(&mut iter, "--seed")?,
            "--max-ticks" => max_ticks = parse_next(&mut iter, "--max-ticks")?,
            "--tick-log" => {
                tick_log = Some(PathBuf::from(
                    iter.next().context("--tick-log needs a file path")?,
                ))
            }
            other => positional.push(other.to_string()),
        }
    }

    let [config_path, rest @ ..] = positional.as_slice() else {
        bail!("visualize needs a building config path");
    };
    let firefighters: u32 = rest
        .first()
        .map(|s| s.parse().context("num_firefighters must be an integer"))
        .transpose()?
        .unwrap_or(DEFAULT_FIREFIGHTERS);
    let fire_weight: f64 = rest
        .get(1)
        .map(|s| s.parse().context("fire_weight must be a number"))
        .transpose()?
        .unwrap_or(0.0);

    let config = BuildingConfig::from_path(Path::new(config_path))
        .with_context(|| format!("loading `{config_path}`"))?;
    let fire_origin = config.fire_params.origin_vertex_id.clone();

    println!("building: {config_path}");
    println!("fire origin: {fire_origin}");
    println!("firefighters: {firefighters}, fire weight: {fire_weight}, seed: {seed}");

    let mut log = match &tick_log {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("opening tick log `{}`", path.display()))?;
            writer.write_record(["tick", "rescued", "dead", "remaining"])?;
            Some(writer)
        }
        None => None,
    };

    let model_config = ModelConfig {
        fire_priority_weight: fire_weight,
        ..Default::default()
    };
    let (sim, model) = run_trial(
        &config,
        firefighters,
        &fire_origin,
        seed,
        model_config,
        max_ticks,
        |sim| {
            let stats = sim.stats();
            if stats.tick.0 % PROGRESS_INTERVAL == 0 {
                println!(
                    "{}: rescued {}, dead {}, remaining {}",
                    stats.tick, stats.rescued, stats.dead, stats.remaining
                );
            }
            if let Some(writer) = &mut log {
                let _ = writer.write_record(&[
                    stats.tick.0.to_string(),
                    stats.rescued.to_string(),
                    stats.dead.to_string(),
                    stats.remaining.to_string(),
                ]);
            }
        },
    )?;

    if let Some(mut writer) = log {
        writer.flush().context("flushing tick log")?;
    }

    let stats = sim.stats();
    println!();
    println!(
        "finished at {} ({:.1} min simulated)",
        stats.tick, stats.time_minutes
    );
    println!(
        "rescued {}/{} ({} dead, {} unaccounted), {} replans",
        stats.rescued,
        stats.total_initial,
        stats.dead,
        stats.remaining,
        model.replan_count()
    );
    Ok(())
}

// ── benchmark ─────────────────────────────────────────────────────────────────

fn benchmark(args: &[String]) -> Result<()> {
    let mut config_path: Option<String> = None;
    let mut trials: usize = 10;
    let mut fire_weight = 0.0f64;
    let mut firefighters = DEFAULT_FIREFIGHTERS;
    let mut base_seed = 0u64;
    let mut max_ticks = DEFAULT_MAX_TICKS;
    let mut use_lp = false;
    let mut output: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--trials" => trials = parse_next(&mut iter, "--trials")?,
            "--fire-weight" => fire_weight = parse_next(&mut iter, "--fire-weight")?,
            "--firefighters" => firefighters = parse_next(&mut iter, "--firefighters")?,
            "--seed" => base_seed = parse_next(&mut iter, "--seed")?,
            "--max-ticks" => max_ticks = parse_next(&mut iter, "--max-ticks")?,
            "--lp" => use_lp = true,
            "--output" => {
                output = Some(PathBuf::from(
                    iter.next().context("--output needs a file path")?,
                ))
            }
            other if config_path.is_none() => config_path = Some(other.to_string()),
            other => bail!("unexpected argument `{other}`"),
        }
    }

    let config_path = config_path.context("benchmark needs a building config path")?;
    let output = output.context("benchmark needs --output FILE.json")?;
    let config = BuildingConfig::from_path(Path::new(&config_path))
        .with_context(|| format!("loading `{config_path}`"))?;

    // Fire origins cycle through the rooms so every trial stresses a
    // different part of the building.
    let rooms: Vec<String> = config
        .vertices
        .iter()
        .filter(|v| v.kind == VertexKind::Room)
        .map(|v| v.id.clone())
        .collect();
    if rooms.is_empty() {
        bail!("config has no rooms to start fires in");
    }

    println!(
        "benchmark: {trials} trials, {firefighters} firefighters, fire weight {fire_weight}, lp {use_lp}"
    );

    let summaries: Vec<TrialSummary> = (0..trials)
        .into_par_iter()
        .map(|i| {
            let seed = base_seed + i as u64;
            let fire_origin = &rooms[i % rooms.len()];
            let model_config = ModelConfig {
                use_lp,
                fire_priority_weight: fire_weight,
                ..Default::default()
            };
            let (sim, model) = run_trial(
                &config,
                firefighters,
                fire_origin,
                seed,
                model_config,
                max_ticks,
                |_| {},
            )?;
            Ok(summarize(&sim, &model, seed, fire_origin))
        })
        .collect::<Result<Vec<_>>>()?;

    let file = File::create(&output)
        .with_context(|| format!("creating `{}`", output.display()))?;
    serde_json::to_writer_pretty(file, &summaries).context("writing benchmark output")?;

    let mean: f64 =
        summaries.iter().map(|s| s.survival_rate).sum::<f64>() / summaries.len().max(1) as f64;
    println!("mean survival rate: {mean:.1}%");
    println!("wrote {} trial summaries to {}", summaries.len(), output.display());
    Ok(())
}

// ── Arg helpers ───────────────────────────────────────────────────────────────

fn parse_next<'a, T: std::str::FromStr>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T> {
    let raw = iter.next().with_context(|| format!("{flag} needs a value"))?;
    raw.parse()
        .ok()
        .with_context(|| format!("invalid value for {flag}: `{raw}`"))
}
