//! Analog CAM Accelerator Simulator CLI.
//!
//! The main executable for the simulator. It loads the configuration and a
//! workload, builds the accelerator, runs it until every component is idle
//! (or the cycle limit is reached), and reports the results that reached
//! the host together with the collected statistics.

use std::process;

use clap::Parser;

use acam_sim::config::Config;
use acam_sim::core::isa::INSTRUCTION_FIELDS;
use acam_sim::sim::loader::Workload;
use acam_sim::sim::logging::{self, TraceMask};
use acam_sim::soc::{self, Fabric};
use acam_sim::stats::SimStats;

/// Command-line arguments for the accelerator simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Analog CAM Accelerator Cycle-Level Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Workload JSON (programs, data images, CAM thresholds, host inputs).
    #[arg(short, long)]
    workload: String,

    /// Overrides `general.max_cycles`.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Writes the statistics as JSON to this path.
    #[arg(long)]
    stats_json: Option<String>,
}

fn print_summary(config: &Config, workload: &Workload) {
    let t = &config.topology;
    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Frequency:          {:.3} GHz", config.general.freq_hz / 1e9);
    println!("  Max Cycles:         {}", config.general.max_cycles);
    println!("  Trace Mask:         {:#x}", config.general.mask);
    println!("Topology:");
    println!("  Router Ports:       {}", t.num_port);
    println!("  Router Levels:      {}", t.num_level);
    println!("  Tiles:              {}", t.num_tiles());
    println!("  Cores per Tile:     {}", t.num_core);
    println!("  Link Latency:       {} / {} (tile / core)", t.link_latency, t.core_link_latency);
    println!("CAM:");
    println!("  Array:              {} rows x {} columns", config.cam.num_row, config.cam.num_col);
    println!("  Latency:            {}", config.cam.latency);
    println!("Workload:");
    println!("  Core Program:       {} instructions", workload.core.instructions.len() / INSTRUCTION_FIELDS);
    println!("  Tile Program:       {} instructions", workload.tile.instructions.len() / INSTRUCTION_FIELDS);
    println!("  Host Inputs:        {}", workload.inputs.len());
    println!("--------------------");
}

fn print_results(fabric: &Fabric) {
    println!("\n[*] {} result(s) reached the host", fabric.sink().len());
    for record in fabric.sink() {
        let payload = record.event.payload();
        let value = acam_sim::common::data::f32_from_le(payload);
        match value {
            Some(v) if payload.len() == 4 => println!(
                "    cycle {:>8}  {}:{:?}  tag {}  value {}",
                record.cycle,
                record.component,
                record.port,
                record.event.imm(),
                v
            ),
            _ => println!(
                "    cycle {:>8}  {}:{:?}  tag {}  {} bytes",
                record.cycle,
                record.component,
                record.port,
                record.event.imm(),
                payload.len()
            ),
        }
    }
}

fn finish(fabric: &mut Fabric, stats: &mut SimStats, stats_json: Option<&str>) {
    stats.cycles = fabric.cycle();
    fabric.finish(stats);
    stats.print();
    if let Some(path) = stats_json {
        if let Err(e) = stats.write_json(path) {
            eprintln!("[!] cannot write statistics: {}", e);
        }
    }
}

/// Main entry point for the accelerator simulator.
///
/// # Behavior
///
/// 1. **Configuration**: Parses arguments, loads and validates the TOML configuration.
/// 2. **Workload**: Loads the workload JSON and builds the fabric from both.
/// 3. **Simulation Loop**: Steps the fabric until quiescent or the cycle limit.
/// 4. **Teardown**: Prints host results and statistics. A fatal simulation error
///    prints the error, dumps the statistics gathered so far and exits with 1.
fn main() {
    let args = Args::parse();

    let mut config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Some(max_cycles) = args.max_cycles {
        config.general.max_cycles = max_cycles;
    }
    if let Err(e) = logging::init(&config.general) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let workload = match Workload::from_file(&args.workload) {
        Ok(workload) => workload,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    print_summary(&config, &workload);

    let trace = TraceMask::new(config.general.mask);
    let mut fabric = match soc::build(&config, &workload, trace) {
        Ok(fabric) => fabric,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut stats = SimStats::new();
    if let Err(e) = fabric.run(config.general.max_cycles) {
        eprintln!("\n[!] FATAL: {}", e);
        finish(&mut fabric, &mut stats, args.stats_json.as_deref());
        process::exit(1);
    }

    println!("\n[*] Simulation finished at cycle {}", fabric.cycle());
    print_results(&fabric);
    finish(&mut fabric, &mut stats, args.stats_json.as_deref());
}
