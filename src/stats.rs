//! Simulation statistics collection and reporting.
//!
//! Components report scalar samples by component name and statistic name
//! when the run finishes. `SimStats` sums samples per key, keeps the
//! simulated cycle count and wall time, and renders a report or JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::{json, Value};

use crate::config::ConfigError;

/// Receiver of statistics samples.
pub trait StatSink {
    /// Adds `value` to the statistic `stat` of `component`.
    fn record(&mut self, component: &str, stat: &str, value: f64);
}

/// Accumulated statistics of one run.
pub struct SimStats {
    start_time: Instant,
    pub cycles: u64,
    values: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            values: BTreeMap::new(),
        }
    }
}

impl StatSink for SimStats {
    fn record(&mut self, component: &str, stat: &str, value: f64) {
        *self
            .values
            .entry(component.to_string())
            .or_default()
            .entry(stat.to_string())
            .or_insert(0.0) += value;
    }
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of one statistic, if it was ever recorded.
    pub fn get(&self, component: &str, stat: &str) -> Option<f64> {
        self.values.get(component)?.get(stat).copied()
    }

    /// Sum of `stat` across every component that recorded it.
    pub fn total(&self, stat: &str) -> f64 {
        self.values.values().filter_map(|stats| stats.get(stat)).sum()
    }

    /// Names of the components that recorded anything, in sorted order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Prints a formatted summary of the run.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let khz = if seconds > 0.0 {
            (self.cycles as f64 / seconds) / 1000.0
        } else {
            0.0
        };

        println!("\n==========================================================");
        println!("CAM ACCELERATOR SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("----------------------------------------------------------");
        println!("TOTALS");
        for stat in [
            "active_fetch",
            "active_decode",
            "active_alu",
            "active_fpu",
            "active_memory",
            "active_cycles",
            "active_mux",
            "energy_cam",
            "energy_dac",
            "energy_sa",
            "energy_pc",
            "energy_reg",
        ] {
            let total = self.total(stat);
            if total != 0.0 {
                println!("  {:<22} {:.4}", stat, total);
            }
        }
        println!("----------------------------------------------------------");
        println!("PER COMPONENT");
        for (component, stats) in &self.values {
            println!("  {}", component);
            for (stat, value) in stats {
                println!("    {:<20} {:.4}", stat, value);
            }
        }
        println!("==========================================================");
    }

    /// Statistics as a JSON document.
    pub fn to_json(&self) -> Value {
        json!({
            "cycles": self.cycles,
            "host_seconds": self.start_time.elapsed().as_secs_f64(),
            "components": self.values,
        })
    }

    /// Writes the JSON document to `path`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(&self.to_json())?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
