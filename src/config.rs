//! Simulator configuration.
//!
//! The configuration is a TOML document with one table per component
//! family. Every field carries a default so a partial file (or an empty
//! one) yields a runnable system; `validate` rejects values the model
//! cannot simulate.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_FREQ_HZ: f64 = 1.0e9;
const DEFAULT_MAX_CYCLES: u64 = 1_000_000;

const DEFAULT_NUM_PORT: usize = 4;
const DEFAULT_NUM_LEVEL: usize = 1;
const DEFAULT_NUM_CORE: usize = 4;
const DEFAULT_LINK_LATENCY: u64 = 4;
const DEFAULT_CORE_LINK_LATENCY: u64 = 1;

const DEFAULT_CORE_MEMORY: usize = 2048;
const DEFAULT_TILE_MEMORY: usize = 16544;

const DEFAULT_CAM_LATENCY: u64 = 4;
const DEFAULT_NUM_ROW: usize = 256;
const DEFAULT_NUM_COL: usize = 128;

/// Minimum conductance table length: threshold nibbles index it directly.
pub const MIN_CONDUCTANCE_LEVELS: usize = 16;

/// Largest system `validate` accepts, counting routers, tile controllers
/// and every cell component.
pub const MAX_COMPONENTS: usize = 1 << 16;

/// Errors raised while loading configuration or workload files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub topology: TopologyConfig,
    pub core: ControllerConfig,
    #[serde(default = "default_tile_section")]
    pub tile: ControllerConfig,
    pub cam: CamConfig,
    pub mpe: EngineConfig,
    pub mmr: EngineConfig,
    pub router: RouterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            topology: TopologyConfig::default(),
            core: ControllerConfig::default(),
            tile: default_tile_section(),
            cam: CamConfig::default(),
            mpe: EngineConfig::default(),
            mmr: EngineConfig::default(),
            router: RouterConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Clock frequency shared by every component.
    #[serde(default = "default_freq")]
    pub freq_hz: f64,

    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    /// 0 warn, 1 info, 2-3 debug, 4 and above trace.
    #[serde(default)]
    pub verbose: u32,

    /// Bit mask of enabled trace categories.
    #[serde(default)]
    pub mask: u32,

    /// Directory receiving `trace.log`; empty logs to stderr.
    #[serde(default)]
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            freq_hz: default_freq(),
            max_cycles: default_max_cycles(),
            verbose: 0,
            mask: 0,
            output_dir: String::new(),
        }
    }
}

impl GeneralConfig {
    /// Clock period in seconds.
    pub fn tclk(&self) -> f64 {
        1.0 / self.freq_hz
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TopologyConfig {
    /// Children per router.
    #[serde(default = "default_num_port")]
    pub num_port: usize,

    /// Router tree depth; `num_port^num_level` tiles.
    #[serde(default = "default_num_level")]
    pub num_level: usize,

    /// Control cores per tile.
    #[serde(default = "default_num_core")]
    pub num_core: usize,

    /// Latency of router and tile links.
    #[serde(default = "default_link_latency")]
    pub link_latency: u64,

    /// Latency of links inside a tile (tile-core, core-device).
    #[serde(default = "default_core_link_latency")]
    pub core_link_latency: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            num_port: default_num_port(),
            num_level: default_num_level(),
            num_core: default_num_core(),
            link_latency: default_link_latency(),
            core_link_latency: default_core_link_latency(),
        }
    }
}

impl TopologyConfig {
    /// Number of tiles at the leaves of the router tree.
    ///
    /// Saturates at `usize::MAX`; `Config::validate` rejects such trees.
    pub fn num_tiles(&self) -> usize {
        self.checked_num_tiles().unwrap_or(usize::MAX)
    }

    /// Number of routers in the tree, one per internal node.
    pub fn num_routers(&self) -> usize {
        self.checked_num_routers().unwrap_or(usize::MAX)
    }

    /// Total component count: routers, tile controllers, and a core, CAM,
    /// MPE and MMR per cell. `None` on overflow.
    pub fn checked_num_components(&self) -> Option<usize> {
        let tiles = self.checked_num_tiles()?;
        let per_tile = self.num_core.checked_mul(4)?.checked_add(1)?;
        tiles.checked_mul(per_tile)?.checked_add(self.checked_num_routers()?)
    }

    fn checked_num_tiles(&self) -> Option<usize> {
        let level = u32::try_from(self.num_level).ok()?;
        self.num_port.checked_pow(level)
    }

    fn checked_num_routers(&self) -> Option<usize> {
        (0..self.num_level).try_fold(0usize, |total, level| {
            let width = self.num_port.checked_pow(u32::try_from(level).ok()?)?;
            total.checked_add(width)
        })
    }
}

/// Data memory size of a controller personality.
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default = "default_core_memory")]
    pub memory_size: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            memory_size: default_core_memory(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CamConfig {
    #[serde(default = "default_cam_latency")]
    pub latency: u64,

    #[serde(default = "default_num_row")]
    pub num_row: usize,

    #[serde(default = "default_num_col")]
    pub num_col: usize,

    #[serde(default)]
    pub analog: AnalogConfig,
}

impl Default for CamConfig {
    fn default() -> Self {
        Self {
            latency: default_cam_latency(),
            num_row: default_num_row(),
            num_col: default_num_col(),
            analog: AnalogConfig::default(),
        }
    }
}

/// Device constants of the analog CAM energy model (SI units).
#[derive(Debug, Deserialize, Clone)]
pub struct AnalogConfig {
    /// Match-line capacitance per cell.
    #[serde(default = "d_a_cml")]
    pub cml: f64,
    /// Precharge capacitance per row.
    #[serde(default = "d_a_cpre")]
    pub cpre: f64,
    /// Sense-amplifier load capacitance per row.
    #[serde(default = "d_a_cmlso")]
    pub cmlso: f64,
    /// Data-line capacitance per cell.
    #[serde(default = "d_a_cdl")]
    pub cdl: f64,
    /// Wire resistance per cell.
    #[serde(default = "d_a_rw")]
    pub rw: f64,
    /// Transistor gain factor.
    #[serde(default = "d_a_k1")]
    pub k1: f64,
    #[serde(default = "d_a_vth")]
    pub vth: f64,
    #[serde(default = "d_a_vml")]
    pub vml: f64,
    #[serde(default = "d_a_vns")]
    pub vns: f64,
    #[serde(default = "d_a_vsl")]
    pub vsl: f64,
    #[serde(default = "d_a_vdd")]
    pub vdd: f64,
    #[serde(default = "d_a_g_hrs")]
    pub g_hrs: f64,
    #[serde(default = "d_a_g_lrs")]
    pub g_lrs: f64,
    #[serde(default = "d_a_dyn")]
    pub dynamic_w_reg: f64,
    #[serde(default = "d_a_static")]
    pub static_w_reg: f64,
    /// Energy unit the statistics are reported in.
    #[serde(default = "d_a_junit")]
    pub junit: f64,

    /// Explicit conductance table; derived from `g_min`, `g_max`, `g_bit` when absent.
    #[serde(default)]
    pub g_list: Option<Vec<f64>>,
    #[serde(default = "d_a_g_min")]
    pub g_min: f64,
    #[serde(default = "d_a_g_max")]
    pub g_max: f64,
    #[serde(default = "d_a_g_bit")]
    pub g_bit: u32,
}

impl Default for AnalogConfig {
    fn default() -> Self {
        Self {
            cml: d_a_cml(),
            cpre: d_a_cpre(),
            cmlso: d_a_cmlso(),
            cdl: d_a_cdl(),
            rw: d_a_rw(),
            k1: d_a_k1(),
            vth: d_a_vth(),
            vml: d_a_vml(),
            vns: d_a_vns(),
            vsl: d_a_vsl(),
            vdd: d_a_vdd(),
            g_hrs: d_a_g_hrs(),
            g_lrs: d_a_g_lrs(),
            dynamic_w_reg: d_a_dyn(),
            static_w_reg: d_a_static(),
            junit: d_a_junit(),
            g_list: None,
            g_min: d_a_g_min(),
            g_max: d_a_g_max(),
            g_bit: d_a_g_bit(),
        }
    }
}

impl AnalogConfig {
    /// Conductance table indexed by threshold nibble.
    ///
    /// # Returns
    ///
    /// `g_list` if given, otherwise `2^g_bit` evenly spaced levels starting at `g_min`.
    pub fn conductance_table(&self) -> Vec<f64> {
        if let Some(list) = &self.g_list {
            return list.clone();
        }
        let levels = 1usize << self.g_bit.min(16);
        let step = (self.g_max - self.g_min) / levels as f64;
        (0..levels).map(|i| self.g_min + i as f64 * step).collect()
    }
}

/// Latency and row count of a match-processing or match-reduction engine.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_latency")]
    pub latency: u64,

    #[serde(default = "default_num_row")]
    pub num_row: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            latency: default_engine_latency(),
            num_row: default_num_row(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterConfig {
    #[serde(default = "default_engine_latency")]
    pub latency: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            latency: default_engine_latency(),
        }
    }
}

impl Config {
    /// Parses a configuration document and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Rejects configurations the model cannot simulate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Validation(msg));

        if self.general.freq_hz.is_nan() || self.general.freq_hz <= 0.0 {
            return fail(format!("general.freq_hz must be positive, got {}", self.general.freq_hz));
        }

        let t = &self.topology;
        for (name, value) in [
            ("topology.num_port", t.num_port),
            ("topology.num_level", t.num_level),
            ("topology.num_core", t.num_core),
            ("cam.num_row", self.cam.num_row),
            ("cam.num_col", self.cam.num_col),
            ("mpe.num_row", self.mpe.num_row),
            ("mmr.num_row", self.mmr.num_row),
        ] {
            if value == 0 {
                return fail(format!("{name} must be at least 1"));
            }
        }

        for (name, value) in [
            ("topology.link_latency", t.link_latency),
            ("topology.core_link_latency", t.core_link_latency),
            ("cam.latency", self.cam.latency),
            ("mpe.latency", self.mpe.latency),
            ("mmr.latency", self.mmr.latency),
            ("router.latency", self.router.latency),
        ] {
            if value == 0 {
                return fail(format!("{name} must be at least 1 cycle"));
            }
        }

        match t.checked_num_components() {
            Some(n) if n <= MAX_COMPONENTS => {}
            _ => {
                return fail(format!(
                    "topology of {}^{} tiles with {} cores each exceeds {MAX_COMPONENTS} components",
                    t.num_port, t.num_level, t.num_core
                ))
            }
        }

        if self.mpe.num_row != self.cam.num_row || self.mmr.num_row != self.cam.num_row {
            return fail(format!(
                "mpe.num_row ({}) and mmr.num_row ({}) must equal cam.num_row ({})",
                self.mpe.num_row, self.mmr.num_row, self.cam.num_row
            ));
        }

        let levels = self.cam.analog.conductance_table().len();
        if levels < MIN_CONDUCTANCE_LEVELS {
            return fail(format!(
                "conductance table has {levels} levels, at least {MIN_CONDUCTANCE_LEVELS} are required"
            ));
        }

        Ok(())
    }
}

fn default_tile_section() -> ControllerConfig {
    ControllerConfig {
        memory_size: DEFAULT_TILE_MEMORY,
    }
}

fn default_freq() -> f64 {
    DEFAULT_FREQ_HZ
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_num_port() -> usize {
    DEFAULT_NUM_PORT
}

fn default_num_level() -> usize {
    DEFAULT_NUM_LEVEL
}

fn default_num_core() -> usize {
    DEFAULT_NUM_CORE
}

fn default_link_latency() -> u64 {
    DEFAULT_LINK_LATENCY
}

fn default_core_link_latency() -> u64 {
    DEFAULT_CORE_LINK_LATENCY
}

fn default_core_memory() -> usize {
    DEFAULT_CORE_MEMORY
}

fn default_cam_latency() -> u64 {
    DEFAULT_CAM_LATENCY
}

fn default_num_row() -> usize {
    DEFAULT_NUM_ROW
}

fn default_num_col() -> usize {
    DEFAULT_NUM_COL
}

fn default_engine_latency() -> u64 {
    1
}

fn d_a_cml() -> f64 {
    0.2e-15
}

fn d_a_cpre() -> f64 {
    5.0e-15
}

fn d_a_cmlso() -> f64 {
    2.0e-15
}

fn d_a_cdl() -> f64 {
    1.0e-15
}

fn d_a_rw() -> f64 {
    1.0
}

fn d_a_k1() -> f64 {
    1.0e-4
}

fn d_a_vth() -> f64 {
    0.3
}

fn d_a_vml() -> f64 {
    0.8
}

fn d_a_vns() -> f64 {
    0.0
}

fn d_a_vsl() -> f64 {
    0.2
}

fn d_a_vdd() -> f64 {
    0.8
}

fn d_a_g_hrs() -> f64 {
    1.0e-7
}

fn d_a_g_lrs() -> f64 {
    1.0e-4
}

fn d_a_dyn() -> f64 {
    1.0e-6
}

fn d_a_static() -> f64 {
    1.0e-8
}

fn d_a_junit() -> f64 {
    1.0e-15
}

fn d_a_g_min() -> f64 {
    1.0e-6
}

fn d_a_g_max() -> f64 {
    1.0e-4
}

fn d_a_g_bit() -> u32 {
    4
}
