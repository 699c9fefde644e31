//! Log initialisation and trace categories.
//!
//! Messages go through the `log` facade with one target per component
//! family. Detailed per-cycle traces are additionally gated by a bit mask of
//! categories so a run can trace, say, only the CAM without drowning in
//! pipeline output.

use std::fs::{self, File};
use std::path::Path;

use log::LevelFilter;

use crate::config::{ConfigError, GeneralConfig};

/// Trace category bits of `general.mask`.
pub mod category {
    pub const ROUTER: u32 = 1 << 2;
    pub const TILE_RESULT: u32 = 1 << 3;
    pub const DATA: u32 = 1 << 4;
    pub const TILE_PIPELINE: u32 = 1 << 6;
    pub const CORE_PIPELINE: u32 = 1 << 7;
    pub const CAM: u32 = 1 << 8;
    pub const MPE: u32 = 1 << 9;
    pub const MMR: u32 = 1 << 10;
}

/// Enabled trace categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceMask(u32);

impl TraceMask {
    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Every category enabled.
    pub fn all() -> Self {
        Self(u32::MAX)
    }

    /// True when messages of `category` should be emitted.
    ///
    /// The `always-trace` feature forces every category on.
    pub fn allows(self, category: u32) -> bool {
        cfg!(feature = "always-trace") || self.0 & category != 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Maps the configured verbosity to a level filter.
pub fn level_for(verbose: u32) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 | 3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the global logger.
///
/// Logs to `<output_dir>/trace.log` when an output directory is configured,
/// otherwise to stderr. Installing twice is not an error; the first logger
/// stays in place.
pub fn init(general: &GeneralConfig) -> Result<(), ConfigError> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_for(general.verbose));
    builder.format_timestamp(None);

    if !general.output_dir.is_empty() {
        let dir = Path::new(&general.output_dir);
        let io_err = |source| ConfigError::Io {
            path: dir.display().to_string(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_err)?;
        let file = File::create(dir.join("trace.log")).map_err(io_err)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    let _ = builder.try_init();
    Ok(())
}
