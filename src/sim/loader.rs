//! Workload Loader.
//!
//! A workload is a JSON document produced offline by the model compiler.
//! It carries the programs of both controller personalities, their initial
//! data images, the CAM thresholds of every cell and the vectors the host
//! injects into the root router.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::event::OP_COPY;
use crate::common::SimError;
use crate::config::ConfigError;
use crate::core::isa::{self, Instruction};

/// Instruction table plus initial data memory of one personality.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProgramImage {
    /// Flat table, seven words per instruction.
    pub instructions: Vec<u32>,
    pub data: Vec<u8>,
}

impl ProgramImage {
    /// Splits the flat table into instruction memory.
    pub fn program(&self) -> Result<Vec<Instruction>, SimError> {
        isa::parse_table(&self.instructions)
    }
}

/// Row-major CAM threshold tables; a non-zero `*_x` entry marks the bound active.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub low: Vec<u8>,
    pub high: Vec<u8>,
    pub low_x: Vec<u8>,
    pub high_x: Vec<u8>,
}

/// Per-core overrides.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CoreOverride {
    /// Replaces the shared core data image.
    pub data: Option<Vec<u8>>,
    pub thresholds: Option<Thresholds>,
}

/// Per-tile overrides.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TileOverride {
    /// Tag of this tile's results; defaults to the tile index.
    pub index_class: Option<u32>,
    /// Replaces the shared tile data image.
    pub data: Option<Vec<u8>>,
    pub cores: Vec<CoreOverride>,
}

/// A vector the host delivers to the root router.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HostInput {
    #[serde(default)]
    pub cycle: u64,
    #[serde(default = "default_opcode")]
    pub opcode: u32,
    #[serde(default)]
    pub imm: u32,
    pub payload: Vec<u8>,
}

fn default_opcode() -> u32 {
    OP_COPY
}

/// Complete workload description.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Workload {
    /// Program shared by every control core.
    pub core: ProgramImage,
    /// Program shared by every tile controller.
    pub tile: ProgramImage,
    pub tiles: Vec<TileOverride>,
    pub inputs: Vec<HostInput>,
}

impl Workload {
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads and parses a workload file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn tile_override(&self, tile: usize) -> Option<&TileOverride> {
        self.tiles.get(tile)
    }

    pub fn core_override(&self, tile: usize, core: usize) -> Option<&CoreOverride> {
        self.tile_override(tile)?.cores.get(core)
    }

    /// Result tag of `tile`.
    pub fn index_class(&self, tile: usize) -> u32 {
        self.tile_override(tile)
            .and_then(|t| t.index_class)
            .unwrap_or(tile as u32)
    }

    /// Initial data image of `tile`.
    pub fn tile_data(&self, tile: usize) -> &[u8] {
        self.tile_override(tile)
            .and_then(|t| t.data.as_deref())
            .unwrap_or(&self.tile.data)
    }

    /// Initial data image of `core` in `tile`.
    pub fn core_data(&self, tile: usize, core: usize) -> &[u8] {
        self.core_override(tile, core)
            .and_then(|c| c.data.as_deref())
            .unwrap_or(&self.core.data)
    }
}
