//! Analog CAM Accelerator Simulator Library.
//!
//! This crate implements a cycle-level, discrete-event simulator of a
//! compute-in-memory accelerator for vector similarity search. Query
//! vectors are broadcast down a router tree to tiles; each tile fans them
//! out to cells built from an analog CAM array, a match processing element
//! and a match register, all sequenced by small pipelined control cores.
//! Per-tile results are reduced back up the tree.
//!
//! # Architecture
//!
//! * **Controllers**: 5-stage in-order pipeline (Fetch, Decode, Execute, Memory, Writeback)
//!   in two personalities, the per-cell control core and the tile controller.
//! * **Devices**: CAM array with an analog energy model, MPE, MMR.
//! * **Network**: reduction and broadcast routers joined by latency links.
//!
//! # Modules
//!
//! * `common`: Delay queues, events, byte codecs and the fatal error type.
//! * `config`: Configuration loading and validation.
//! * `core`: Controller pipelines.
//! * `devices`: CAM, MPE and MMR models.
//! * `noc`: Router tree nodes.
//! * `sim`: Workload loading and logging.
//! * `soc`: Component interface, event fabric and topology builder.
//! * `stats`: Statistic sinks and reporting.

/// Shared scheduling primitives, events, codecs and errors.
///
/// Provides the delay queue every hardware model schedules work with and
/// the event shapes carried between ports.
pub mod common;

/// Configuration system for topology, timing and device parameters.
///
/// Loads and validates TOML configuration files.
pub mod config;

/// Controller cores including pipeline stages and execution units.
pub mod core;

/// CAM array, match processing element and match register.
pub mod devices;

/// Reduction and broadcast router.
pub mod noc;

/// Workload loading and log configuration.
pub mod sim;

/// Component interface, event fabric and topology construction.
///
/// Implements the cycle loop that ticks every component and delivers
/// events over latency links.
pub mod soc;

/// Statistics collection and reporting.
///
/// Tracks activity counters and energy totals reported by every component.
pub mod stats;
