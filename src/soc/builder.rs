//! System-on-Chip (SoC) Builder.
//!
//! This module assembles the accelerator from a configuration and a
//! workload: a tree of routers, a tile controller under every leaf port,
//! and `num_core` cells per tile (a control core driving a CAM, an MPE and
//! an MMR). It also schedules the workload's host inputs on the root.

use crate::common::{Event, SimError};
use crate::config::{Config, TopologyConfig, MAX_COMPONENTS};
use crate::core::isa::Instruction;
use crate::core::{ControlCore, ControlTile};
use crate::devices::{CamArray, Mmr, Mpe};
use crate::noc::Router;
use crate::sim::loader::Workload;
use crate::sim::logging::TraceMask;
use crate::soc::interconnect::Fabric;
use crate::soc::traits::Port;

pub fn router_name(id: usize) -> String {
    format!("Router{id}")
}

/// Name of the root router, where host inputs enter.
///
/// Routers are numbered from the leaf level up, so the root takes the last id.
pub fn root_router_name(topology: &TopologyConfig) -> String {
    router_name(topology.num_routers().saturating_sub(1))
}

pub fn tile_name(tile: usize) -> String {
    format!("Tile{tile}_ctrl")
}

pub fn core_name(tile: usize, core: usize) -> String {
    format!("Tile{tile}Core{core}")
}

pub fn cam_name(tile: usize, core: usize) -> String {
    format!("Tile{tile}CAM{core}")
}

pub fn mpe_name(tile: usize, core: usize) -> String {
    format!("Tile{tile}MPE{core}")
}

pub fn mmr_name(tile: usize, core: usize) -> String {
    format!("Tile{tile}MMR{core}")
}

/// Router ids of each tree level, root first.
///
/// Level `l` (0-based) holds `num_port^l` routers. Ids are handed out from
/// the leaf level up: leaves are `0..num_port^(num_level-1)` and the root
/// is last.
fn router_levels(num_port: usize, num_level: usize) -> Vec<Vec<usize>> {
    let mut levels = vec![Vec::new(); num_level];
    let mut next = 0;
    for (level, ids) in levels.iter_mut().enumerate().rev() {
        let width = num_port.pow(level as u32);
        *ids = (next..next + width).collect();
        next += width;
    }
    levels
}

/// Builds the complete fabric.
///
/// # Arguments
///
/// * `config` - Validated configuration.
/// * `workload` - Programs, data images, CAM thresholds and host inputs.
/// * `trace` - Enabled trace categories.
///
/// # Returns
///
/// A fabric ready to run, with every host input scheduled.
pub fn build(config: &Config, workload: &Workload, trace: TraceMask) -> Result<Fabric, SimError> {
    let topo = &config.topology;
    match topo.checked_num_components() {
        Some(n) if n <= MAX_COMPONENTS => {}
        _ => {
            return Err(SimError::Topology(format!(
                "{}^{} tiles with {} cores each exceeds {MAX_COMPONENTS} components",
                topo.num_port, topo.num_level, topo.num_core
            )))
        }
    }
    let tclk = config.general.tclk();
    let core_program = workload.core.program()?;
    let tile_program = workload.tile.program()?;
    let mut fabric = Fabric::new();

    let levels = router_levels(topo.num_port, topo.num_level);
    for &id in levels.iter().flatten() {
        fabric.add(Box::new(Router::new(&router_name(id), topo.num_port, config.router.latency, trace)))?;
    }
    for pair in levels.windows(2) {
        let (parents, children) = (&pair[0], &pair[1]);
        for (k, &child) in children.iter().enumerate() {
            let parent = router_name(parents[k / topo.num_port]);
            let port = k % topo.num_port;
            let child = router_name(child);
            fabric.connect((parent.as_str(), Port::ToDown(port)), (child.as_str(), Port::FromUp), topo.link_latency)?;
            fabric.connect((child.as_str(), Port::ToUp), (parent.as_str(), Port::FromDown(port)), topo.link_latency)?;
        }
    }

    let leaves = levels
        .last()
        .cloned()
        .ok_or_else(|| SimError::Topology("router tree needs at least one level".to_string()))?;
    for tile in 0..topo.num_tiles() {
        let leaf = router_name(leaves[tile / topo.num_port]);
        let port = tile % topo.num_port;
        let ctrl = tile_name(tile);

        fabric.add(Box::new(ControlTile::new(
            &ctrl,
            tile_program.clone(),
            workload.tile_data(tile),
            config.tile.memory_size,
            topo.num_core,
            workload.index_class(tile),
            trace,
        )))?;
        fabric.connect((leaf.as_str(), Port::ToDown(port)), (ctrl.as_str(), Port::FromRouter), topo.link_latency)?;
        fabric.connect((ctrl.as_str(), Port::ToRouter), (leaf.as_str(), Port::FromDown(port)), topo.link_latency)?;

        for core in 0..topo.num_core {
            add_cell(&mut fabric, config, workload, tile, core, &core_program, tclk, trace)?;
            let name = core_name(tile, core);
            fabric.connect((ctrl.as_str(), Port::ToCore(core)), (name.as_str(), Port::FromTile), topo.core_link_latency)?;
            fabric.connect((name.as_str(), Port::ToTile), (ctrl.as_str(), Port::FromCore(core)), topo.core_link_latency)?;
        }
    }

    let root = root_router_name(topo);
    for input in &workload.inputs {
        let event = Event::network(input.opcode, 0, 0, 0, input.imm, input.payload.clone());
        fabric.inject(input.cycle, &root, Port::FromUp, event)?;
    }

    log::info!(
        target: "fabric",
        "built {} routers, {} tiles, {} cells per tile",
        levels.iter().map(Vec::len).sum::<usize>(),
        topo.num_tiles(),
        topo.num_core
    );
    Ok(fabric)
}

/// Adds one control core with its CAM, MPE and MMR, and wires them.
#[allow(clippy::too_many_arguments)]
fn add_cell(
    fabric: &mut Fabric,
    config: &Config,
    workload: &Workload,
    tile: usize,
    core: usize,
    program: &[Instruction],
    tclk: f64,
    trace: TraceMask,
) -> Result<(), SimError> {
    let latency = config.topology.core_link_latency;
    let (core_n, cam_n, mpe_n, mmr_n) = (
        core_name(tile, core),
        cam_name(tile, core),
        mpe_name(tile, core),
        mmr_name(tile, core),
    );

    let mut cam = CamArray::new(&cam_n, &config.cam, tclk, trace);
    if let Some(t) = workload.core_override(tile, core).and_then(|c| c.thresholds.as_ref()) {
        cam.program(&t.low, &t.high, &t.low_x, &t.high_x)?;
    }

    fabric.add(Box::new(ControlCore::new(
        &core_n,
        program.to_vec(),
        workload.core_data(tile, core),
        config.core.memory_size,
        trace,
    )))?;
    fabric.add(Box::new(cam))?;
    fabric.add(Box::new(Mpe::new(&mpe_n, &config.mpe, trace)))?;
    fabric.add(Box::new(Mmr::new(&mmr_n, &config.mmr, trace)))?;

    for (from, to) in [
        ((&core_n, Port::ToCam), (&cam_n, Port::Request)),
        ((&core_n, Port::ToCamData), (&cam_n, Port::Data)),
        ((&cam_n, Port::Output), (&mpe_n, Port::Data)),
        ((&core_n, Port::ToMpe), (&mpe_n, Port::Request)),
        ((&mpe_n, Port::Response), (&core_n, Port::FromMpe)),
        ((&mpe_n, Port::Output), (&mmr_n, Port::Data)),
        ((&core_n, Port::ToMmr), (&mmr_n, Port::Request)),
        ((&mmr_n, Port::Response), (&core_n, Port::FromMmr)),
    ] {
        fabric.connect((from.0.as_str(), from.1), (to.0.as_str(), to.1), latency)?;
    }
    Ok(())
}
