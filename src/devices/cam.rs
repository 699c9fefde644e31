//! Analog CAM array.
//!
//! Each row stores a threshold range per column and matches a query when
//! every active column of the query falls inside its range. Searches are
//! charged to an analog energy model: column drivers, sense amplifiers,
//! precharge, match-line cells, search lines and the query register.
//!
//! # Protocol
//!
//! * `Data` writes query bytes into the data lines at `dst..` and marks
//!   those columns active.
//! * `Request` with `imm == 0` clears the active mask at once. Any other
//!   `imm` occupies the array for `latency` cycles, then emits one match
//!   byte per row on `Output`.

use crate::common::{BusyUnit, Cycle, Event, SimError};
use crate::config::{AnalogConfig, CamConfig};
use crate::sim::logging::{category, TraceMask};
use crate::soc::traits::{Component, Outbox, Port};
use crate::stats::StatSink;

/// Per-access energies derived once from the device constants.
///
/// All energies are expressed in multiples of `junit`.
#[derive(Clone, Debug)]
pub struct EnergyModel {
    pub tclk: f64,
    pub junit: f64,
    /// Column driver energy per active column.
    pub e_dac: f64,
    /// Sense amplifier energy per row.
    pub e_sa: f64,
    /// Precharge energy per row.
    pub e_pc: f64,
    /// Match-line cell energy per row.
    pub e_cam_row: f64,
    /// Dynamic register energy per cycle.
    pub e_reg: f64,
    /// Saturation current of one search-line transistor.
    pub i_max: f64,
    pub vsl: f64,
    pub g_hrs: f64,
    pub g_lrs: f64,
    pub g_list: Vec<f64>,
    pub static_w_reg: f64,
}

impl EnergyModel {
    /// Derives the per-access energies of an array of `rows` x `cols` cells.
    pub fn new(analog: &AnalogConfig, rows: usize, cols: usize, tclk: f64) -> Self {
        let j = analog.junit;
        let swing = (analog.vml - analog.vns).powi(2);
        let rout = tclk / (rows as f64 * analog.cdl) - 0.5 * analog.rw * (rows as f64 - 1.0);
        Self {
            tclk,
            junit: j,
            e_dac: 2.0 * tclk * analog.vdd * analog.vdd / rout / j,
            e_sa: analog.cmlso * swing / j,
            e_pc: analog.cpre * swing / j,
            e_cam_row: analog.cml * cols as f64 * swing / j,
            e_reg: tclk * analog.dynamic_w_reg / j,
            i_max: 0.5 * analog.k1 * (analog.vml - analog.vth).powi(2),
            vsl: analog.vsl,
            g_hrs: analog.g_hrs,
            g_lrs: analog.g_lrs,
            g_list: analog.conductance_table(),
            static_w_reg: analog.static_w_reg,
        }
    }

    fn conductance(&self, index: u8) -> f64 {
        self.g_list.get(index as usize).copied().unwrap_or(0.0)
    }

    /// Search-line energy of one threshold byte.
    ///
    /// The byte is split into nibbles indexing the conductance table. An
    /// inactive low bound leaks through the high-resistance state and an
    /// inactive high bound through the low-resistance state. Both currents
    /// saturate at `i_max`.
    pub fn search_line(&self, low_x: bool, high_x: bool, threshold: u8) -> f64 {
        let (idx_lo, idx_hi) = (threshold % 16, threshold / 16);
        let i_lo = if low_x {
            self.vsl * self.conductance(idx_lo)
        } else {
            self.vsl * self.g_hrs
        };
        let i_hi = if high_x {
            self.vsl * self.conductance(idx_hi)
        } else {
            self.vsl * self.g_lrs
        };
        self.tclk * self.vsl * (i_lo.min(self.i_max) + i_hi.min(self.i_max)) / self.junit
    }

    /// Static register energy over `elapsed_cycles`.
    pub fn static_register(&self, elapsed_cycles: Cycle, rows: usize, cols: usize) -> f64 {
        elapsed_cycles as f64 * self.tclk * self.static_w_reg * (rows + 8 * cols) as f64 / self.junit
    }
}

/// Thresholds of one CAM row.
///
/// `low_x[c]` / `high_x[c]` set means the corresponding bound is active;
/// clear means the bound is a don't-care.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchRow {
    pub low: Vec<u8>,
    pub high: Vec<u8>,
    pub low_x: Vec<bool>,
    pub high_x: Vec<bool>,
}

impl MatchRow {
    /// An unprogrammed row of `cols` columns: every bound is a don't-care.
    pub fn new(cols: usize) -> Self {
        Self {
            low: vec![0; cols],
            high: vec![0; cols],
            low_x: vec![false; cols],
            high_x: vec![false; cols],
        }
    }

    /// Replaces the thresholds. Every slice must hold one entry per column.
    pub fn program(&mut self, low: &[u8], high: &[u8], low_x: &[bool], high_x: &[bool]) -> Result<(), SimError> {
        let cols = self.low.len();
        if [low.len(), high.len(), low_x.len(), high_x.len()].iter().any(|&n| n != cols) {
            return Err(SimError::Topology(format!("CAM row program needs {cols} entries per threshold")));
        }
        self.low = low.to_vec();
        self.high = high.to_vec();
        self.low_x = low_x.to_vec();
        self.high_x = high_x.to_vec();
        Ok(())
    }

    /// True when every active column of `data` lies inside this row's range.
    ///
    /// A column with both bounds active matches `low < data <= high`.
    pub fn is_match(&self, data: &[u8], active: &[bool]) -> bool {
        (0..self.low.len()).all(|col| {
            if !active.get(col).copied().unwrap_or(false) {
                return true;
            }
            let d = data.get(col).copied().unwrap_or(0);
            match (self.low_x[col], self.high_x[col]) {
                (false, false) => true,
                (false, true) => d <= self.high[col],
                (true, false) => self.low[col] < d,
                (true, true) => self.low[col] < d && d <= self.high[col],
            }
        })
    }

    /// Search-line energy of this row for one search, over every column.
    pub fn search_line_energy(&self, model: &EnergyModel) -> f64 {
        (0..self.low.len())
            .map(|col| {
                model.search_line(self.low_x[col], self.high_x[col], self.low[col])
                    + model.search_line(self.low_x[col], self.high_x[col], self.high[col])
            })
            .sum()
    }
}

/// Accumulated energy counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CamEnergy {
    pub cam: f64,
    pub dac: f64,
    pub sa: f64,
    pub pc: f64,
    pub reg: f64,
}

/// A CAM array component.
pub struct CamArray {
    name: String,
    rows: Vec<MatchRow>,
    /// Data lines.
    dl: Vec<u8>,
    /// Active column mask.
    dl_x: Vec<bool>,
    unit: BusyUnit<u32>,
    model: EnergyModel,
    energy: CamEnergy,
    trace: TraceMask,
}

impl CamArray {
    /// Creates an array with every row unprogrammed.
    pub fn new(name: &str, config: &CamConfig, tclk: f64, trace: TraceMask) -> Self {
        let cols = config.num_col;
        Self {
            name: name.to_string(),
            rows: vec![MatchRow::new(cols); config.num_row],
            dl: vec![0; cols],
            dl_x: vec![false; cols],
            unit: BusyUnit::new(config.latency),
            model: EnergyModel::new(&config.analog, config.num_row, cols, tclk),
            energy: CamEnergy::default(),
            trace,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.dl.len()
    }

    /// Programs rows from row-major threshold tables.
    ///
    /// Each table holds `rows * cols` entries; a non-zero don't-care entry
    /// marks the bound active.
    pub fn program(&mut self, low: &[u8], high: &[u8], low_x: &[u8], high_x: &[u8]) -> Result<(), SimError> {
        let cols = self.num_cols();
        let cells = self.rows.len() * cols;
        if [low.len(), high.len(), low_x.len(), high_x.len()].iter().any(|&n| n != cells) {
            return Err(SimError::Topology(format!(
                "{}: thresholds need {} entries ({} rows x {} columns)",
                self.name,
                cells,
                self.rows.len(),
                cols
            )));
        }
        for (r, row) in self.rows.iter_mut().enumerate() {
            let span = r * cols..(r + 1) * cols;
            let lx: Vec<bool> = low_x[span.clone()].iter().map(|&v| v != 0).collect();
            let hx: Vec<bool> = high_x[span.clone()].iter().map(|&v| v != 0).collect();
            row.program(&low[span.clone()], &high[span], &lx, &hx)?;
        }
        Ok(())
    }

    /// Mutable access to one row for direct programming.
    pub fn row_mut(&mut self, row: usize) -> Option<&mut MatchRow> {
        self.rows.get_mut(row)
    }

    pub fn data_lines(&self) -> &[u8] {
        &self.dl
    }

    pub fn active_columns(&self) -> &[bool] {
        &self.dl_x
    }

    pub fn energy(&self) -> CamEnergy {
        self.energy
    }

    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Evaluates every row against the data lines and charges the search.
    ///
    /// # Returns
    ///
    /// One byte per row, 1 on match.
    pub fn search(&mut self) -> Vec<u8> {
        let active = self.dl_x.iter().filter(|&&x| x).count() as f64;
        self.energy.dac += active * self.model.e_dac;
        self.energy.reg += active * 8.0 * self.model.e_reg;

        let mut matches = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            self.energy.cam += self.model.e_cam_row;
            self.energy.sa += self.model.e_sa;
            self.energy.pc += self.model.e_pc;
            self.energy.reg += self.model.e_reg;
            self.energy.cam += row.search_line_energy(&self.model);
            matches.push(row.is_match(&self.dl, &self.dl_x) as u8);
        }
        matches
    }
}

impl Component for CamArray {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> Vec<Port> {
        vec![Port::Request, Port::Data, Port::Output]
    }

    fn tick(&mut self, cycle: Cycle, out: &mut Outbox) -> Result<(), SimError> {
        if let Some(imm) = self.unit.poll(cycle) {
            if imm == 0 {
                self.dl_x.iter_mut().for_each(|x| *x = false);
                if self.trace.allows(category::CAM) {
                    log::trace!(target: "cam", "{}: cycle {} reset active columns", self.name, cycle);
                }
            } else {
                self.unit.start(cycle, imm);
            }
        }

        if self.unit.complete(cycle).is_some() {
            let matches = self.search();
            if self.trace.allows(category::CAM) {
                log::trace!(
                    target: "cam",
                    "{}: cycle {} search {} of {} rows matched",
                    self.name,
                    cycle,
                    matches.iter().filter(|&&m| m != 0).count(),
                    matches.len()
                );
            }
            out.send(Port::Output, Event::core(0, 0, 0, matches));
        }
        Ok(())
    }

    fn handle(&mut self, port: Port, event: Event, cycle: Cycle, _out: &mut Outbox) -> Result<(), SimError> {
        match port {
            Port::Request => {
                self.unit.enqueue(cycle, event.imm());
                Ok(())
            }
            Port::Data => {
                let dst = event.dst() as usize;
                let payload = event.payload();
                let end = dst + payload.len();
                if end > self.dl.len() {
                    return Err(SimError::MemoryOutOfRange {
                        addr: dst as u64,
                        len: payload.len(),
                        size: self.dl.len(),
                    });
                }
                self.dl[dst..end].copy_from_slice(payload);
                self.dl_x[dst..end].iter_mut().for_each(|x| *x = true);
                if self.trace.allows(category::CAM) {
                    log::trace!(target: "cam", "{}: cycle {} data {:?} at column {}", self.name, cycle, payload, dst);
                }
                Ok(())
            }
            _ => Err(SimError::UnexpectedEvent {
                port,
                opcode: event.opcode(),
            }),
        }
    }

    fn finish(&mut self, elapsed_cycles: Cycle, sink: &mut dyn StatSink) {
        self.energy.reg += self
            .model
            .static_register(elapsed_cycles, self.rows.len(), self.dl.len());
        sink.record(&self.name, "energy_cam", self.energy.cam);
        sink.record(&self.name, "energy_dac", self.energy.dac);
        sink.record(&self.name, "energy_sa", self.energy.sa);
        sink.record(&self.name, "energy_pc", self.energy.pc);
        sink.record(&self.name, "energy_reg", self.energy.reg);
    }

    fn is_quiescent(&self) -> bool {
        self.unit.is_idle()
    }
}
