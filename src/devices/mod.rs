//! Per-cell devices driven by a control core.
//!
//! A cell chains three devices: the CAM array searches a query and feeds
//! its match vector to the MPE, which accumulates statistics and feeds its
//! decision vector to the MMR, which extracts row indices. Each device
//! accepts one-shot commands on `Request` and is busy for a fixed latency
//! per command.

/// Analog CAM array and energy model.
pub mod cam;

/// Match processing element.
pub mod mpe;

/// Match register.
pub mod mmr;

pub use cam::CamArray;
pub use mmr::Mmr;
pub use mpe::Mpe;
