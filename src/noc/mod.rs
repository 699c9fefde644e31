//! On-chip network.
//!
//! Tiles are connected by a tree of routers that broadcast query vectors
//! down to every tile and reduce tile results back up by tag.

/// Router tree node.
pub mod router;

pub use router::Router;
