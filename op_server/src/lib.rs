//! Registration server library: HTTP API, configuration, logging, metrics.
//!
//! The binary in `main.rs` wires these together; tests build the router
//! directly over an in-memory store.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
