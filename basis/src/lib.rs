#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # Basis
//! Cross-exchange delta-neutral arbitrage engine. Continuously ingests real-time order book
//! state from the configured venues, identifies profitable pricing dislocations net of fees
//! and depth, executes hedged entries in parallel, monitors open positions against
//! profit/loss and time thresholds, and unwinds them.
//!
//! ## Architecture
//! - [`detector`] - continuous scanner computing cross-exchange spreads from the shared
//!   [`MarketDataCache`](basis_data::aggregator::MarketDataCache).
//! - [`manager`] - uniform trading surface over the venues, coordinating parallel order
//!   placement and fill tracking.
//! - [`strategy`] - deterministic state-machine runtime owning the lifecycle of one
//!   arbitrage trade, with crash recovery via context persistence.
//! - [`supervisor`] - spawns and monitors the detector and strategy tasks, drives
//!   cooperative shutdown, and rehydrates unfinished tasks at startup.

/// Operational command line interface.
pub mod cli;

/// Validated engine configuration and `${VAR:default}` environment substitution.
pub mod config;

/// Opportunity detection: scan cycle, spread math, deduplication, scan statistics.
pub mod detector;

/// All top-level [`Error`](std::error::Error)s generated by the engine.
pub mod error;

/// Tracing subscriber initialisation.
pub mod logging;

/// Exchange manager presenting a uniform trading surface over N venues.
pub mod manager;

/// Durable [`TaskContext`](strategy::context::TaskContext) persistence.
pub mod persistence;

/// Strategy task runtime: state machine, handlers, P&L, imbalance correction.
pub mod strategy;

/// Supervisor: task spawning, shutdown, startup recovery.
pub mod supervisor;
