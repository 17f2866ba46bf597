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

//! # Basis-Execution
//! Normalised private trading interface capable of executing across the venues supported by
//! the Basis arbitrage engine. Also provides a feature rich mock venue to assist with
//! testing and dry-trading. Communicate with a venue by initialising its associated
//! [`ExecutionClient`](client::ExecutionClient) instance.
//!
//! **It is:**
//! * **Normalised**: the strategy communicates with every real or mock venue using the same
//!   [`Order`](order::Order) model.
//! * **Extensible**: venue specifics (request construction, signing, error mapping) live in
//!   per-venue strategy objects registered with the [`client`] factory.

/// Normalised asset balances.
pub mod balance;

/// [`ExecutionClient`](client::ExecutionClient) trait, venue implementations, and the
/// venue-keyed client factory.
pub mod client;

/// All [`Error`](std::error::Error)s generated in Basis-Execution.
pub mod error;

/// Normalised [`Order`](order::Order) model and request types.
pub mod order;

/// Normalised trade (fill) model.
pub mod trade;
