//! # Core Models Module
//!
//! Data structures shared between semigrand moves and the simulation host.
//!
//! ## Key Components
//!
//! - [`ids`] - Species identifiers
//! - [`state`] - The two-valued molecule state label
//! - [`host`] - Capability traits a host implements so moves can flip molecule states
//! - [`mixture`] - A reference lattice host used by the CLI and in tests

pub mod host;
pub mod ids;
pub mod mixture;
pub mod state;
