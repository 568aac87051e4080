//! # Engine Module
//!
//! The semigrand identity-flip Monte Carlo engine: everything between a host
//! that owns molecule states and the artifacts a sampling run leaves behind.
//!
//! ## Architecture
//!
//! A trial is split into small units that communicate through plain values
//! (occupancy, acceptance ratio, flatness verdict):
//!
//! - **Boundaries** ([`boundary`]) - occupancy range, lock detection and the
//!   combinatorial prefactor that restores detailed balance at the limits
//! - **Selection** ([`selector`]) - uniform molecule choice, restricted to one
//!   state when the occupancy sits on a limit
//! - **Acceptance** ([`acceptance`]) - Boltzmann factors and the Metropolis test
//! - **Trial** ([`trial`]) - flip, evaluate, commit or revert
//! - **Bias** ([`bias`]) and **Annealing** ([`annealing`]) - the occupancy weight
//!   table, the visit histogram and the Wang-Landau step schedule
//! - **Moves** ([`moves`]) - Wang-Landau and umbrella sampling engines with their
//!   checkpoint formats
//! - **Configuration** ([`config`]), **Reporting** ([`report`]),
//!   **Statistics** ([`statistics`]), **Progress** ([`progress`]) and
//!   **Errors** ([`error`])

pub mod acceptance;
pub mod annealing;
pub mod bias;
pub mod boundary;
pub mod config;
pub mod error;
pub mod moves;
pub mod progress;
pub mod report;
pub mod selector;
pub mod statistics;
pub mod trial;
