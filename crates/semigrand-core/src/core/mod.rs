//! # Core Module
//!
//! Host-facing building blocks for semigrand-ensemble Monte Carlo.
//!
//! ## Architecture
//!
//! - **Host Model** ([`models`]) - Molecule state labels, species identifiers and the
//!   capability traits through which a simulation host lets moves flip molecule states
//! - **File I/O** ([`io`]) - Parameter streams, weight tables and checkpoint archives
//!
//! Nothing in this layer knows about acceptance rules or bias weights; the
//! algorithms live in [`crate::engine`].

pub mod io;
pub mod models;
