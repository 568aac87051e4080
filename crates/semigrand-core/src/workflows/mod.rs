//! # Workflows Module
//!
//! Host-side drivers that run complete sampling jobs on top of the [`engine`](crate::engine)
//! moves.
//!
//! - **Sampling** ([`sample`]) - picks a move per trial by its probability, runs the
//!   requested number of trials, calls a checkpoint hook at a fixed interval and stops
//!   early once every Wang-Landau move has annealed below a weight-step threshold.

pub mod sample;
