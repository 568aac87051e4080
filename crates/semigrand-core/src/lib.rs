//! # Semigrand Core Library
//!
//! Semigrand-ensemble Monte Carlo moves that flip the discrete state label of
//! single molecules while biasing the sampled distribution of occupancy, the
//! number of molecules of a species in state zero.
//!
//! Two moves are provided. [`WangLandauMove`](engine::moves::WangLandauMove)
//! learns a bias table that flattens the occupancy histogram, annealing its
//! increment each time the histogram becomes flat.
//! [`UmbrellaSamplingMove`](engine::moves::UmbrellaSamplingMove) samples with a
//! fixed table, usually one produced by a Wang-Landau run.
//!
//! ## Layers
//!
//! - **[`core`]** - the host contract ([`SemigrandHost`](core::models::host::SemigrandHost),
//!   [`StateMutator`](core::models::host::StateMutator)), a reference lattice host
//!   ([`BinaryMixture`](core::models::mixture::BinaryMixture)) and file formats.
//!
//! - **[`engine`]** - the trial algorithm, the two moves, configuration and
//!   persistence.
//!
//! - **[`workflows`]** - the sampling loop that schedules moves, checkpoints and
//!   stops on convergence.

pub mod core;
pub mod engine;
pub mod workflows;
