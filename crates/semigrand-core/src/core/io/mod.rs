//! Input/output helpers consumed by the move engines.
//!
//! This module covers the three external formats a semigrand move touches: the
//! human-readable `key value` parameter stream used to configure a move, the
//! two-column occupancy/weight table used for initial and final bias weights,
//! and the TOML checkpoint archive used for exact restarts.

pub mod archive;
pub mod params;
pub mod weights;
