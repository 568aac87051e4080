use super::config::ConfigError;
use crate::core::models::state::MoleculeState;

/// The inclusive occupancy interval `[lower, upper]` a move keeps the species in.
///
/// The interval spans at least two occupancies: every trial changes the
/// occupancy by one, so a single-value range cannot be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryRange {
    lower: usize,
    upper: usize,
}

/// Where the pre-trial occupancy sits relative to the [`BoundaryRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCondition {
    /// Strictly inside the range; any molecule may be flipped.
    Free,
    /// At the lower limit; only a state-one molecule may be flipped.
    AtLower,
    /// At the upper limit; only a state-zero molecule may be flipped.
    AtUpper,
}

impl BoundaryRange {
    pub fn new(lower: usize, upper: usize) -> Result<Self, ConfigError> {
        if upper < lower {
            return Err(ConfigError::InvertedRange { lower, upper });
        }
        if upper == lower {
            return Err(ConfigError::DegenerateRange { limit: lower });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> usize {
        self.lower
    }

    pub fn upper(&self) -> usize {
        self.upper
    }

    /// Number of occupancy values inside the range.
    pub fn bins(&self) -> usize {
        self.upper - self.lower + 1
    }

    pub fn contains(&self, occupancy: usize) -> bool {
        (self.lower..=self.upper).contains(&occupancy)
    }

    /// Verifies the range fits a weight table of `capacity` entries.
    pub fn check_capacity(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.upper >= capacity {
            return Err(ConfigError::LimitOutOfRange {
                limit: self.upper,
                capacity,
            });
        }
        Ok(())
    }

    /// Classifies a pre-trial occupancy.
    pub fn classify(&self, occupancy: usize) -> BoundaryCondition {
        if occupancy == self.lower {
            BoundaryCondition::AtLower
        } else if occupancy == self.upper {
            BoundaryCondition::AtUpper
        } else {
            BoundaryCondition::Free
        }
    }
}

impl BoundaryCondition {
    pub fn is_locked(self) -> bool {
        !matches!(self, BoundaryCondition::Free)
    }

    /// The state a molecule must be in to be eligible for selection, if restricted.
    pub fn flip_source(self) -> Option<MoleculeState> {
        match self {
            BoundaryCondition::Free => None,
            BoundaryCondition::AtLower => Some(MoleculeState::One),
            BoundaryCondition::AtUpper => Some(MoleculeState::Zero),
        }
    }

    /// Detailed-balance correction for a boundary-locked trial.
    ///
    /// `capacity` is the size of the weight table, one more than the maximum
    /// number of molecules in the species.
    pub fn combinatorial_prefactor(self, range: &BoundaryRange, capacity: usize) -> f64 {
        let max_molecules = (capacity - 1) as f64;
        match self {
            BoundaryCondition::Free => 1.0,
            BoundaryCondition::AtLower => (capacity - 1 - range.lower) as f64 / max_molecules,
            BoundaryCondition::AtUpper => range.upper as f64 / max_molecules,
        }
    }
}
