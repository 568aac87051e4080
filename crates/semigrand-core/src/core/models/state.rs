use serde::{Deserialize, Serialize};
use std::fmt;

/// The discrete internal state of a semigrand molecule.
///
/// Occupancy is always measured as the number of molecules in [`MoleculeState::Zero`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MoleculeState {
    Zero,
    One,
}

impl MoleculeState {
    /// Returns the numeric label (0 or 1) of this state.
    pub fn index(self) -> usize {
        match self {
            MoleculeState::Zero => 0,
            MoleculeState::One => 1,
        }
    }

    /// Returns the other state.
    pub fn flipped(self) -> Self {
        match self {
            MoleculeState::Zero => MoleculeState::One,
            MoleculeState::One => MoleculeState::Zero,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(MoleculeState::Zero),
            1 => Some(MoleculeState::One),
            _ => None,
        }
    }
}

impl From<MoleculeState> for u8 {
    fn from(state: MoleculeState) -> Self {
        state.index() as u8
    }
}

impl TryFrom<u8> for MoleculeState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value as usize)
            .ok_or_else(|| format!("invalid molecule state label {}", value))
    }
}

impl fmt::Display for MoleculeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
