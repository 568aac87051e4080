use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a species in the host's species registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub usize);

impl SpeciesId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SpeciesId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}
