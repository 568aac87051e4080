use super::config::ConfigError;
use crate::core::io::archive::ArchiveError;
use crate::core::io::weights::WeightFileError;
use crate::core::models::ids::SpeciesId;
use crate::core::models::state::MoleculeState;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Species {species} has no molecules to select from")]
    EmptySpecies { species: SpeciesId },

    #[error("No molecule of species {species} is in state {state} although the occupancy is at a boundary")]
    NoEligibleCandidate {
        species: SpeciesId,
        state: MoleculeState,
    },

    #[error("Occupancy {occupancy} is outside the weight table of {capacity} entries")]
    OccupancyOutOfRange { occupancy: usize, capacity: usize },

    #[error("Failed to load initial weights from '{path}': {source}", path = path.display())]
    InitialWeights {
        path: PathBuf,
        #[source]
        source: WeightFileError,
    },

    #[error("Checkpoint archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
