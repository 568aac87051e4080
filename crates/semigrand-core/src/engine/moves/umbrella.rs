use super::{SemigrandMove, check_table_len, resolve_capacity, restored_capacity};
use crate::core::models::host::SemigrandHost;
use crate::core::models::ids::SpeciesId;
use crate::engine::bias::BiasWeights;
use crate::engine::boundary::BoundaryRange;
use crate::engine::config::MoveConfig;
use crate::engine::error::EngineError;
use crate::engine::report::{self, WEIGHT_TABLE_SUFFIX};
use crate::engine::statistics::MoveStatistics;
use crate::engine::trial::{TrialOutcome, TrialSetup, run_trial};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UmbrellaCheckpoint {
    pub probability: f64,
    pub species_id: SpeciesId,
    pub lower_limit: usize,
    pub upper_limit: usize,
    pub output_file_name: PathBuf,
    pub capacity: usize,
    pub weights: BiasWeights,
    pub statistics: MoveStatistics,
}

/// Semigrand move with a fixed bias table, typically produced by a previous
/// Wang-Landau run. The per-state weights of the species enter the ratio.
#[derive(Debug)]
pub struct UmbrellaSamplingMove {
    config: MoveConfig,
    capacity: usize,
    weights: BiasWeights,
    statistics: MoveStatistics,
}

impl UmbrellaSamplingMove {
    pub const NAME: &'static str = "umbrella";

    #[instrument(level = "debug", skip_all, fields(species = %config.species_id))]
    pub fn new<H: SemigrandHost + ?Sized>(config: MoveConfig, host: &H) -> Result<Self, EngineError> {
        let capacity = resolve_capacity(host, &config)?;
        let weights = BiasWeights::initialize(capacity, config.initial_weights.as_deref())?;
        info!(
            capacity,
            lower = config.range.lower(),
            upper = config.range.upper(),
            seeded = config.initial_weights.is_some(),
            "Umbrella sampling move initialized."
        );
        Ok(Self {
            config,
            capacity,
            weights,
            statistics: MoveStatistics::new(),
        })
    }

    pub fn from_checkpoint<H: SemigrandHost + ?Sized>(
        checkpoint: UmbrellaCheckpoint,
        host: &H,
    ) -> Result<Self, EngineError> {
        let range = BoundaryRange::new(checkpoint.lower_limit, checkpoint.upper_limit)?;
        let capacity = restored_capacity(host, checkpoint.species_id, checkpoint.capacity)?;
        range.check_capacity(capacity)?;
        check_table_len(checkpoint.weights.capacity(), capacity)?;

        Ok(Self {
            config: MoveConfig {
                probability: checkpoint.probability,
                species_id: checkpoint.species_id,
                range,
                output_file_name: checkpoint.output_file_name,
                initial_weights: None,
            },
            capacity,
            weights: checkpoint.weights,
            statistics: checkpoint.statistics,
        })
    }

    pub fn config(&self) -> &MoveConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn trial<H, R>(&mut self, host: &mut H, rng: &mut R) -> Result<TrialOutcome, EngineError>
    where
        H: SemigrandHost + ?Sized,
        R: Rng + ?Sized,
    {
        let setup = TrialSetup {
            species: self.config.species_id,
            range: self.config.range,
            capacity: self.capacity,
            weights: &self.weights,
            use_state_weights: true,
        };
        let outcome = run_trial(host, rng, &setup)?;
        self.statistics.record(outcome.accepted);
        Ok(outcome)
    }

    pub fn write_output(&mut self) -> Result<(), EngineError> {
        let path = report::artifact_path(&self.config.output_file_name, WEIGHT_TABLE_SUFFIX);
        self.weights.write_to_path(&path)?;
        info!(path = %path.display(), "Wrote umbrella weights.");
        Ok(())
    }

    pub fn to_checkpoint(&self) -> UmbrellaCheckpoint {
        UmbrellaCheckpoint {
            probability: self.config.probability,
            species_id: self.config.species_id,
            lower_limit: self.config.range.lower(),
            upper_limit: self.config.range.upper(),
            output_file_name: self.config.output_file_name.clone(),
            capacity: self.capacity,
            weights: self.weights.clone(),
            statistics: self.statistics,
        }
    }
}

impl<H: SemigrandHost + ?Sized> SemigrandMove<H> for UmbrellaSamplingMove {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn probability(&self) -> f64 {
        self.config.probability
    }

    fn species_id(&self) -> SpeciesId {
        self.config.species_id
    }

    fn attempt(&mut self, host: &mut H, rng: &mut dyn RngCore) -> Result<bool, EngineError> {
        self.trial(host, rng).map(|outcome| outcome.accepted)
    }

    fn statistics(&self) -> MoveStatistics {
        self.statistics
    }

    fn weights(&self) -> &BiasWeights {
        &self.weights
    }

    fn output(&mut self) -> Result<(), EngineError> {
        self.write_output()
    }

    fn checkpoint(&self) -> super::MoveCheckpoint {
        super::MoveCheckpoint::Umbrella(self.to_checkpoint())
    }
}
