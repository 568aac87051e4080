use super::{SemigrandMove, check_table_len, resolve_capacity, restored_capacity};
use crate::core::models::host::SemigrandHost;
use crate::core::models::ids::SpeciesId;
use crate::engine::annealing::{FlatnessAnnealer, FlatnessVerdict, VisitHistogram};
use crate::engine::bias::BiasWeights;
use crate::engine::boundary::BoundaryRange;
use crate::engine::config::{AnnealingConfig, MoveConfig, WangLandauConfig};
use crate::engine::error::EngineError;
use crate::engine::report::{self, ANNEALING_LOG_SUFFIX, WEIGHT_TABLE_SUFFIX, WeightLog};
use crate::engine::statistics::MoveStatistics;
use crate::engine::trial::{TrialOutcome, TrialSetup, run_trial};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Every field needed to resume a Wang-Landau move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WangLandauCheckpoint {
    pub probability: f64,
    pub species_id: SpeciesId,
    pub lower_limit: usize,
    pub upper_limit: usize,
    pub output_file_name: PathBuf,
    pub weight_step: f64,
    pub flatness_criteria: f64,
    pub capacity: usize,
    pub weights: BiasWeights,
    pub histogram: VisitHistogram,
    pub statistics: MoveStatistics,
}

/// Semigrand move whose bias weights adapt toward a flat occupancy histogram.
///
/// After every trial the weight at the resulting occupancy grows by
/// `ln(weight_step)`; each time the histogram turns flat the step is annealed
/// and a line is appended to `<output>.weights`.
#[derive(Debug)]
pub struct WangLandauMove {
    config: MoveConfig,
    capacity: usize,
    weights: BiasWeights,
    histogram: VisitHistogram,
    annealer: FlatnessAnnealer,
    statistics: MoveStatistics,
    log: WeightLog,
}

impl WangLandauMove {
    pub const NAME: &'static str = "wang-landau";

    #[instrument(level = "debug", skip_all, fields(species = %config.base.species_id))]
    pub fn new<H: SemigrandHost + ?Sized>(
        config: WangLandauConfig,
        host: &H,
    ) -> Result<Self, EngineError> {
        let WangLandauConfig { base, annealing } = config;
        let capacity = resolve_capacity(host, &base)?;
        let weights = BiasWeights::initialize(capacity, base.initial_weights.as_deref())?;
        let annealer = FlatnessAnnealer::new(annealing);

        let mut log = WeightLog::create(report::artifact_path(
            &base.output_file_name,
            ANNEALING_LOG_SUFFIX,
        ))?;
        log.record(0, annealer.weight_step())?;

        info!(
            capacity,
            lower = base.range.lower(),
            upper = base.range.upper(),
            weight_step = annealing.weight_step,
            flatness_criteria = annealing.flatness_criteria,
            "Wang-Landau move initialized."
        );

        Ok(Self {
            config: base,
            capacity,
            weights,
            histogram: VisitHistogram::zeros(capacity),
            annealer,
            statistics: MoveStatistics::new(),
            log,
        })
    }

    /// Resumes a move; the annealing log is appended to, not truncated.
    pub fn from_checkpoint<H: SemigrandHost + ?Sized>(
        checkpoint: WangLandauCheckpoint,
        host: &H,
    ) -> Result<Self, EngineError> {
        let range = BoundaryRange::new(checkpoint.lower_limit, checkpoint.upper_limit)?;
        let capacity = restored_capacity(host, checkpoint.species_id, checkpoint.capacity)?;
        range.check_capacity(capacity)?;
        check_table_len(checkpoint.weights.capacity(), capacity)?;
        check_table_len(checkpoint.histogram.capacity(), capacity)?;
        let annealer = FlatnessAnnealer::new(AnnealingConfig::new(
            checkpoint.weight_step,
            checkpoint.flatness_criteria,
        )?);

        let log = WeightLog::resume(report::artifact_path(
            &checkpoint.output_file_name,
            ANNEALING_LOG_SUFFIX,
        ));
        info!(
            species = %checkpoint.species_id,
            trials = checkpoint.statistics.attempts,
            weight_step = checkpoint.weight_step,
            "Wang-Landau move restored."
        );

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
            histogram: checkpoint.histogram,
            annealer,
            statistics: checkpoint.statistics,
            log,
        })
    }

    pub fn config(&self) -> &MoveConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn histogram(&self) -> &VisitHistogram {
        &self.histogram
    }

    pub fn current_weight_step(&self) -> f64 {
        self.annealer.weight_step()
    }

    pub fn flatness_criteria(&self) -> f64 {
        self.annealer.flatness_criteria()
    }

    /// Runs one trial and then updates the bias at the resulting occupancy,
    /// whether or not the flip was accepted.
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
            use_state_weights: false,
        };
        let outcome = run_trial(host, rng, &setup)?;
        self.statistics.record(outcome.accepted);
        self.update_bias(outcome.final_occupancy)?;
        Ok(outcome)
    }

    /// Adds one visit at `occupancy` and anneals if the histogram became flat.
    pub fn update_bias(&mut self, occupancy: usize) -> Result<FlatnessVerdict, EngineError> {
        self.weights
            .increment(occupancy, self.annealer.log_increment())?;
        self.histogram.record(occupancy)?;

        let verdict = self.annealer.observe(&mut self.histogram, &self.config.range);
        if let FlatnessVerdict::Annealed { weight_step, .. } = verdict {
            self.log.record(self.statistics.attempts, weight_step)?;
        }
        Ok(verdict)
    }

    /// Closes the annealing log and writes `<output>.dat`.
    pub fn write_output(&mut self) -> Result<(), EngineError> {
        self.log.close()?;
        let path = report::artifact_path(&self.config.output_file_name, WEIGHT_TABLE_SUFFIX);
        self.weights.write_to_path(&path)?;
        info!(path = %path.display(), weight_step = self.annealer.weight_step(), "Wrote Wang-Landau weights.");
        Ok(())
    }

    pub fn to_checkpoint(&self) -> WangLandauCheckpoint {
        WangLandauCheckpoint {
            probability: self.config.probability,
            species_id: self.config.species_id,
            lower_limit: self.config.range.lower(),
            upper_limit: self.config.range.upper(),
            output_file_name: self.config.output_file_name.clone(),
            weight_step: self.annealer.weight_step(),
            flatness_criteria: self.annealer.flatness_criteria(),
            capacity: self.capacity,
            weights: self.weights.clone(),
            histogram: self.histogram.clone(),
            statistics: self.statistics,
        }
    }
}

impl<H: SemigrandHost + ?Sized> SemigrandMove<H> for WangLandauMove {
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

    fn weight_step(&self) -> Option<f64> {
        Some(self.annealer.weight_step())
    }

    fn output(&mut self) -> Result<(), EngineError> {
        self.write_output()
    }

    fn checkpoint(&self) -> super::MoveCheckpoint {
        super::MoveCheckpoint::WangLandau(self.to_checkpoint())
    }
}
