//! The two semigrand identity-flip moves and their shared setup.

mod umbrella;
mod wang_landau;

pub use umbrella::{UmbrellaCheckpoint, UmbrellaSamplingMove};
pub use wang_landau::{WangLandauCheckpoint, WangLandauMove};

use super::bias::BiasWeights;
use super::config::{ConfigError, MoveConfig};
use super::error::EngineError;
use super::statistics::MoveStatistics;
use crate::core::models::host::SemigrandHost;
use crate::core::models::ids::SpeciesId;
use crate::core::models::state::MoleculeState;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A Monte Carlo move that flips the state label of one molecule per trial.
pub trait SemigrandMove<H: SemigrandHost + ?Sized> {
    fn name(&self) -> &'static str;

    /// Relative selection weight among all moves of a run.
    fn probability(&self) -> f64;

    fn species_id(&self) -> SpeciesId;

    /// Runs one trial against `host`, returning whether it was accepted.
    fn attempt(&mut self, host: &mut H, rng: &mut dyn RngCore) -> Result<bool, EngineError>;

    fn statistics(&self) -> MoveStatistics;

    fn weights(&self) -> &BiasWeights;

    /// Current Wang-Landau step, `None` for moves with a fixed weight table.
    fn weight_step(&self) -> Option<f64> {
        None
    }

    /// Writes the weight table artifact and closes any open log.
    fn output(&mut self) -> Result<(), EngineError>;

    fn checkpoint(&self) -> MoveCheckpoint;
}

/// Persisted state of any move, tagged by move type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MoveCheckpoint {
    WangLandau(WangLandauCheckpoint),
    Umbrella(UmbrellaCheckpoint),
}

impl MoveCheckpoint {
    pub fn species_id(&self) -> SpeciesId {
        match self {
            Self::WangLandau(c) => c.species_id,
            Self::Umbrella(c) => c.species_id,
        }
    }

    /// Rebuilds the move against `host`, checking that the stored table
    /// still fits the species.
    pub fn restore<H: SemigrandHost + ?Sized>(
        self,
        host: &H,
    ) -> Result<Box<dyn SemigrandMove<H>>, EngineError> {
        Ok(match self {
            Self::WangLandau(c) => Box::new(WangLandauMove::from_checkpoint(c, host)?),
            Self::Umbrella(c) => Box::new(UmbrellaSamplingMove::from_checkpoint(c, host)?),
        })
    }
}

/// Weight-table size for `config` on `host`: one entry per possible occupancy.
fn resolve_capacity<H: SemigrandHost + ?Sized>(
    host: &H,
    config: &MoveConfig,
) -> Result<usize, EngineError> {
    let species = config.species_id;
    let mutator = host
        .mutator(species)
        .ok_or(ConfigError::UnsupportedSpecies(species))?;
    let capacity = mutator.capacity() + 1;
    config.range.check_capacity(capacity)?;

    let occupancy = mutator.state_occupancy(MoleculeState::Zero);
    if !config.range.contains(occupancy) {
        warn!(
            %species,
            occupancy,
            lower = config.range.lower(),
            upper = config.range.upper(),
            "Initial occupancy lies outside the sampling range."
        );
    }
    Ok(capacity)
}

/// Checks a restored table size against the host's current species.
fn restored_capacity<H: SemigrandHost + ?Sized>(
    host: &H,
    species: SpeciesId,
    stored: usize,
) -> Result<usize, EngineError> {
    let mutator = host
        .mutator(species)
        .ok_or(ConfigError::UnsupportedSpecies(species))?;
    let capacity = mutator.capacity() + 1;
    if stored != capacity {
        return Err(ConfigError::CapacityMismatch {
            stored,
            host: capacity,
        }
        .into());
    }
    Ok(capacity)
}

fn check_table_len(len: usize, capacity: usize) -> Result<(), EngineError> {
    if len != capacity {
        return Err(ConfigError::CapacityMismatch {
            stored: len,
            host: capacity,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::archive;
    use crate::core::models::mixture::{BinaryMixture, MixtureSpecies};
    use crate::engine::annealing::VisitHistogram;
    use crate::engine::config::MoveConfigBuilder;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    #[test]
    fn checkpoints_of_both_kinds_restore_as_trait_objects() {
        let dir = tempdir().unwrap();
        let mut host = BinaryMixture::new(vec![MixtureSpecies::new(6, 3)]);
        let builder = MoveConfigBuilder::new()
            .probability(1.0)
            .species_id(SpeciesId(0))
            .lower_limit(1)
            .upper_limit(5);

        let wang_landau = WangLandauMove::new(
            builder
                .clone()
                .output_file_name(dir.path().join("wl"))
                .weight_step(2.0)
                .flatness_criteria(0.3)
                .build_wang_landau()
                .unwrap(),
            &host,
        )
        .unwrap();
        let umbrella = UmbrellaSamplingMove::new(
            builder
                .output_file_name(dir.path().join("us"))
                .build()
                .unwrap(),
            &host,
        )
        .unwrap();

        let mut moves: Vec<Box<dyn SemigrandMove<BinaryMixture>>> =
            vec![Box::new(wang_landau), Box::new(umbrella)];
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            for mv in moves.iter_mut() {
                mv.attempt(&mut host, &mut rng).unwrap();
            }
        }

        for mv in &moves {
            let text = archive::to_archive_string(&mv.checkpoint()).unwrap();
            let checkpoint: MoveCheckpoint = archive::from_archive_str(&text).unwrap();
            assert_eq!(checkpoint, mv.checkpoint());

            let restored = checkpoint.restore(&host).unwrap();
            assert_eq!(restored.name(), mv.name());
            assert_eq!(restored.weights(), mv.weights());
            assert_eq!(restored.statistics(), mv.statistics());
            assert_eq!(restored.weight_step(), mv.weight_step());
        }
    }

    /// Tables of five entries with none, one and every index populated.
    fn populated_tables() -> Vec<BiasWeights> {
        let mut one = BiasWeights::zeros(5);
        one.increment(3, 1.5).unwrap();
        let mut every = BiasWeights::zeros(5);
        for (index, weight) in [-2.0, 0.125, 7.25, 1.0e-9, 3.3].into_iter().enumerate() {
            every.increment(index, weight).unwrap();
        }
        vec![BiasWeights::zeros(5), one, every]
    }

    #[test]
    fn sparse_and_dense_tables_survive_the_archive() {
        let dir = tempdir().unwrap();
        let host = BinaryMixture::new(vec![MixtureSpecies::new(4, 2)]);
        let histograms = [
            VisitHistogram::zeros(5),
            VisitHistogram::from_counts(vec![0, 0, 4, 0, 0]),
            VisitHistogram::from_counts(vec![3, 9, 11, 8, 2]),
        ];

        for (weights, histogram) in populated_tables().into_iter().zip(histograms) {
            let checkpoints = [
                MoveCheckpoint::WangLandau(WangLandauCheckpoint {
                    probability: 2.0,
                    species_id: SpeciesId(0),
                    lower_limit: 0,
                    upper_limit: 4,
                    output_file_name: dir.path().join("wl"),
                    weight_step: 1.25,
                    flatness_criteria: 0.1,
                    capacity: 5,
                    weights: weights.clone(),
                    histogram,
                    statistics: MoveStatistics {
                        attempts: 33,
                        accepted: 20,
                    },
                }),
                MoveCheckpoint::Umbrella(UmbrellaCheckpoint {
                    probability: 0.5,
                    species_id: SpeciesId(0),
                    lower_limit: 1,
                    upper_limit: 3,
                    output_file_name: dir.path().join("us"),
                    capacity: 5,
                    weights,
                    statistics: MoveStatistics {
                        attempts: 12,
                        accepted: 7,
                    },
                }),
            ];

            for checkpoint in checkpoints {
                let text = archive::to_archive_string(&checkpoint).unwrap();
                let loaded: MoveCheckpoint = archive::from_archive_str(&text).unwrap();
                assert_eq!(loaded, checkpoint);

                let restored = loaded.restore(&host).unwrap();
                assert_eq!(restored.checkpoint(), checkpoint);
            }
        }
    }

    #[test]
    fn checkpoint_tag_names_the_move_kind() {
        let checkpoint = MoveCheckpoint::Umbrella(UmbrellaCheckpoint {
            probability: 0.5,
            species_id: SpeciesId(2),
            lower_limit: 0,
            upper_limit: 1,
            output_file_name: "us".into(),
            capacity: 2,
            weights: BiasWeights::zeros(2),
            statistics: MoveStatistics::default(),
        });
        let text = archive::to_archive_string(&checkpoint).unwrap();
        assert!(text.contains("type = \"umbrella\""));
        assert_eq!(checkpoint.species_id(), SpeciesId(2));
    }

    #[test]
    fn restore_rejects_a_resized_species() {
        let dir = tempdir().unwrap();
        let host = BinaryMixture::new(vec![MixtureSpecies::new(4, 2)]);
        let config = MoveConfigBuilder::new()
            .probability(1.0)
            .species_id(SpeciesId(0))
            .lower_limit(1)
            .upper_limit(3)
            .output_file_name(dir.path().join("us"))
            .build()
            .unwrap();
        let checkpoint = UmbrellaSamplingMove::new(config, &host)
            .unwrap()
            .to_checkpoint();

        let bigger = BinaryMixture::new(vec![MixtureSpecies::new(6, 2)]);
        let result = MoveCheckpoint::Umbrella(checkpoint).restore(&bigger);
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::CapacityMismatch {
                stored: 5,
                host: 7
            }))
        ));
    }
}
