use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use semigrand::core::io::archive::{self, ArchiveError};
use semigrand::core::models::mixture::BinaryMixture;
use semigrand::engine::error::EngineError;
use semigrand::engine::moves::{MoveCheckpoint, SemigrandMove};
use semigrand::workflows::sample::MoveSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Position of the run's random stream: the generator key plus the number of
/// 32-bit words already consumed. Only stream zero is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeneratorState {
    pub key: [u8; 32],
    pub word_pos: u64,
}

impl GeneratorState {
    pub fn capture(rng: &ChaCha8Rng) -> Result<Self, EngineError> {
        let word_pos = u64::try_from(rng.get_word_pos()).map_err(|_| {
            EngineError::Internal("random stream position exceeds the checkpoint range".into())
        })?;
        Ok(Self {
            key: rng.get_seed(),
            word_pos,
        })
    }

    /// Rebuilds a generator that continues exactly where the captured one stopped.
    pub fn restore(&self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::from_seed(self.key);
        rng.set_word_pos(u128::from(self.word_pos));
        rng
    }
}

/// Everything needed to resume a run: the global trial counter, the random
/// stream position, the host configuration and one checkpoint per move, in
/// configuration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunCheckpoint {
    pub trial: u64,
    pub seed: Option<u64>,
    pub generator: GeneratorState,
    pub system: BinaryMixture,
    pub moves: Vec<MoveCheckpoint>,
}

impl RunCheckpoint {
    pub fn capture(
        trial: u64,
        seed: Option<u64>,
        rng: &ChaCha8Rng,
        system: &BinaryMixture,
        moves: &[Box<dyn SemigrandMove<BinaryMixture>>],
    ) -> Result<Self, EngineError> {
        Ok(Self {
            trial,
            seed,
            generator: GeneratorState::capture(rng)?,
            system: system.clone(),
            moves: moves.iter().map(|m| m.checkpoint()).collect(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ArchiveError> {
        archive::save_archive(self, path)?;
        info!(trial = self.trial, path = %path.display(), "Checkpoint written.");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        archive::load_archive(path)
    }

    /// Rebuilds the host, its moves and the random generator.
    pub fn restore(
        self,
    ) -> Result<(BinaryMixture, MoveSet<BinaryMixture>, ChaCha8Rng), EngineError> {
        let system = self.system;
        let moves = self
            .moves
            .into_iter()
            .map(|m| m.restore(&system))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((system, moves, self.generator.restore()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, RngCore};
    use semigrand::core::models::ids::SpeciesId;
    use semigrand::core::models::mixture::MixtureSpecies;
    use semigrand::engine::config::MoveConfigBuilder;
    use semigrand::engine::moves::WangLandauMove;
    use tempfile::tempdir;

    #[test]
    fn run_checkpoint_round_trips_through_the_archive() {
        let dir = tempdir().unwrap();
        let mut system = BinaryMixture::new(vec![
            MixtureSpecies::new(6, 2),
            MixtureSpecies::new(2, 1).inert(),
        ]);
        let config = MoveConfigBuilder::new()
            .probability(1.0)
            .species_id(SpeciesId(0))
            .lower_limit(1)
            .upper_limit(5)
            .output_file_name(dir.path().join("wl"))
            .weight_step(2.0)
            .flatness_criteria(0.25)
            .build_wang_landau()
            .unwrap();
        let mut moves: MoveSet<BinaryMixture> =
            vec![Box::new(WangLandauMove::new(config, &system).unwrap())];
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for _ in 0..300 {
            moves[0].attempt(&mut system, &mut rng).unwrap();
        }

        let path = dir.path().join("run.chk");
        let saved = RunCheckpoint::capture(300, Some(8), &rng, &system, &moves).unwrap();
        saved.save(&path).unwrap();
        let loaded = RunCheckpoint::load(&path).unwrap();
        assert_eq!(loaded, saved);

        let (restored_system, restored_moves, mut restored_rng) = loaded.restore().unwrap();
        assert_eq!(restored_system, system);
        assert_eq!(restored_moves.len(), 1);
        assert_eq!(restored_moves[0].weights(), moves[0].weights());
        assert_eq!(restored_moves[0].statistics().attempts, 300);
        assert_eq!(restored_rng.next_u64(), rng.next_u64());
    }

    #[test]
    fn restored_generator_continues_the_captured_stream() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..1_001 {
            let _: f64 = rng.r#gen();
        }
        rng.next_u32();

        let state = GeneratorState::capture(&rng).unwrap();
        let text = archive::to_archive_string(&state).unwrap();
        let mut restored = archive::from_archive_str::<GeneratorState>(&text)
            .unwrap()
            .restore();

        let expected: Vec<u64> = (0..16).map(|_| rng.next_u64()).collect();
        let actual: Vec<u64> = (0..16).map(|_| restored.next_u64()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn fresh_generator_starts_at_word_zero() {
        let state = GeneratorState::capture(&ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(state.word_pos, 0);
        let mut fresh = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(state.restore().next_u64(), fresh.next_u64());
    }
}
