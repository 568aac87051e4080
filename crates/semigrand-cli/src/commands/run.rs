use crate::checkpoint::RunCheckpoint;
use crate::cli::RunArgs;
use crate::config::{PartialRunConfig, RunConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use semigrand::core::models::mixture::BinaryMixture;
use semigrand::engine::error::EngineError;
use semigrand::engine::progress::ProgressReporter;
use semigrand::workflows::sample::{self, MoveSet, SamplingSummary};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let partial_config = PartialRunConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));
    let config = partial_config.merge_with_cli(&args, base_dir)?;

    let handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    let summary = execute(config, args.restart.as_deref(), &reporter)?;
    print_summary(&summary);
    Ok(())
}

/// Builds or restores the host and moves, samples, and writes the final
/// checkpoint when one is configured.
pub fn execute(
    config: RunConfig,
    restart: Option<&Path>,
    reporter: &ProgressReporter,
) -> Result<SamplingSummary> {
    let RunConfig {
        system,
        moves: specs,
        mut plan,
        mut seed,
        checkpoint_file,
    } = config;

    let (mut host, mut moves, mut rng): (BinaryMixture, MoveSet<BinaryMixture>, ChaCha8Rng) =
        match restart {
            Some(path) => {
                info!("Restoring system and moves from {:?}", path);
                let checkpoint = RunCheckpoint::load(path).map_err(EngineError::from)?;
                if checkpoint.moves.len() != specs.len() {
                    warn!(
                        stored = checkpoint.moves.len(),
                        configured = specs.len(),
                        "Checkpoint move list differs from the configuration; using the checkpoint."
                    );
                }
                if seed.is_some() && seed != checkpoint.seed {
                    warn!(
                        stored = ?checkpoint.seed,
                        configured = ?seed,
                        "Ignoring the configured seed; continuing the checkpointed random stream."
                    );
                }
                seed = checkpoint.seed;
                plan.first_trial = checkpoint.trial;
                checkpoint.restore()?
            }
            None => {
                let moves = specs
                    .into_iter()
                    .map(|spec| spec.build(&system))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                let rng = match seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                (system, moves, rng)
            }
        };

    println!("Starting semigrand sampling ({} trials)...", plan.trials);
    let summary = sample::run(
        &mut host,
        &mut moves,
        &plan,
        &mut rng,
        reporter,
        |trial, host, moves, rng| {
            if let Some(path) = &checkpoint_file {
                RunCheckpoint::capture(trial, seed, rng, host, moves)?.save(path)?;
            }
            Ok(())
        },
    )?;

    if let Some(path) = &checkpoint_file {
        RunCheckpoint::capture(summary.last_trial, seed, &rng, &host, &moves)?
            .save(path)
            .map_err(EngineError::from)?;
        println!("✓ Final checkpoint written to: {}", path.display());
    }
    Ok(summary)
}

fn print_summary(summary: &SamplingSummary) {
    println!(
        "Completed {} trial(s){}.",
        summary.trials,
        if summary.converged {
            " (weight-step threshold reached)"
        } else {
            ""
        }
    );
    for (i, mv) in summary.moves.iter().enumerate() {
        let step = mv
            .weight_step
            .map(|s| format!(", weight step {:.6e}", s))
            .unwrap_or_default();
        println!(
            "  [{}] {} on species {}: {} attempted, {:.1}% accepted{}",
            i,
            mv.name,
            mv.species,
            mv.statistics.attempts,
            100.0 * mv.statistics.acceptance_rate(),
            step
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use semigrand::engine::moves::MoveCheckpoint;
    use std::fs;
    use tempfile::tempdir;

    fn config_for(dir: &Path, trials: u64) -> RunConfig {
        let content = format!(
            r#"
            [[system.species]]
            molecules = 6
            initial-zero = 3

            [system.coupling]
            epsilon = [[-0.5, 0.0], [0.0, -0.5]]

            [[moves]]
            type = "wang-landau"
            probability = 3.0
            species-id = 0
            lower-limit = 1
            upper-limit = 5
            output-file-name = {wl:?}
            weight-step = 2.0
            flatness-criteria = 0.3

            [[moves]]
            type = "umbrella"
            probability = 1.0
            species-id = 0
            lower-limit = 1
            upper-limit = 5
            output-file-name = {us:?}

            [run]
            trials = {trials}
            seed = 12
            checkpoint-interval = 500
            checkpoint-file = {chk:?}
            "#,
            wl = dir.join("wl"),
            us = dir.join("us"),
            chk = dir.join("run.chk"),
            trials = trials,
        );
        let path = dir.join("run.toml");
        fs::write(&path, content).unwrap();
        let cli = Cli::parse_from(["semigrand", "run", "-c", path.to_str().unwrap()]);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        PartialRunConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, dir)
            .unwrap()
    }

    #[test]
    fn execute_writes_artifacts_and_checkpoint() {
        let dir = tempdir().unwrap();
        let summary =
            execute(config_for(dir.path(), 2_000), None, &ProgressReporter::new()).unwrap();

        assert_eq!(summary.trials, 2_000);
        for artifact in ["wl.dat", "wl.weights", "us.dat", "run.chk"] {
            assert!(dir.path().join(artifact).exists(), "missing {}", artifact);
        }
        let checkpoint = RunCheckpoint::load(&dir.path().join("run.chk")).unwrap();
        assert_eq!(checkpoint.trial, 2_000);
        assert_eq!(checkpoint.moves.len(), 2);
        assert_eq!(checkpoint.seed, Some(12));
    }

    #[test]
    fn restart_continues_the_trial_counter() {
        let dir = tempdir().unwrap();
        execute(config_for(dir.path(), 1_000), None, &ProgressReporter::new()).unwrap();
        let chk = dir.path().join("run.chk");
        assert_eq!(RunCheckpoint::load(&chk).unwrap().trial, 1_000);

        let summary = execute(config_for(dir.path(), 500), Some(&chk), &ProgressReporter::new())
            .unwrap();

        assert_eq!(summary.last_trial, 1_500);
        let attempts: u64 = summary.moves.iter().map(|m| m.statistics.attempts).sum();
        assert_eq!(attempts, 1_500);
        let second = RunCheckpoint::load(&chk).unwrap();
        assert_eq!(second.trial, 1_500);
    }

    #[test]
    fn split_run_reproduces_an_uninterrupted_run() {
        let straight_dir = tempdir().unwrap();
        let straight =
            execute(config_for(straight_dir.path(), 2_000), None, &ProgressReporter::new())
                .unwrap();

        let split_dir = tempdir().unwrap();
        let chk = split_dir.path().join("run.chk");
        execute(config_for(split_dir.path(), 1_000), None, &ProgressReporter::new()).unwrap();
        let split = execute(
            config_for(split_dir.path(), 1_000),
            Some(&chk),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(split.last_trial, 2_000);
        assert_eq!(split.moves, straight.moves);

        let straight_chk = RunCheckpoint::load(&straight_dir.path().join("run.chk")).unwrap();
        let split_chk = RunCheckpoint::load(&chk).unwrap();
        assert_eq!(split_chk.system, straight_chk.system);
        assert_eq!(split_chk.generator, straight_chk.generator);
        let weights = |c: &RunCheckpoint| -> Vec<Vec<f64>> {
            c.moves
                .iter()
                .map(|m| match m {
                    MoveCheckpoint::WangLandau(c) => c.weights.as_slice().to_vec(),
                    MoveCheckpoint::Umbrella(c) => c.weights.as_slice().to_vec(),
                })
                .collect()
        };
        assert_eq!(weights(&split_chk), weights(&straight_chk));
    }
}
