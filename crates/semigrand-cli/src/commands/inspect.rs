use crate::checkpoint::RunCheckpoint;
use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use semigrand::core::models::host::SemigrandHost;
use semigrand::core::models::state::MoleculeState;
use semigrand::engine::moves::MoveCheckpoint;
use std::fmt::Write;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Loading checkpoint from {:?}", &args.checkpoint);
    let checkpoint = RunCheckpoint::load(&args.checkpoint).map_err(|e| CliError::FileParsing {
        path: args.checkpoint.clone(),
        source: e.into(),
    })?;
    print!("{}", render(&checkpoint, args.weights));
    Ok(())
}

/// Formats a human-readable report of a checkpoint.
pub fn render(checkpoint: &RunCheckpoint, with_weights: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trials completed: {}", checkpoint.trial);
    if let Some(seed) = checkpoint.seed {
        let _ = writeln!(out, "Seed: {}", seed);
    }
    let _ = writeln!(
        out,
        "Random stream position: {} words",
        checkpoint.generator.word_pos
    );

    for (i, mv) in checkpoint.moves.iter().enumerate() {
        let (kind, species, lower, upper, statistics, weights) = match mv {
            MoveCheckpoint::WangLandau(c) => (
                "wang-landau",
                c.species_id,
                c.lower_limit,
                c.upper_limit,
                c.statistics,
                &c.weights,
            ),
            MoveCheckpoint::Umbrella(c) => (
                "umbrella",
                c.species_id,
                c.lower_limit,
                c.upper_limit,
                c.statistics,
                &c.weights,
            ),
        };
        let occupancy = checkpoint
            .system
            .mutator(species)
            .map(|m| m.state_occupancy(MoleculeState::Zero).to_string())
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "[{}] {} species {} range {}..={} occupancy {}",
            i, kind, species, lower, upper, occupancy
        );
        let _ = writeln!(
            out,
            "    {} attempted, {} accepted ({:.1}%)",
            statistics.attempts,
            statistics.accepted,
            100.0 * statistics.acceptance_rate()
        );
        if let MoveCheckpoint::WangLandau(c) = mv {
            let visits: u64 = c.histogram.as_slice().iter().sum();
            let _ = writeln!(
                out,
                "    weight step {:.6e}, flatness {:.4}, {} visits since last anneal",
                c.weight_step, c.flatness_criteria, visits
            );
        }
        if with_weights {
            for (index, weight) in weights.as_slice().iter().enumerate() {
                let _ = writeln!(out, "    {:>6}   {}", index, weight);
            }
        }
    }
    out
}
