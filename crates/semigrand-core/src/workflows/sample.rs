use crate::core::models::host::SemigrandHost;
use crate::core::models::ids::SpeciesId;
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use crate::engine::moves::SemigrandMove;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::statistics::MoveStatistics;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, info, instrument};

/// A run's moves, in configuration order.
pub type MoveSet<H> = Vec<Box<dyn SemigrandMove<H>>>;

const PROGRESS_UPDATES: u64 = 200;

/// How long to sample and when to stop or checkpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPlan {
    /// Number of trials to run in this invocation.
    pub trials: u64,
    /// Trials already completed by an earlier run that this one resumes.
    pub first_trial: u64,
    /// Invoke the checkpoint hook every this many trials.
    pub checkpoint_interval: Option<u64>,
    /// Stop once every adaptive move's weight step is at or below this value.
    pub min_weight_step: Option<f64>,
}

impl SamplingPlan {
    pub fn new(trials: u64) -> Self {
        Self {
            trials,
            first_trial: 0,
            checkpoint_interval: None,
            min_weight_step: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveSummary {
    pub name: &'static str,
    pub species: SpeciesId,
    pub statistics: MoveStatistics,
    pub weight_step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSummary {
    /// Trials run by this invocation.
    pub trials: u64,
    /// Global trial counter at the end of the run, including `first_trial`.
    pub last_trial: u64,
    /// True if the run stopped on the weight-step threshold.
    pub converged: bool,
    pub moves: Vec<MoveSummary>,
}

/// Samples `host` with `moves`, choosing each trial's move with probability
/// proportional to its configured weight.
///
/// `on_checkpoint` receives the global trial counter together with the host,
/// the moves and the generator, so a restart can resume the same stream. Every move's `output` runs before returning, including after an
/// early stop.
#[instrument(skip_all, name = "sampling_workflow", fields(trials = plan.trials))]
pub fn run<H, R, F>(
    host: &mut H,
    moves: &mut [Box<dyn SemigrandMove<H>>],
    plan: &SamplingPlan,
    rng: &mut R,
    reporter: &ProgressReporter,
    mut on_checkpoint: F,
) -> Result<SamplingSummary, EngineError>
where
    H: SemigrandHost + ?Sized,
    R: Rng,
    F: FnMut(u64, &H, &[Box<dyn SemigrandMove<H>>], &R) -> Result<(), EngineError>,
{
    let selector = move_selector(moves)?;
    let mut weight_steps: Vec<Option<f64>> = moves.iter().map(|m| m.weight_step()).collect();

    reporter.report(Progress::PhaseStart { name: "Sampling" });
    info!(
        moves = moves.len(),
        first_trial = plan.first_trial,
        "Starting semigrand sampling."
    );
    reporter.report(Progress::TaskStart {
        total_steps: plan.trials,
    });

    let report_every = (plan.trials / PROGRESS_UPDATES).max(1);
    let mut pending = 0;
    let mut completed = 0;
    let mut converged = has_converged(&weight_steps, plan.min_weight_step);

    while completed < plan.trials && !converged {
        let index = selector.sample(rng);
        let mv = &mut moves[index];
        mv.attempt(host, rng)?;
        completed += 1;
        pending += 1;
        let trial = plan.first_trial + completed;

        let step = mv.weight_step();
        if step != weight_steps[index] {
            weight_steps[index] = step;
            if let Some(step) = step {
                reporter.report(Progress::Message(format!(
                    "Trial {}: {} move on species {} annealed to weight step {:.6e}",
                    trial,
                    mv.name(),
                    mv.species_id(),
                    step
                )));
            }
            converged = has_converged(&weight_steps, plan.min_weight_step);
        }

        if pending == report_every {
            reporter.report(Progress::TaskIncrement { amount: pending });
            pending = 0;
        }

        if let Some(interval) = plan.checkpoint_interval {
            if interval > 0 && trial % interval == 0 {
                debug!(trial, "Writing checkpoint.");
                on_checkpoint(trial, &*host, &*moves, &*rng)?;
            }
        }
    }

    if pending > 0 {
        reporter.report(Progress::TaskIncrement { amount: pending });
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    if converged {
        info!(
            trials = completed,
            "Every adaptive move reached the weight-step threshold; stopping early."
        );
    }

    reporter.report(Progress::PhaseStart {
        name: "Writing output",
    });
    for mv in moves.iter_mut() {
        mv.output()?;
    }
    reporter.report(Progress::PhaseFinish);

    let summary = SamplingSummary {
        trials: completed,
        last_trial: plan.first_trial + completed,
        converged,
        moves: moves
            .iter()
            .map(|m| MoveSummary {
                name: m.name(),
                species: m.species_id(),
                statistics: m.statistics(),
                weight_step: m.weight_step(),
            })
            .collect(),
    };
    info!(
        trials = summary.trials,
        last_trial = summary.last_trial,
        "Sampling complete."
    );
    Ok(summary)
}

fn move_selector<H: SemigrandHost + ?Sized>(
    moves: &[Box<dyn SemigrandMove<H>>],
) -> Result<WeightedIndex<f64>, EngineError> {
    if moves.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "moves",
            reason: "at least one move is required".to_string(),
        }
        .into());
    }
    WeightedIndex::new(moves.iter().map(|m| m.probability())).map_err(|e| {
        ConfigError::InvalidValue {
            key: "probability",
            reason: format!("move probabilities cannot be used for selection: {}", e),
        }
        .into()
    })
}

fn has_converged(weight_steps: &[Option<f64>], threshold: Option<f64>) -> bool {
    let Some(threshold) = threshold else {
        return false;
    };
    let mut adaptive = weight_steps.iter().flatten().peekable();
    adaptive.peek().is_some() && adaptive.all(|&step| step <= threshold)
}
