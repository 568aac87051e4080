use super::acceptance::{self, AcceptanceTerms};
use super::bias::BiasWeights;
use super::boundary::{BoundaryCondition, BoundaryRange};
use super::config::ConfigError;
use super::error::EngineError;
use super::selector::select_molecule;
use crate::core::models::host::{SemigrandHost, StateMutator};
use crate::core::models::ids::SpeciesId;
use crate::core::models::state::MoleculeState;
use rand::Rng;
use tracing::trace;

/// Everything one identity-flip trial reads from its owning move.
#[derive(Debug, Clone, Copy)]
pub struct TrialSetup<'a> {
    pub species: SpeciesId,
    pub range: BoundaryRange,
    /// Weight-table size, one more than the species capacity.
    pub capacity: usize,
    pub weights: &'a BiasWeights,
    /// Multiply the ratio by the species' per-state weight ratio.
    pub use_state_weights: bool,
}

/// The result of one completed trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialOutcome {
    pub molecule: usize,
    pub condition: BoundaryCondition,
    pub old_occupancy: usize,
    pub proposed_occupancy: usize,
    /// Occupancy after commit or revert.
    pub final_occupancy: usize,
    pub ratio: f64,
    pub accepted: bool,
}

fn state_mutator<H: SemigrandHost + ?Sized>(
    host: &H,
    species: SpeciesId,
) -> Result<&dyn StateMutator, EngineError> {
    host.mutator(species)
        .ok_or(EngineError::Config(ConfigError::UnsupportedSpecies(species)))
}

fn state_mutator_mut<H: SemigrandHost + ?Sized>(
    host: &mut H,
    species: SpeciesId,
) -> Result<&mut dyn StateMutator, EngineError> {
    host.mutator_mut(species)
        .ok_or(EngineError::Config(ConfigError::UnsupportedSpecies(species)))
}

/// Runs one trial: detect the boundary, select, flip, evaluate, accept or revert.
///
/// On rejection, or on any error after the tentative flip, the selected
/// molecule is restored to its prior state before returning.
pub fn run_trial<H, R>(
    host: &mut H,
    rng: &mut R,
    setup: &TrialSetup<'_>,
) -> Result<TrialOutcome, EngineError>
where
    H: SemigrandHost + ?Sized,
    R: Rng + ?Sized,
{
    let species = setup.species;

    let (old_occupancy, condition, molecule, old_state) = {
        let mutator = state_mutator(&*host, species)?;
        let old_occupancy = mutator.state_occupancy(MoleculeState::Zero);
        let condition = setup.range.classify(old_occupancy);
        let molecule = select_molecule(mutator, species, condition, rng)?;
        (old_occupancy, condition, molecule, mutator.state_of(molecule))
    };
    let new_state = old_state.flipped();

    let old_energy = host.molecule_energy(species, molecule);
    state_mutator_mut(host, species)?.set_state(molecule, new_state);

    let evaluated = evaluate(
        &*host,
        setup,
        molecule,
        old_state,
        old_occupancy,
        condition,
        old_energy,
    );
    let (proposed_occupancy, ratio) = match evaluated {
        Ok(values) => values,
        Err(e) => {
            state_mutator_mut(host, species)?.set_state(molecule, old_state);
            return Err(e);
        }
    };

    let accepted = acceptance::metropolis(ratio, rng);
    if !accepted {
        state_mutator_mut(host, species)?.set_state(molecule, old_state);
    }
    let final_occupancy =
        state_mutator(&*host, species)?.state_occupancy(MoleculeState::Zero);

    trace!(
        %species,
        molecule,
        old_occupancy,
        proposed_occupancy,
        ratio,
        accepted,
        "Identity-flip trial complete."
    );

    Ok(TrialOutcome {
        molecule,
        condition,
        old_occupancy,
        proposed_occupancy,
        final_occupancy,
        ratio,
        accepted,
    })
}

fn evaluate<H: SemigrandHost + ?Sized>(
    host: &H,
    setup: &TrialSetup<'_>,
    molecule: usize,
    old_state: MoleculeState,
    old_occupancy: usize,
    condition: BoundaryCondition,
    old_energy: Option<f64>,
) -> Result<(usize, f64), EngineError> {
    let species = setup.species;
    let new_energy = host.molecule_energy(species, molecule);
    let delta_energy = match (old_energy, new_energy) {
        (Some(old), Some(new)) => new - old,
        _ => 0.0,
    };

    let mutator = state_mutator(&*host, species)?;
    let proposed_occupancy = mutator.state_occupancy(MoleculeState::Zero);
    let state_weight_ratio = if setup.use_state_weights {
        mutator.state_weight(old_state.flipped()) / mutator.state_weight(old_state)
    } else {
        1.0
    };

    let terms = AcceptanceTerms {
        delta_energy,
        delta_weight: setup.weights.get(proposed_occupancy)?
            - setup.weights.get(old_occupancy)?,
        prefactor: condition.combinatorial_prefactor(&setup.range, setup.capacity),
        state_weight_ratio,
    };
    Ok((proposed_occupancy, terms.ratio(host.beta())))
}
