use super::boundary::BoundaryCondition;
use super::error::EngineError;
use crate::core::models::host::StateMutator;
use crate::core::models::ids::SpeciesId;
use rand::Rng;
use tracing::trace;

/// Picks one molecule of `species` uniformly at random.
///
/// When `condition` is boundary-locked, the draw is restricted to the
/// molecules currently in the state whose flip moves occupancy back into the
/// range; molecules are scanned in their stable order and the match at a
/// uniformly drawn rank is returned. The species is not modified.
pub fn select_molecule<R: Rng + ?Sized>(
    mutator: &dyn StateMutator,
    species: SpeciesId,
    condition: BoundaryCondition,
    rng: &mut R,
) -> Result<usize, EngineError> {
    let n_molecules = mutator.molecule_count();
    if n_molecules == 0 {
        return Err(EngineError::EmptySpecies { species });
    }

    let Some(state) = condition.flip_source() else {
        return Ok(rng.gen_range(0..n_molecules));
    };

    let n_eligible = mutator.state_occupancy(state);
    if n_eligible == 0 {
        return Err(EngineError::NoEligibleCandidate { species, state });
    }

    let rank = rng.gen_range(0..n_eligible);
    trace!(%species, %state, n_eligible, rank, "Boundary-locked selection.");
    (0..n_molecules)
        .filter(|&i| mutator.state_of(i) == state)
        .nth(rank)
        .ok_or_else(|| {
            EngineError::Internal(format!(
                "species {} reports {} molecules in state {} but fewer were found",
                species, n_eligible, state
            ))
        })
}
