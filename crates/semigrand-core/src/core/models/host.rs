use super::ids::SpeciesId;
use super::state::MoleculeState;

/// Read/write access to the discrete state of every molecule in one species.
///
/// This is the capability a species must offer before a semigrand move can be
/// attached to it. Molecules are addressed by their position in a stable order
/// (`0..molecule_count()`).
pub trait StateMutator {
    /// Maximum number of molecules the species can hold.
    fn capacity(&self) -> usize;

    /// Number of molecules currently present.
    fn molecule_count(&self) -> usize;

    /// Returns the state of the molecule at `molecule`.
    ///
    /// # Panics
    ///
    /// Implementations may panic if `molecule >= self.molecule_count()`.
    fn state_of(&self, molecule: usize) -> MoleculeState;

    /// Sets the state of the molecule at `molecule`, keeping occupancy counts in sync.
    fn set_state(&mut self, molecule: usize, state: MoleculeState);

    /// Number of molecules currently in `state`.
    fn state_occupancy(&self, state: MoleculeState) -> usize;

    /// Intrinsic weight of a chemical state, independent of occupancy.
    fn state_weight(&self, state: MoleculeState) -> f64;
}

/// The slice of a simulation host that semigrand moves consume.
///
/// Hosts expose state mutation through an explicit capability query instead of
/// a downcast: species that cannot change identity simply return `None`.
pub trait SemigrandHost {
    /// Returns the state mutator of species `id`, or `None` if the species does
    /// not exist or does not support identity flips.
    fn mutator(&self, id: SpeciesId) -> Option<&dyn StateMutator>;

    /// Mutable counterpart of [`SemigrandHost::mutator`].
    fn mutator_mut(&mut self, id: SpeciesId) -> Option<&mut dyn StateMutator>;

    /// Pair interaction energy of a single molecule with the rest of the
    /// current configuration.
    ///
    /// Returns `None` when the host carries no pair interaction model, in which
    /// case energy differences are treated as zero.
    fn molecule_energy(&self, id: SpeciesId, molecule: usize) -> Option<f64>;

    /// Inverse temperature used in Boltzmann factors.
    fn beta(&self) -> f64 {
        1.0
    }
}
