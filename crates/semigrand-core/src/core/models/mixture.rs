use super::host::{SemigrandHost, StateMutator};
use super::ids::SpeciesId;
use super::state::MoleculeState;
use serde::{Deserialize, Serialize};

/// A species of molecules arranged on a ring, each carrying a two-valued state label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpeciesRecord")]
pub struct MixtureSpecies {
    states: Vec<MoleculeState>,
    capacity: usize,
    state_weights: [f64; 2],
    semigrand: bool,
    #[serde(skip_serializing)]
    occupancy: [usize; 2],
}

/// Serialized form of [`MixtureSpecies`]; occupancy counts are rebuilt on load.
#[derive(Deserialize)]
struct SpeciesRecord {
    states: Vec<MoleculeState>,
    capacity: usize,
    state_weights: [f64; 2],
    semigrand: bool,
}

impl From<SpeciesRecord> for MixtureSpecies {
    fn from(record: SpeciesRecord) -> Self {
        let mut species = Self::from_states(record.states)
            .with_capacity(record.capacity)
            .with_state_weights(record.state_weights);
        species.semigrand = record.semigrand;
        species
    }
}

impl MixtureSpecies {
    /// Creates a species of `molecules` molecules whose first `zero_count`
    /// members start in [`MoleculeState::Zero`] and the rest in [`MoleculeState::One`].
    pub fn new(molecules: usize, zero_count: usize) -> Self {
        let states = (0..molecules)
            .map(|i| {
                if i < zero_count {
                    MoleculeState::Zero
                } else {
                    MoleculeState::One
                }
            })
            .collect();
        Self::from_states(states)
    }

    pub fn from_states(states: Vec<MoleculeState>) -> Self {
        let capacity = states.len();
        let mut occupancy = [0; 2];
        for state in &states {
            occupancy[state.index()] += 1;
        }
        Self {
            states,
            capacity,
            state_weights: [1.0, 1.0],
            semigrand: true,
            occupancy,
        }
    }

    pub fn with_state_weights(mut self, weights: [f64; 2]) -> Self {
        self.state_weights = weights;
        self
    }

    /// Raises the capacity above the current population. Values below the
    /// population are ignored.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(self.states.len());
        self
    }

    /// Marks the species as unable to change identity.
    pub fn inert(mut self) -> Self {
        self.semigrand = false;
        self
    }

    pub fn states(&self) -> &[MoleculeState] {
        &self.states
    }

    pub fn is_semigrand(&self) -> bool {
        self.semigrand
    }
}

impl StateMutator for MixtureSpecies {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn molecule_count(&self) -> usize {
        self.states.len()
    }

    fn state_of(&self, molecule: usize) -> MoleculeState {
        self.states[molecule]
    }

    fn set_state(&mut self, molecule: usize, state: MoleculeState) {
        let previous = std::mem::replace(&mut self.states[molecule], state);
        self.occupancy[previous.index()] -= 1;
        self.occupancy[state.index()] += 1;
    }

    fn state_occupancy(&self, state: MoleculeState) -> usize {
        self.occupancy[state.index()]
    }

    fn state_weight(&self, state: MoleculeState) -> f64 {
        self.state_weights[state.index()]
    }
}

/// Nearest-neighbour coupling between molecules adjacent on a species ring.
///
/// `epsilon[a][b]` is the interaction energy of a molecule in state `a` with a
/// neighbour in state `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeighborCoupling {
    pub epsilon: [[f64; 2]; 2],
}

impl NeighborCoupling {
    pub fn new(epsilon: [[f64; 2]; 2]) -> Self {
        Self { epsilon }
    }

    fn molecule_energy(&self, states: &[MoleculeState], molecule: usize) -> f64 {
        let n = states.len();
        if n < 2 {
            return 0.0;
        }
        let own = states[molecule].index();
        let left = states[(molecule + n - 1) % n].index();
        let right = states[(molecule + 1) % n].index();
        self.epsilon[own][left] + self.epsilon[own][right]
    }
}

/// A minimal lattice host: independent species rings with optional
/// nearest-neighbour coupling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMixture {
    beta: f64,
    coupling: Option<NeighborCoupling>,
    species: Vec<MixtureSpecies>,
}

impl BinaryMixture {
    pub fn new(species: Vec<MixtureSpecies>) -> Self {
        Self {
            species,
            coupling: None,
            beta: 1.0,
        }
    }

    pub fn with_coupling(mut self, coupling: NeighborCoupling) -> Self {
        self.coupling = Some(coupling);
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn species(&self, id: SpeciesId) -> Option<&MixtureSpecies> {
        self.species.get(id.index())
    }

    pub fn coupling(&self) -> Option<&NeighborCoupling> {
        self.coupling.as_ref()
    }

    /// Total pair energy of species `id`, counting each ring bond once.
    pub fn total_energy(&self, id: SpeciesId) -> Option<f64> {
        let coupling = self.coupling.as_ref()?;
        let species = self.species(id)?;
        let sum: f64 = (0..species.states.len())
            .map(|i| coupling.molecule_energy(&species.states, i))
            .sum();
        Some(0.5 * sum)
    }
}

impl SemigrandHost for BinaryMixture {
    fn mutator(&self, id: SpeciesId) -> Option<&dyn StateMutator> {
        self.species
            .get(id.index())
            .filter(|s| s.semigrand)
            .map(|s| s as &dyn StateMutator)
    }

    fn mutator_mut(&mut self, id: SpeciesId) -> Option<&mut dyn StateMutator> {
        self.species
            .get_mut(id.index())
            .filter(|s| s.semigrand)
            .map(|s| s as &mut dyn StateMutator)
    }

    fn molecule_energy(&self, id: SpeciesId, molecule: usize) -> Option<f64> {
        let coupling = self.coupling.as_ref()?;
        let species = self.species.get(id.index())?;
        Some(coupling.molecule_energy(&species.states, molecule))
    }

    fn beta(&self) -> f64 {
        self.beta
    }
}
