use rand::Rng;

/// The factors that make up a semigrand acceptance ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceTerms {
    /// `E_new - E_old` for the flipped molecule; zero without pair interactions.
    pub delta_energy: f64,
    /// `W(n_new) - W(n_old)` from the bias-weight table.
    pub delta_weight: f64,
    /// Combinatorial prefactor of the pre-trial boundary condition.
    pub prefactor: f64,
    /// `stateWeight(new) / stateWeight(old)`; one for moves that ignore state weights.
    pub state_weight_ratio: f64,
}

impl AcceptanceTerms {
    pub fn ratio(&self, beta: f64) -> f64 {
        boltzmann(beta, self.delta_energy)
            * boltzmann(beta, self.delta_weight)
            * self.prefactor
            * self.state_weight_ratio
    }
}

/// `exp(-beta * x)`.
pub fn boltzmann(beta: f64, x: f64) -> f64 {
    (-beta * x).exp()
}

/// Metropolis test: accepts with probability `min(1, ratio)`.
pub fn metropolis<R: Rng + ?Sized>(ratio: f64, rng: &mut R) -> bool {
    ratio >= 1.0 || rng.r#gen::<f64>() < ratio
}
