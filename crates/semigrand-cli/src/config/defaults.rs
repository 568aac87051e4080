/// Values used when neither the config file nor the command line sets them.
pub struct DefaultsConfig {
    pub trials: u64,
    pub beta: f64,
    pub state_weights: [f64; 2],
    pub checkpoint_file: &'static str,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            trials: 100_000,
            beta: 1.0,
            state_weights: [1.0, 1.0],
            checkpoint_file: "semigrand.chk",
        }
    }
}
