use super::boundary::BoundaryRange;
use crate::core::io::params::{ParamBlock, ParamError};
use crate::core::models::ids::SpeciesId;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sentinel value of `initialWeights` meaning "start from a zero table".
pub const NO_INITIAL_WEIGHTS: &str = "0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Boundary range is inverted: lower limit {lower} exceeds upper limit {upper}")]
    InvertedRange { lower: usize, upper: usize },

    #[error("Boundary range collapses to the single occupancy {limit}; a flip always leaves it")]
    DegenerateRange { limit: usize },

    #[error("Occupancy limit {limit} does not fit a weight table of {capacity} entries")]
    LimitOutOfRange { limit: usize, capacity: usize },

    #[error("Species {0} does not exist or does not support state mutation")]
    UnsupportedSpecies(SpeciesId),

    #[error("Checkpoint capacity {stored} does not match host capacity {host}")]
    CapacityMismatch { stored: usize, host: usize },

    #[error("Malformed parameter stream: {0}")]
    Params(#[from] ParamError),
}

/// Settings shared by every semigrand move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveConfig {
    pub probability: f64,
    pub species_id: SpeciesId,
    pub range: BoundaryRange,
    pub output_file_name: PathBuf,
    pub initial_weights: Option<PathBuf>,
}

/// Wang-Landau annealing schedule parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealingConfig {
    pub weight_step: f64,
    pub flatness_criteria: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WangLandauConfig {
    pub base: MoveConfig,
    pub annealing: AnnealingConfig,
}

const KNOWN_KEYS: [&str; 8] = [
    "probability",
    "speciesId",
    "upperLimit",
    "lowerLimit",
    "outputFileName",
    "initialWeights",
    "weightStep",
    "flatnessCriteria",
];

#[derive(Default, Debug, Clone)]
pub struct MoveConfigBuilder {
    probability: Option<f64>,
    species_id: Option<SpeciesId>,
    upper_limit: Option<usize>,
    lower_limit: Option<usize>,
    output_file_name: Option<PathBuf>,
    initial_weights: Option<PathBuf>,
    weight_step: Option<f64>,
    flatness_criteria: Option<f64>,
}

impl MoveConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills a builder from a `key value` parameter block.
    ///
    /// Recognized keys are `probability`, `speciesId`, `upperLimit`,
    /// `lowerLimit`, `outputFileName`, `initialWeights`, `weightStep` and
    /// `flatnessCriteria`. Any other key is rejected.
    pub fn from_params(block: &ParamBlock) -> Result<Self, ConfigError> {
        if let Some(unknown) = block.keys().find(|k| !KNOWN_KEYS.contains(k)) {
            return Err(ConfigError::UnknownParameter(unknown.to_string()));
        }

        let mut builder = Self::new();
        builder.probability = block.get("probability")?;
        builder.species_id = block.get::<usize>("speciesId")?.map(SpeciesId);
        builder.upper_limit = block.get("upperLimit")?;
        builder.lower_limit = block.get("lowerLimit")?;
        builder.output_file_name = block.raw("outputFileName").map(PathBuf::from);
        builder.initial_weights = block
            .raw("initialWeights")
            .filter(|v| *v != NO_INITIAL_WEIGHTS)
            .map(PathBuf::from);
        builder.weight_step = block.get("weightStep")?;
        builder.flatness_criteria = block.get("flatnessCriteria")?;
        Ok(builder)
    }

    pub fn probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }
    pub fn species_id(mut self, id: SpeciesId) -> Self {
        self.species_id = Some(id);
        self
    }
    pub fn upper_limit(mut self, limit: usize) -> Self {
        self.upper_limit = Some(limit);
        self
    }
    pub fn lower_limit(mut self, limit: usize) -> Self {
        self.lower_limit = Some(limit);
        self
    }
    pub fn output_file_name(mut self, name: impl Into<PathBuf>) -> Self {
        self.output_file_name = Some(name.into());
        self
    }
    pub fn initial_weights(mut self, path: Option<PathBuf>) -> Self {
        self.initial_weights = path;
        self
    }
    pub fn weight_step(mut self, step: f64) -> Self {
        self.weight_step = Some(step);
        self
    }
    pub fn flatness_criteria(mut self, criteria: f64) -> Self {
        self.flatness_criteria = Some(criteria);
        self
    }

    /// Joins a relative initial-weights path onto `base`.
    pub fn resolve_initial_weights(mut self, base: &Path) -> Self {
        self.initial_weights = self.initial_weights.map(|p| base.join(p));
        self
    }

    pub fn build(self) -> Result<MoveConfig, ConfigError> {
        let probability = self
            .probability
            .ok_or(ConfigError::MissingParameter("probability"))?;
        if !(probability >= 0.0 && probability.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "probability",
                reason: format!("must be a finite non-negative number, got {}", probability),
            });
        }
        let species_id = self
            .species_id
            .ok_or(ConfigError::MissingParameter("speciesId"))?;
        let upper = self
            .upper_limit
            .ok_or(ConfigError::MissingParameter("upperLimit"))?;
        let lower = self
            .lower_limit
            .ok_or(ConfigError::MissingParameter("lowerLimit"))?;
        let range = BoundaryRange::new(lower, upper)?;
        let output_file_name = self
            .output_file_name
            .ok_or(ConfigError::MissingParameter("outputFileName"))?;

        Ok(MoveConfig {
            probability,
            species_id,
            range,
            output_file_name,
            initial_weights: self.initial_weights,
        })
    }

    /// Builds an umbrella-sampling config, whose weight table never adapts.
    pub fn build_umbrella(self) -> Result<MoveConfig, ConfigError> {
        let annealing_key = if self.weight_step.is_some() {
            Some("weightStep")
        } else if self.flatness_criteria.is_some() {
            Some("flatnessCriteria")
        } else {
            None
        };
        if let Some(key) = annealing_key {
            return Err(ConfigError::InvalidValue {
                key,
                reason: "umbrella moves take no weight-step or flatness-criteria".to_string(),
            });
        }
        self.build()
    }

    pub fn build_wang_landau(self) -> Result<WangLandauConfig, ConfigError> {
        let weight_step = self
            .weight_step
            .ok_or(ConfigError::MissingParameter("weightStep"))?;
        let flatness_criteria = self
            .flatness_criteria
            .ok_or(ConfigError::MissingParameter("flatnessCriteria"))?;
        let annealing = AnnealingConfig::new(weight_step, flatness_criteria)?;
        Ok(WangLandauConfig {
            base: self.build()?,
            annealing,
        })
    }
}

impl AnnealingConfig {
    pub fn new(weight_step: f64, flatness_criteria: f64) -> Result<Self, ConfigError> {
        if !(weight_step > 0.0 && weight_step.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "weightStep",
                reason: format!("must be a finite positive number, got {}", weight_step),
            });
        }
        if !(flatness_criteria > 0.0 && flatness_criteria.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: "flatnessCriteria",
                reason: format!("must be a finite positive number, got {}", flatness_criteria),
            });
        }
        Ok(Self {
            weight_step,
            flatness_criteria,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wang_landau_block() -> ParamBlock {
        ParamBlock::parse_str(
            "probability 0.25\n\
             speciesId 1\n\
             upperLimit 8\n\
             lowerLimit 2\n\
             outputFileName wl\n\
             weightStep 2.718281828\n\
             flatnessCriteria 0.2\n\
             initialWeights 0\n",
        )
        .unwrap()
    }

    #[test]
    fn from_params_builds_wang_landau_config() {
        let config = MoveConfigBuilder::from_params(&wang_landau_block())
            .unwrap()
            .build_wang_landau()
            .unwrap();
        assert_eq!(config.base.probability, 0.25);
        assert_eq!(config.base.species_id, SpeciesId(1));
        assert_eq!(config.base.range, BoundaryRange::new(2, 8).unwrap());
        assert_eq!(config.base.output_file_name, PathBuf::from("wl"));
        assert_eq!(config.base.initial_weights, None);
        assert_eq!(config.annealing.weight_step, 2.718281828);
        assert_eq!(config.annealing.flatness_criteria, 0.2);
    }

    #[test]
    fn initial_weights_path_other_than_sentinel_is_kept() {
        let block = ParamBlock::parse_str(
            "probability 1\nspeciesId 0\nupperLimit 3\nlowerLimit 1\noutputFileName us\ninitialWeights w.dat\n",
        )
        .unwrap();
        let config = MoveConfigBuilder::from_params(&block)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.initial_weights, Some(PathBuf::from("w.dat")));
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let block = ParamBlock::parse_str("probability 1\nspeciesId 0\nupperLimit 3\n").unwrap();
        let result = MoveConfigBuilder::from_params(&block).unwrap().build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("lowerLimit"))
        ));
    }

    #[test]
    fn wang_landau_requires_annealing_keys() {
        let block = ParamBlock::parse_str(
            "probability 1\nspeciesId 0\nupperLimit 3\nlowerLimit 1\noutputFileName wl\nweightStep 2.0\n",
        )
        .unwrap();
        let result = MoveConfigBuilder::from_params(&block)
            .unwrap()
            .build_wang_landau();
        assert!(matches!(
            result,
            Err(ConfigError::MissingParameter("flatnessCriteria"))
        ));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let block = ParamBlock::parse_str("probability 1\nstepSize 0.1\n").unwrap();
        let result = MoveConfigBuilder::from_params(&block);
        assert!(matches!(result, Err(ConfigError::UnknownParameter(k)) if k == "stepSize"));
    }

    #[test]
    fn inverted_limits_fail_at_build_time() {
        let result = MoveConfigBuilder::new()
            .probability(1.0)
            .species_id(SpeciesId(0))
            .upper_limit(2)
            .lower_limit(4)
            .output_file_name("us")
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvertedRange { lower: 4, upper: 2 })
        ));
    }

    #[test]
    fn umbrella_build_rejects_annealing_parameters() {
        let block = ParamBlock::parse_str(
            "probability 1\nspeciesId 0\nupperLimit 4\nlowerLimit 1\noutputFileName us\nflatnessCriteria 0.2\n",
        )
        .unwrap();
        let result = MoveConfigBuilder::from_params(&block)
            .unwrap()
            .build_umbrella();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: "flatnessCriteria",
                ..
            })
        ));
    }

    #[test]
    fn relative_initial_weights_are_joined_onto_the_base() {
        let config = MoveConfigBuilder::new()
            .probability(1.0)
            .species_id(SpeciesId(0))
            .upper_limit(4)
            .lower_limit(1)
            .output_file_name("us")
            .initial_weights(Some(PathBuf::from("w.dat")))
            .resolve_initial_weights(Path::new("/runs/a"))
            .build_umbrella()
            .unwrap();
        assert_eq!(config.initial_weights, Some(PathBuf::from("/runs/a/w.dat")));

        let config = MoveConfigBuilder::new()
            .initial_weights(Some(PathBuf::from("/abs/w.dat")))
            .resolve_initial_weights(Path::new("/runs/a"));
        assert_eq!(config.initial_weights, Some(PathBuf::from("/abs/w.dat")));
    }

    #[test]
    fn equal_limits_fail_at_build_time() {
        let result = MoveConfigBuilder::new()
            .probability(1.0)
            .species_id(SpeciesId(0))
            .upper_limit(3)
            .lower_limit(3)
            .output_file_name("wl")
            .weight_step(2.0)
            .flatness_criteria(0.2)
            .build_wang_landau();
        assert!(matches!(
            result,
            Err(ConfigError::DegenerateRange { limit: 3 })
        ));
    }

    #[test]
    fn non_positive_annealing_values_are_rejected() {
        assert!(matches!(
            AnnealingConfig::new(0.0, 0.1),
            Err(ConfigError::InvalidValue {
                key: "weightStep",
                ..
            })
        ));
        assert!(matches!(
            AnnealingConfig::new(2.0, -0.1),
            Err(ConfigError::InvalidValue {
                key: "flatnessCriteria",
                ..
            })
        ));
    }

    #[test]
    fn negative_probability_is_rejected() {
        let result = MoveConfigBuilder::new()
            .probability(-0.5)
            .species_id(SpeciesId(0))
            .upper_limit(2)
            .lower_limit(1)
            .output_file_name("us")
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: "probability",
                ..
            })
        ));
    }
}
