mod defaults;

use self::defaults::DefaultsConfig;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use semigrand::core::io::params::ParamBlock;
use semigrand::core::models::mixture::{BinaryMixture, MixtureSpecies, NeighborCoupling};
use semigrand::engine::config::{
    MoveConfig, MoveConfigBuilder, NO_INITIAL_WEIGHTS, WangLandauConfig,
};
use semigrand::engine::error::EngineError;
use semigrand::engine::moves::{SemigrandMove, UmbrellaSamplingMove, WangLandauMove};
use semigrand::workflows::sample::SamplingPlan;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSpeciesConfig {
    molecules: usize,
    initial_zero: usize,
    capacity: Option<usize>,
    state_weights: Option<[f64; 2]>,
    semigrand: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(deny_unknown_fields)]
struct PartialCouplingConfig {
    epsilon: [[f64; 2]; 2],
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSystemConfig {
    beta: Option<f64>,
    #[serde(default)]
    species: Vec<PartialSpeciesConfig>,
    coupling: Option<PartialCouplingConfig>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum MoveKind {
    WangLandau,
    Umbrella,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMoveConfig {
    #[serde(rename = "type")]
    kind: MoveKind,
    params_file: Option<PathBuf>,
    probability: Option<f64>,
    species_id: Option<usize>,
    lower_limit: Option<usize>,
    upper_limit: Option<usize>,
    output_file_name: Option<PathBuf>,
    initial_weights: Option<String>,
    weight_step: Option<f64>,
    flatness_criteria: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRunSection {
    trials: Option<u64>,
    seed: Option<u64>,
    checkpoint_interval: Option<u64>,
    checkpoint_file: Option<PathBuf>,
    min_weight_step: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    system: Option<PartialSystemConfig>,
    #[serde(default)]
    moves: Vec<PartialMoveConfig>,
    run: Option<PartialRunSection>,
}

/// A fully validated move definition, ready to be attached to a host.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveSpec {
    WangLandau(WangLandauConfig),
    Umbrella(MoveConfig),
}

impl MoveSpec {
    pub fn build(
        self,
        host: &BinaryMixture,
    ) -> std::result::Result<Box<dyn SemigrandMove<BinaryMixture>>, EngineError> {
        Ok(match self {
            Self::WangLandau(config) => Box::new(WangLandauMove::new(config, host)?),
            Self::Umbrella(config) => Box::new(UmbrellaSamplingMove::new(config, host)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub system: BinaryMixture,
    pub moves: Vec<MoveSpec>,
    pub plan: SamplingPlan,
    pub seed: Option<u64>,
    /// Where checkpoints go; set whenever periodic checkpoints are requested.
    pub checkpoint_file: Option<PathBuf>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Combines the file with command-line overrides. Relative `params-file`
    /// and `initial-weights` paths are resolved against `base_dir`; an
    /// `initialWeights` inside a params file is resolved against that file's
    /// directory.
    pub fn merge_with_cli(mut self, args: &RunArgs, base_dir: &Path) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let system = Self::build_system(self.system.take().unwrap_or_default(), &defaults)?;

        if self.moves.is_empty() {
            return Err(CliError::Config(
                "At least one `[[moves]]` entry is required.".to_string(),
            ));
        }
        let moves = self
            .moves
            .into_iter()
            .enumerate()
            .map(|(i, partial)| Self::build_move(i, partial, base_dir))
            .collect::<Result<Vec<_>>>()?;

        let run = self.run.take().unwrap_or_default();
        let checkpoint_interval = args.checkpoint_interval.or(run.checkpoint_interval);
        if checkpoint_interval == Some(0) {
            return Err(CliError::Config(
                "`run.checkpoint-interval` must be positive.".to_string(),
            ));
        }
        let checkpoint_file = args
            .checkpoint_file
            .clone()
            .or(run.checkpoint_file)
            .or_else(|| checkpoint_interval.map(|_| PathBuf::from(defaults.checkpoint_file)));

        let plan = SamplingPlan {
            trials: args.trials.or(run.trials).unwrap_or(defaults.trials),
            first_trial: 0,
            checkpoint_interval,
            min_weight_step: args.min_weight_step.or(run.min_weight_step),
        };

        Ok(RunConfig {
            system,
            moves,
            plan,
            seed: args.seed.or(run.seed),
            checkpoint_file,
        })
    }

    fn build_system(
        partial: PartialSystemConfig,
        defaults: &DefaultsConfig,
    ) -> Result<BinaryMixture> {
        if partial.species.is_empty() {
            return Err(CliError::Config(
                "At least one `[[system.species]]` entry is required.".to_string(),
            ));
        }

        let mut species = Vec::with_capacity(partial.species.len());
        for (i, s) in partial.species.into_iter().enumerate() {
            if s.initial_zero > s.molecules {
                return Err(CliError::Config(format!(
                    "Species {}: `initial-zero` ({}) exceeds `molecules` ({}).",
                    i, s.initial_zero, s.molecules
                )));
            }
            let state_weights = s.state_weights.unwrap_or(defaults.state_weights);
            if state_weights.iter().any(|w| !(*w > 0.0 && w.is_finite())) {
                return Err(CliError::Config(format!(
                    "Species {}: `state-weights` must be finite and positive.",
                    i
                )));
            }
            let mut built = MixtureSpecies::new(s.molecules, s.initial_zero)
                .with_state_weights(state_weights);
            if let Some(capacity) = s.capacity {
                built = built.with_capacity(capacity);
            }
            if !s.semigrand.unwrap_or(true) {
                built = built.inert();
            }
            species.push(built);
        }

        let mut system =
            BinaryMixture::new(species).with_beta(partial.beta.unwrap_or(defaults.beta));
        if let Some(coupling) = partial.coupling {
            system = system.with_coupling(NeighborCoupling::new(coupling.epsilon));
        }
        Ok(system)
    }

    fn build_move(index: usize, partial: PartialMoveConfig, base_dir: &Path) -> Result<MoveSpec> {
        let mut builder = match &partial.params_file {
            Some(file) => {
                let path = base_dir.join(file);
                debug!("Reading parameters for move {} from {:?}", index, path);
                let content = std::fs::read_to_string(&path)?;
                let params_dir = path.parent().unwrap_or(base_dir);
                ParamBlock::parse_str(&content)
                    .map_err(Into::into)
                    .and_then(|block| MoveConfigBuilder::from_params(&block))
                    .map_err(|e| CliError::FileParsing {
                        path: path.clone(),
                        source: e.into(),
                    })?
                    .resolve_initial_weights(params_dir)
            }
            None => MoveConfigBuilder::new(),
        };

        if let Some(v) = partial.probability {
            builder = builder.probability(v);
        }
        if let Some(v) = partial.species_id {
            builder = builder.species_id(v.into());
        }
        if let Some(v) = partial.lower_limit {
            builder = builder.lower_limit(v);
        }
        if let Some(v) = partial.upper_limit {
            builder = builder.upper_limit(v);
        }
        if let Some(v) = partial.output_file_name {
            builder = builder.output_file_name(v);
        }
        if let Some(v) = partial.initial_weights {
            builder = builder
                .initial_weights((v != NO_INITIAL_WEIGHTS).then(|| PathBuf::from(v)))
                .resolve_initial_weights(base_dir);
        }
        if let Some(v) = partial.weight_step {
            builder = builder.weight_step(v);
        }
        if let Some(v) = partial.flatness_criteria {
            builder = builder.flatness_criteria(v);
        }

        let invalid = |e: semigrand::engine::config::ConfigError| {
            CliError::Config(format!("Move {}: {}", index, e))
        };
        match partial.kind {
            MoveKind::WangLandau => builder
                .build_wang_landau()
                .map(MoveSpec::WangLandau)
                .map_err(invalid),
            MoveKind::Umbrella => builder
                .build_umbrella()
                .map(MoveSpec::Umbrella)
                .map_err(invalid),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key.split('.').collect::<Vec<_>>().as_slice() {
                ["system", "beta"] => {
                    self.system.get_or_insert_with(Default::default).beta =
                        Some(parse_value(key, value_str)?);
                }
                ["run", field] => {
                    let run = self.run.get_or_insert_with(Default::default);
                    match *field {
                        "trials" => run.trials = Some(parse_value(key, value_str)?),
                        "seed" => run.seed = Some(parse_value(key, value_str)?),
                        "checkpoint-interval" => {
                            run.checkpoint_interval = Some(parse_value(key, value_str)?)
                        }
                        "checkpoint-file" => run.checkpoint_file = Some(value_str.into()),
                        "min-weight-step" => {
                            run.min_weight_step = Some(parse_value(key, value_str)?)
                        }
                        _ => return Err(unsupported_key(key)),
                    }
                }
                ["moves", index, field] => {
                    let index: usize = parse_value(key, index)?;
                    let count = self.moves.len();
                    let mv = self.moves.get_mut(index).ok_or_else(|| {
                        CliError::Config(format!(
                            "--set key '{}' refers to move {} but only {} are defined.",
                            key, index, count
                        ))
                    })?;
                    match *field {
                        "probability" => mv.probability = Some(parse_value(key, value_str)?),
                        "species-id" => mv.species_id = Some(parse_value(key, value_str)?),
                        "lower-limit" => mv.lower_limit = Some(parse_value(key, value_str)?),
                        "upper-limit" => mv.upper_limit = Some(parse_value(key, value_str)?),
                        "output-file-name" => mv.output_file_name = Some(value_str.into()),
                        "initial-weights" => mv.initial_weights = Some(value_str.to_string()),
                        "weight-step" => mv.weight_step = Some(parse_value(key, value_str)?),
                        "flatness-criteria" => {
                            mv.flatness_criteria = Some(parse_value(key, value_str)?)
                        }
                        _ => return Err(unsupported_key(key)),
                    }
                }
                _ => return Err(unsupported_key(key)),
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}
