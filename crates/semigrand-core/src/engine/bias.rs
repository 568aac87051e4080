use super::error::EngineError;
use crate::core::io::weights::{self, WeightFileError, WeightRow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Bias weights indexed by occupancy.
///
/// Entry `i` is the logarithmic bias applied when exactly `i` molecules are in
/// state zero. The table always has `capacity` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiasWeights {
    values: Vec<f64>,
}

impl BiasWeights {
    pub fn zeros(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity],
        }
    }

    /// Builds a table from `(index, weight)` rows; unnamed indices stay at zero.
    pub fn from_rows(capacity: usize, rows: &[WeightRow]) -> Result<Self, WeightFileError> {
        let mut table = Self::zeros(capacity);
        for row in rows {
            let slot = table
                .values
                .get_mut(row.index)
                .ok_or(WeightFileError::IndexOutOfRange {
                    index: row.index,
                    line: row.line,
                    capacity,
                })?;
            *slot = row.weight;
        }
        Ok(table)
    }

    /// Allocates a table of `capacity` entries, seeded from `source` when given.
    pub fn initialize(capacity: usize, source: Option<&Path>) -> Result<Self, EngineError> {
        match source {
            None => Ok(Self::zeros(capacity)),
            Some(path) => weights::read_weight_rows_from_path(path)
                .and_then(|rows| Self::from_rows(capacity, &rows))
                .map_err(|source| EngineError::InitialWeights {
                    path: path.to_path_buf(),
                    source,
                }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, occupancy: usize) -> Result<f64, EngineError> {
        self.values
            .get(occupancy)
            .copied()
            .ok_or(EngineError::OccupancyOutOfRange {
                occupancy,
                capacity: self.values.len(),
            })
    }

    pub fn increment(&mut self, occupancy: usize, delta: f64) -> Result<(), EngineError> {
        let capacity = self.values.len();
        let slot = self
            .values
            .get_mut(occupancy)
            .ok_or(EngineError::OccupancyOutOfRange {
                occupancy,
                capacity,
            })?;
        *slot += delta;
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Writes the full table to `path`, replacing any previous contents.
    pub fn write_to_path(&self, path: &Path) -> Result<(), EngineError> {
        let io_err = |source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        weights::write_weight_table(&mut writer, &self.values).map_err(io_err)
    }
}
