use super::error::EngineError;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Suffix of the final weight-table artifact.
pub const WEIGHT_TABLE_SUFFIX: &str = ".dat";
/// Suffix of the append-only annealing log.
pub const ANNEALING_LOG_SUFFIX: &str = ".weights";

/// Appends `suffix` to `base` without touching any dots already in the name.
pub fn artifact_path(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Append-only log of `(trial, weight step)` lines written on every anneal.
///
/// The log can be closed and is transparently reopened in append mode on the
/// next record.
#[derive(Debug)]
pub struct WeightLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl WeightLog {
    /// Creates the log at `path`, truncating any previous contents.
    pub fn create(path: PathBuf) -> Result<Self, EngineError> {
        let file = File::create(&path).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Wraps an existing log without opening it; the first record appends.
    pub fn resume(path: PathBuf) -> Self {
        Self { path, writer: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn record(&mut self, trial: u64, weight_step: f64) -> Result<(), EngineError> {
        let path = &self.path;
        let io_err = |source| EngineError::Io {
            path: path.clone(),
            source,
        };
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(io_err)?;
            self.writer = Some(BufWriter::new(file));
        }
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}\t{}", trial, weight_step).map_err(io_err)?;
            writer.flush().map_err(io_err)?;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), EngineError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|source| EngineError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
