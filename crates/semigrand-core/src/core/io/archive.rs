use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing or restoring a checkpoint archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive I/O error for '{path}': {source}", path = path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to encode archive: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to decode archive: {0}")]
    Deserialize(#[from] toml::de::Error),
}

/// Encodes `value` as a TOML archive document.
pub fn to_archive_string<T: Serialize>(value: &T) -> Result<String, ArchiveError> {
    Ok(toml::to_string(value)?)
}

pub fn from_archive_str<T: DeserializeOwned>(content: &str) -> Result<T, ArchiveError> {
    Ok(toml::from_str(content)?)
}

/// Writes `value` to `path`, replacing any existing archive.
pub fn save_archive<T: Serialize>(value: &T, path: &Path) -> Result<(), ArchiveError> {
    let content = to_archive_string(value)?;
    fs::write(path, content).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_archive<T: DeserializeOwned>(path: &Path) -> Result<T, ArchiveError> {
    let content = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_archive_str(&content)
}
