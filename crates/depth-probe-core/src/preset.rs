// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Named probe presets: a storage port plus the service that (de)serializes
//! and validates them.

use thiserror::Error;

use crate::config::{ConfigError, ProbeConfig};

/// Storage port for raw preset blobs (keyed by preset name).
pub trait PresetStore {
    /// Load a raw preset blob. Returns `NotFound` when missing.
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, PresetError>;
    /// Persist a raw preset blob.
    fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), PresetError>;
    /// Names of every stored preset.
    fn list(&self) -> Result<Vec<String>, PresetError>;
}

/// Error type for preset operations.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Name not present in store.
    #[error("not found")]
    NotFound,
    /// Name is empty or contains characters unsafe for a file name.
    #[error("invalid preset name `{0}` (use letters, digits, `-` and `_`)")]
    InvalidName(String),
    /// Stored or supplied configuration fails validation.
    #[error("invalid preset: {0}")]
    Invalid(#[from] ConfigError),
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Accept `[A-Za-z0-9_-]+`.
pub fn validate_name(name: &str) -> Result<(), PresetError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(PresetError::InvalidName(name.to_owned()))
    }
}

/// Serializes [`ProbeConfig`]s as JSON and delegates storage to a [`PresetStore`].
pub struct PresetService<S> {
    store: S,
}

impl<S> PresetService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> PresetService<S>
where
    S: PresetStore,
{
    /// Load preset `name`. Returns `Ok(None)` if missing; a stored preset
    /// that no longer validates is an error.
    pub fn load(&self, name: &str) -> Result<Option<ProbeConfig>, PresetError> {
        validate_name(name)?;
        match self.store.load_raw(name) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let config: ProbeConfig = serde_json::from_slice(&bytes)?;
                config.validate()?;
                Ok(Some(config))
            }
            Err(PresetError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Validate and persist `config` as preset `name`.
    pub fn save(&self, name: &str, config: &ProbeConfig) -> Result<(), PresetError> {
        validate_name(name)?;
        config.validate()?;
        let data = serde_json::to_vec_pretty(config)?;
        self.store.save_raw(name, &data)
    }

    /// Sorted names of every stored preset.
    pub fn list(&self) -> Result<Vec<String>, PresetError> {
        let mut names = self.store.list()?;
        names.sort();
        Ok(names)
    }
}
