// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `PresetStore` for depth-probe (uses platform config dir).

use depth_probe_core::{PresetError, PresetStore};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "json";

/// Store presets as JSON files under a directory.
pub struct FsPresetStore {
    base: PathBuf,
}

impl FsPresetStore {
    /// Create a store rooted at the user config directory
    /// (e.g., `~/.config/depth-probe/presets`).
    pub fn new() -> Result<Self, PresetError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "depth-probe")
            .ok_or_else(|| PresetError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir().join("presets"))
    }

    /// Create a store rooted at `base`, creating the directory if needed.
    pub fn at(base: impl Into<PathBuf>) -> Result<Self, PresetError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        debug!(dir = %base.display(), "preset store");
        Ok(Self { base })
    }

    /// Directory holding the preset files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.base.join(format!("{name}.{EXTENSION}"))
    }
}

impl PresetStore for FsPresetStore {
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, PresetError> {
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(PresetError::NotFound),
            Err(err) => Err(PresetError::Io(err)),
        }
    }

    fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), PresetError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        debug!(path = %path.display(), "preset saved");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, PresetError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_owned());
            }
        }
        Ok(names)
    }
}
