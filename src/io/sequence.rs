use std::path::PathBuf;

use crate::foundation::error::{MedflowError, MedflowResult};

/// Filename pattern where `#` stands for a frame index, e.g. `frames/us_#.mhd`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilenameFormat {
    pattern: String,
}

impl FilenameFormat {
    pub fn new(pattern: impl Into<String>) -> MedflowResult<Self> {
        let pattern = pattern.into();
        if !pattern.contains('#') {
            return Err(MedflowError::config(format!(
                "filename format '{pattern}' has no '#' placeholder"
            )));
        }
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Path of frame `index`; every `#` is replaced.
    pub fn path(&self, index: u64) -> PathBuf {
        PathBuf::from(self.pattern.replace('#', &index.to_string()))
    }

    /// Consecutive existing files from `start`, stopping at the first gap or after `limit`.
    pub fn existing(&self, start: u64, limit: Option<u64>) -> Vec<PathBuf> {
        (start..)
            .take(limit.map_or(usize::MAX, |l| l as usize))
            .map(|i| self.path(i))
            .take_while(|p| p.is_file())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/sequence.rs"]
mod tests;
