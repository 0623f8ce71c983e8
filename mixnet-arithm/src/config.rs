//! Runtime tunables of the arithmetic layer.
//!
//! A configuration is plain data. Nothing here is global: the [`Backing`]
//! built by [`ArithConfig::backing`] is passed to array factories and the
//! thread thresholds are copied into each group by
//! [`ArithConfig::apply_thresholds`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arithm::array::{DEFAULT_BATCH_SIZE, DEFAULT_SORT_THRESHOLD, FileStore};
use crate::arithm::{Backing, PGroup};
use crate::eio::StorageDir;
use crate::errors::ArithmError;
use crate::util::{EXP_THREAD_THRESHOLD, MUL_THREAD_THRESHOLD};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackingKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArithConfig {
    pub backing: BackingKind,
    /// Parent of the storage directory of a file backing.
    pub storage_dir: Option<PathBuf>,
    /// Integers per batch of a file backing.
    pub batch_size: usize,
    /// Records sorted in memory per run of an external sort.
    pub sort_memory_threshold: usize,
    pub exp_thread_threshold: usize,
    pub mul_thread_threshold: usize,
    /// Miller-Rabin certainty used when validating decoded parameters.
    pub certainty: usize,
    /// Statistical distance of sampled elements, in bits.
    pub stat_dist: usize,
}

impl Default for ArithConfig {
    fn default() -> Self {
        ArithConfig {
            backing: BackingKind::Memory,
            storage_dir: None,
            batch_size: DEFAULT_BATCH_SIZE,
            sort_memory_threshold: DEFAULT_SORT_THRESHOLD,
            exp_thread_threshold: EXP_THREAD_THRESHOLD,
            mul_thread_threshold: MUL_THREAD_THRESHOLD,
            certainty: 100,
            stat_dist: 100,
        }
    }
}

impl ArithConfig {
    /// Parses a configuration. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ArithmError> {
        let config: ArithConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ArithmError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArithmError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ArithmError> {
        if self.batch_size == 0 || self.sort_memory_threshold == 0 {
            return Err(ArithmError::InvalidParameters(
                "Batch size and sort threshold must be > 0".to_string(),
            ));
        }
        if self.backing == BackingKind::File && self.storage_dir.is_none() {
            return Err(ArithmError::InvalidParameters(
                "A file backing needs a storage directory".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the backing described by the configuration. A file backing
    /// creates a fresh storage directory inside `storage_dir` that lives
    /// until the last array stored in it is dropped.
    pub fn backing(&self) -> Result<Backing, ArithmError> {
        self.validate()?;
        match (&self.backing, &self.storage_dir) {
            (BackingKind::File, Some(parent)) => {
                let dir = StorageDir::create_in(parent)?;
                debug!(path = %dir.path().display(), batch_size = self.batch_size, "file backing");
                Ok(Backing::file(FileStore::new(
                    dir,
                    self.batch_size,
                    self.sort_memory_threshold,
                )))
            }
            _ => Ok(Backing::Memory),
        }
    }

    /// Copies the thread thresholds into `group` and every group it is
    /// built from.
    pub fn apply_thresholds(&self, group: &PGroup) {
        group.set_exp_thread_threshold(self.exp_thread_threshold);
        group.set_mul_thread_threshold(self.mul_thread_threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arithm::group::ECPGroup;

    #[test]
    fn test_defaults_fill_missing_fields() -> Result<(), ArithmError> {
        let config = ArithConfig::from_json(r#"{ "certainty": 40 }"#)?;
        assert_eq!(config.certainty, 40);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.backing, BackingKind::Memory);
        assert!(!config.backing()?.is_file());

        let again = ArithConfig::from_json(&config.to_json()?)?;
        assert_eq!(again, config);
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_configurations() {
        assert!(ArithConfig::from_json(r#"{ "backing": "file" }"#).is_err());
        assert!(ArithConfig::from_json(r#"{ "batch_size": 0 }"#).is_err());
        assert!(ArithConfig::from_json(r#"{ "backing": "tape" }"#).is_err());
        assert!(ArithConfig::from_json("[]").is_err());
    }

    #[test]
    fn test_file_backing_owns_a_directory() -> Result<(), ArithmError> {
        let parent = std::env::temp_dir();
        let config = ArithConfig {
            backing: BackingKind::File,
            storage_dir: Some(parent.clone()),
            batch_size: 7,
            ..ArithConfig::default()
        };
        let backing = config.backing()?;
        let Backing::File(store) = &backing else {
            panic!("expected a file backing");
        };
        assert_eq!(store.batch_size(), 7);
        let path = store.dir().path().to_path_buf();
        assert!(path.starts_with(&parent) && path.is_dir());
        drop(backing);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_thresholds_reach_the_group() -> Result<(), ArithmError> {
        let group = PGroup::Ec(ECPGroup::named("P-256")?);
        let config = ArithConfig {
            exp_thread_threshold: 3,
            mul_thread_threshold: 5,
            ..ArithConfig::default()
        };
        config.apply_thresholds(&group);
        assert_eq!(group.exp_thread_threshold(), 3);
        assert_eq!(group.mul_thread_threshold(), 5);
        Ok(())
    }
}
