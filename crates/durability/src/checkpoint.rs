//! Crash-safe, epoch-tagged weight checkpoints
//!
//! Each dump lands in `<dir>/<prefix>.epoch<N>.wgt`, where `N` is the
//! weight's epoch. Writes follow the write-fsync-rename pattern:
//! 1. Write to a temporary file (`.<prefix>.epoch<N>.tmp`)
//! 2. fsync the temporary file
//! 3. Atomic rename to the final path
//! 4. fsync the parent directory
//!
//! so a checkpoint file is either complete or absent.

use crate::format::{decode_weight, encode_weight};
use duelrank_core::{Error, Result, WeightVector};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Checkpoint file extension
pub const CHECKPOINT_EXTENSION: &str = "wgt";

/// Directory of weight checkpoints sharing a file-name prefix
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
    prefix: String,
}

impl CheckpointStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(CheckpointStore {
            dir,
            prefix: prefix.into(),
        })
    }

    /// Checkpoint directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path of the checkpoint for `epoch`
    pub fn path_for(&self, epoch: u64) -> PathBuf {
        self.dir.join(format!(
            "{}.epoch{}.{}",
            self.prefix, epoch, CHECKPOINT_EXTENSION
        ))
    }

    fn temp_path_for(&self, epoch: u64) -> PathBuf {
        self.dir.join(format!(".{}.epoch{}.tmp", self.prefix, epoch))
    }

    /// Write `weight` under its current epoch, replacing any previous file.
    pub fn dump(&self, weight: &WeightVector) -> Result<PathBuf> {
        let bytes = encode_weight(weight)?;
        let final_path = self.path_for(weight.epoch());
        let temp_path = self.temp_path_for(weight.epoch());

        // Step 1: Write to temporary file
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&bytes)?;

        // Step 2: fsync the file
        file.sync_all()?;
        drop(file);

        // Step 3: Atomic rename
        std::fs::rename(&temp_path, &final_path)?;

        // Step 4: fsync parent directory
        File::open(&self.dir)?.sync_all()?;

        info!(
            target: "duelrank::checkpoint",
            epoch = weight.epoch(),
            nnz = weight.vector().nnz(),
            bytes = bytes.len(),
            path = ?final_path,
            "Checkpoint written"
        );
        Ok(final_path)
    }

    /// Load the checkpoint written at `epoch`.
    ///
    /// # Errors
    ///
    /// `Error::CheckpointNotFound` if no file exists for `epoch`;
    /// `Error::Corruption` if the file fails validation or records a
    /// different epoch than its name.
    pub fn load(&self, epoch: u64) -> Result<WeightVector> {
        let path = self.path_for(epoch);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::CheckpointNotFound { epoch })
            }
            Err(e) => return Err(e.into()),
        };

        let weight = decode_weight(&bytes)?;
        if weight.epoch() != epoch {
            return Err(Error::Corruption(format!(
                "{} records epoch {}",
                path.display(),
                weight.epoch()
            )));
        }
        Ok(weight)
    }

    /// Epochs with a checkpoint on disk, ascending
    pub fn list_epochs(&self) -> Result<Vec<u64>> {
        let mut epochs = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if let Some(epoch) = self.parse_epoch(&name) {
                epochs.push(epoch);
            }
        }
        epochs.sort_unstable();
        Ok(epochs)
    }

    /// Load the highest-epoch checkpoint, if any
    pub fn latest(&self) -> Result<Option<WeightVector>> {
        match self.list_epochs()?.last() {
            Some(&epoch) => self.load(epoch).map(Some),
            None => Ok(None),
        }
    }

    /// Remove temporary files left behind by interrupted dumps
    pub fn cleanup_temp_files(&self) -> Result<usize> {
        let mut count = 0;
        let temp_prefix = format!(".{}.epoch", self.prefix);
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(&temp_prefix) && name.ends_with(".tmp") {
                std::fs::remove_file(entry.path())?;
                count += 1;
            }
        }
        if count > 0 {
            warn!(target: "duelrank::checkpoint", count, "Removed stale temporary checkpoints");
        }
        Ok(count)
    }

    /// Epoch of a checkpoint file name, only in the form `path_for` writes
    fn parse_epoch(&self, file_name: &str) -> Option<u64> {
        let digits = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(".epoch")?
            .strip_suffix(CHECKPOINT_EXTENSION)?
            .strip_suffix('.')?;
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return None;
        }
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelrank_core::SparseVector;
    use tempfile::TempDir;

    #[test]
    fn test_path_embeds_epoch() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(dir.path(), "weight").unwrap();
        assert_eq!(store.path_for(12), dir.path().join("weight.epoch12.wgt"));
    }

    #[test]
    fn test_parse_epoch() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(dir.path(), "weight").unwrap();
        assert_eq!(store.parse_epoch("weight.epoch3.wgt"), Some(3));
        assert_eq!(store.parse_epoch("weight.epoch.wgt"), None);
        assert_eq!(store.parse_epoch("other.epoch3.wgt"), None);
        assert_eq!(store.parse_epoch(".weight.epoch3.tmp"), None);
        assert_eq!(store.parse_epoch("weight.epoch3.npz"), None);
        assert_eq!(store.parse_epoch("weight.epoch0.wgt"), Some(0));
        assert_eq!(store.parse_epoch("weight.epoch03.wgt"), None);
        assert_eq!(store.parse_epoch("weight.epoch+3.wgt"), None);
        assert_eq!(store.parse_epoch("weight.epoch00.wgt"), None);
    }

    #[test]
    fn test_non_canonical_names_not_listed() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(dir.path(), "weight").unwrap();
        let w = WeightVector::from_vector(SparseVector::from_dense(&[1.0]), 2);
        store.dump(&w).unwrap();
        std::fs::copy(store.path_for(2), dir.path().join("weight.epoch03.wgt")).unwrap();
        std::fs::copy(store.path_for(2), dir.path().join("weight.epoch+7.wgt")).unwrap();

        assert_eq!(store.list_epochs().unwrap(), vec![2]);
        assert_eq!(store.latest().unwrap(), Some(w));
    }

    #[test]
    fn test_dump_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(dir.path(), "weight").unwrap();
        let w = WeightVector::from_vector(SparseVector::from_dense(&[1.0, 0.0]), 1);
        let path = store.dump(&w).unwrap();
        assert!(path.exists());
        assert!(!store.temp_path_for(1).exists());
    }

    #[test]
    fn test_cleanup_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::open(dir.path(), "weight").unwrap();
        std::fs::write(store.temp_path_for(4), b"partial").unwrap();
        std::fs::write(dir.path().join("unrelated.tmp"), b"keep").unwrap();

        assert_eq!(store.cleanup_temp_files().unwrap(), 1);
        assert!(!store.temp_path_for(4).exists());
        assert!(dir.path().join("unrelated.tmp").exists());
    }
}
