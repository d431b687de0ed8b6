// External crates
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::instrument;

/// Read position in one data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// Data file the offset belongs to.
    pub path: PathBuf,
    /// Identity of the file the offset belongs to; a rotated file gets a new
    /// inode and is read from the start.
    pub inode: u64,
    /// Bytes already shipped.
    pub offset: u64,
}

/// Per-stanza read positions, persisted as JSON in the orchestrator's
/// checkpoint directory between invocations.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// State per data file path.
    pub files: HashMap<PathBuf, FileState>,
}

impl Checkpoint {
    /// Checkpoint file for `stanza` inside `checkpoint_dir`.
    pub fn path_for(checkpoint_dir: &Path, stanza: &str) -> PathBuf {
        let file_name: String = stanza
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        checkpoint_dir.join(format!("{file_name}.json"))
    }

    /// Load a checkpoint; a missing file is an empty checkpoint.
    #[instrument(
        name = "log_input_checkpoint::load",
        target = "log_input::models::Checkpoint",
        level = "debug",
        skip_all
    )]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(checkpoint = %path.display(), "No checkpoint yet, starting fresh");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read checkpoint at {:?}", path))?;
        let checkpoint = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse checkpoint JSON from {:?}", path))?;
        Ok(checkpoint)
    }

    /// Persist the checkpoint, replacing the previous file atomically.
    #[instrument(
        name = "log_input_checkpoint::save",
        target = "log_input::models::Checkpoint",
        level = "debug",
        skip_all
    )]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create checkpoint dir {:?}", parent))?;
        }

        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, raw).with_context(|| format!("Failed to write checkpoint {:?}", tmp))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move checkpoint into place at {:?}", path))?;

        tracing::debug!(
            checkpoint = %path.display(),
            tracked_files = self.files.len(),
            "Checkpoint saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stanza_names_become_safe_file_names() {
        let path = Checkpoint::path_for(Path::new("/ckpt"), "ves_log://app/main logs");
        assert_eq!(path, PathBuf::from("/ckpt/ves_log___app_main_logs.json"));
    }

    #[test]
    fn missing_checkpoint_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::load(&dir.path().join("none.json")).unwrap();
        assert!(checkpoint.files.is_empty());
    }

    #[test]
    fn save_then_load_keeps_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stanza.json");

        let mut checkpoint = Checkpoint::default();
        checkpoint.files.insert(
            PathBuf::from("/var/log/app.log"),
            FileState {
                path: PathBuf::from("/var/log/app.log"),
                inode: 42,
                offset: 1024,
            },
        );
        checkpoint.save(&path).unwrap();

        assert_eq!(Checkpoint::load(&path).unwrap(), checkpoint);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = Checkpoint::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse checkpoint JSON"));
    }
}
