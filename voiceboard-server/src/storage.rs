//! On-disk storage for recordings
//!
//! Each recording is a single file named by its message id under the audio
//! root: `{root}/{id}.wav`. Writes go to `{id}.wav.part` first and are renamed
//! into place only after the data is synced, so a reader never sees a torn
//! file and a crash mid-upload leaves only a `.part` behind.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::constants::{
    AUDIO_DIR_NAME, AUDIO_EXTENSION, DATA_DIR_NAME, ERR_NO_DATA_DIR, PART_EXTENSION,
};

/// Failure to persist or load a recording or its registry entry
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Get the default audio root for the current platform
///
/// - Linux: `~/.local/share/voiceboard/audio/`
/// - macOS: `~/Library/Application Support/voiceboard/audio/`
/// - Windows: `%APPDATA%\voiceboard\audio\`
pub fn default_audio_root() -> Result<PathBuf, String> {
    let data_dir = dirs::data_dir().ok_or_else(|| ERR_NO_DATA_DIR.to_string())?;
    Ok(data_dir.join(DATA_DIR_NAME).join(AUDIO_DIR_NAME))
}

/// Recording files keyed by message id
#[derive(Debug, Clone)]
pub struct AudioStore {
    root: PathBuf,
}

impl AudioStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory holding the recordings
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path of the recording for `id`
    pub fn path_for(&self, id: u64) -> PathBuf {
        self.root.join(format!("{id}.{AUDIO_EXTENSION}"))
    }

    fn part_path_for(&self, id: u64) -> PathBuf {
        self.root.join(format!("{id}.{AUDIO_EXTENSION}.{PART_EXTENSION}"))
    }

    /// Durably write the recording for `id`
    ///
    /// On failure the partial file is removed and nothing exists at
    /// [`path_for`](Self::path_for).
    pub async fn write(&self, id: u64, payload: &[u8]) -> Result<(), StoreError> {
        let part_path = self.part_path_for(id);
        let result = write_and_sync(&part_path, payload).await;
        if let Err(e) = result {
            let _ = fs::remove_file(&part_path).await;
            return Err(e.into());
        }

        let path = self.path_for(id);
        if let Err(e) = fs::rename(&part_path, &path).await {
            let _ = fs::remove_file(&part_path).await;
            return Err(e.into());
        }

        // The rename itself is only durable once the directory is synced
        if let Err(e) = sync_dir(&self.root).await {
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Open the recording for `id` for streaming
    ///
    /// Returns `Ok(None)` if no recording exists under that id.
    pub async fn open_recording(&self, id: u64) -> Result<Option<(File, u64)>, StoreError> {
        match File::open(self.path_for(id)).await {
            Ok(file) => {
                let len = file.metadata().await?.len();
                Ok(Some((file, len)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the recording for `id`; a missing file is not an error
    pub async fn remove(&self, id: u64) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_and_sync(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(payload).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::open(dir.path()).await.unwrap();

        store.write(1, b"RIFF-audio").await.unwrap();

        let (mut file, len) = store.open_recording(1).await.unwrap().unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(len, 10);
        assert_eq!(contents, b"RIFF-audio");
        assert!(store.path_for(1).ends_with("1.wav"));
        assert!(!dir.path().join("1.wav.part").exists());
    }

    #[tokio::test]
    async fn test_missing_recording() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::open(dir.path()).await.unwrap();

        assert!(store.open_recording(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_recording_reports_length() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::open(dir.path()).await.unwrap();
        store.write(3, &[9u8; 4096]).await.unwrap();

        let (_, len) = store.open_recording(3).await.unwrap().unwrap();
        assert_eq!(len, 4096);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::open(dir.path()).await.unwrap();
        store.write(5, b"data").await.unwrap();

        store.remove(5).await.unwrap();
        assert!(store.open_recording(5).await.unwrap().is_none());
        // Removing again is fine
        store.remove(5).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_creates_nested_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a/b/audio");

        let store = AudioStore::open(&root).await.unwrap();
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_write_failure_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::open(dir.path().join("audio")).await.unwrap();
        // Pull the directory out from under the store
        std::fs::remove_dir_all(store.root()).unwrap();

        assert!(store.write(1, b"data").await.is_err());
        assert!(!store.path_for(1).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sync_dir() {
        let dir = TempDir::new().unwrap();
        let store = AudioStore::open(dir.path().join("audio")).await.unwrap();
        store.write(7, b"data").await.unwrap();

        sync_dir(store.root()).await.unwrap();
        assert!(sync_dir(&dir.path().join("missing")).await.is_err());
        assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 1);
    }
}
