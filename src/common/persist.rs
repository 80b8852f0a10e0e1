use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

use crate::common::error::MiddlemanError;

const SNAPSHOT_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Whole-document JSON snapshots, one file per key, inside a single directory.
///
/// A snapshot is first written to a hidden temp file beside its destination, synced,
/// then renamed over the destination, then the directory is synced. A failed write leaves
/// the previous snapshot intact.
pub(crate) struct Persister {
    dir_path: PathBuf,
}

impl Persister {
    pub(crate) async fn new(dir_path: impl AsRef<Path>) -> Result<Self, MiddlemanError> {
        let dir_path = dir_path.as_ref().to_path_buf();
        fs::create_dir_all(&dir_path).await?;
        Ok(Self { dir_path })
    }

    pub(crate) fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.dir_path.join(format!("{}.{}", key, SNAPSHOT_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir_path
            .join(format!(".{}.{}.{}", key, SNAPSHOT_EXTENSION, TEMP_EXTENSION))
    }

    pub(crate) async fn persist<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), MiddlemanError> {
        let json = serde_json::to_string_pretty(value)?;
        let data_path = self.data_path(key);
        let temp_path = self.temp_path(key);

        debug!(
            "Persisting JSON to path: {} - {}",
            data_path.display().to_string(),
            json
        );

        let mut file = fs::File::create(&temp_path).await?;
        let written = Self::write_synced(&mut file, json.as_bytes()).await;
        drop(file);

        if let Err(error) = written {
            if let Some(remove_err) = fs::remove_file(&temp_path).await.err() {
                warn!(
                    "Failed to clean up temp file {} - {}",
                    temp_path.display().to_string(),
                    remove_err
                );
            }
            return Err(error);
        }

        fs::rename(&temp_path, &data_path).await?;

        // The rename itself only survives a crash once the directory entry is on disk
        fs::File::open(&self.dir_path).await?.sync_all().await?;
        Ok(())
    }

    async fn write_synced(file: &mut fs::File, bytes: &[u8]) -> Result<(), MiddlemanError> {
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Reads back every snapshot in the directory. Leftover temp files from an interrupted
    /// write are removed, the snapshot they were replacing is still authoritative.
    pub(crate) async fn restore_all<T: DeserializeOwned>(
        &self,
    ) -> Result<Vec<(String, T)>, MiddlemanError> {
        let mut restored = Vec::new();
        let mut entries = fs::read_dir(&self.dir_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };

            if file_name.starts_with('.') && file_name.ends_with(TEMP_EXTENSION) {
                warn!(
                    "Removing incomplete snapshot {}",
                    path.display().to_string()
                );
                fs::remove_file(&path).await?;
                continue;
            }

            let Some(key) = file_name.strip_suffix(&format!(".{}", SNAPSHOT_EXTENSION)) else {
                continue;
            };

            let json = fs::read_to_string(&path).await?;
            debug!(
                "Restored JSON from path: {} - {}",
                path.display().to_string(),
                &json
            );
            let value: T = serde_json::from_str(&json)?;
            restored.push((key.to_string(), value));
        }
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(PartialEq, Debug, Serialize, Deserialize)]
    struct SomeRecord {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_persist_then_restore_all() {
        let dir = tempfile::tempdir().unwrap();
        let persister = Persister::new(dir.path()).await.unwrap();

        let first = SomeRecord {
            name: "first".to_string(),
            count: 1,
        };
        persister.persist("aa", &first).await.unwrap();

        let second = SomeRecord {
            name: "second".to_string(),
            count: 2,
        };
        persister.persist("aa", &second).await.unwrap();

        let restored: Vec<(String, SomeRecord)> = persister.restore_all().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].0, "aa");
        assert_eq!(restored[0].1, second);
    }

    #[tokio::test]
    async fn test_restore_discards_interrupted_write() {
        let dir = tempfile::tempdir().unwrap();
        let persister = Persister::new(dir.path()).await.unwrap();

        let record = SomeRecord {
            name: "kept".to_string(),
            count: 7,
        };
        persister.persist("bb", &record).await.unwrap();

        // Simulate a crash half way through replacing the snapshot
        let temp_path = persister.temp_path("bb");
        std::fs::write(&temp_path, "{\"name\": \"trunc").unwrap();

        let restored: Vec<(String, SomeRecord)> = persister.restore_all().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].1, record);
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn test_no_temp_file_left_after_persist() {
        let dir = tempfile::tempdir().unwrap();
        let persister = Persister::new(dir.path()).await.unwrap();

        let record = SomeRecord {
            name: "clean".to_string(),
            count: 0,
        };
        persister.persist("cc", &record).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(persister.dir_path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["cc.json".to_string()]);
    }

    #[tokio::test]
    async fn test_replaced_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let persister = Persister::new(dir.path().join("nested")).await.unwrap();

        for count in 0..3 {
            let record = SomeRecord {
                name: "replaced".to_string(),
                count,
            };
            persister.persist("dd", &record).await.unwrap();
        }
        drop(persister);

        let reopened = Persister::new(dir.path().join("nested")).await.unwrap();
        let restored: Vec<(String, SomeRecord)> = reopened.restore_all().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].1.count, 2);
    }
}
