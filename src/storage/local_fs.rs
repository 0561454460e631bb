use super::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Stores each upload as `<root>/<id>.tar.gz`. The directory listing is the
/// only index; nothing about issued ids is kept in memory.
pub struct LocalFileStorage {
    storage_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(storage_path: PathBuf) -> Result<Self, StorageError> {
        if !storage_path.exists() {
            std::fs::create_dir_all(&storage_path)?;
        }
        Ok(Self { storage_path })
    }

    pub fn root(&self) -> &Path {
        &self.storage_path
    }

    fn path_for(&self, file_id: &FileId) -> PathBuf {
        self.storage_path.join(file_id.file_name())
    }

    /// Unique name a download moves the file to before reading it.
    fn claim_path_for(&self, file_id: &FileId) -> Result<PathBuf, StorageError> {
        let claim = FileId::generate()?;
        Ok(self
            .storage_path
            .join(format!("{}.{claim}.claimed", file_id.file_name())))
    }
}

#[async_trait]
impl Storage for LocalFileStorage {
    async fn save(&self, bytes: Bytes) -> Result<FileId, StorageError> {
        let file_id = FileId::generate()?;
        let file_path = self.path_for(&file_id);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await?;

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(err) = written {
            drop(file);
            let _ = fs::remove_file(&file_path).await;
            return Err(err.into());
        }

        Ok(file_id)
    }

    async fn take(&self, file_id: &FileId) -> Result<Vec<u8>, StorageError> {
        let file_path = self.path_for(file_id);
        let claim_path = self.claim_path_for(file_id)?;

        // rename is atomic: only one concurrent download can move the file.
        match fs::rename(&file_path, &claim_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(err) => return Err(err.into()),
        }

        let bytes = match fs::read(&claim_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                if let Err(restore) = fs::rename(&claim_path, &file_path).await {
                    tracing::error!(
                        file_id = %file_id,
                        claim = %claim_path.display(),
                        error = %restore,
                        "could not restore unreadable file"
                    );
                }
                return Err(err.into());
            }
        };

        // The claim already hides the file from other downloads, so a failed
        // remove leaves it behind as `.claimed` for the operator.
        if let Err(err) = fs::remove_file(&claim_path).await {
            tracing::error!(
                file_id = %file_id,
                claim = %claim_path.display(),
                error = %err,
                "served file left behind"
            );
            return Err(StorageError::Cleanup(err));
        }

        Ok(bytes)
    }
}
