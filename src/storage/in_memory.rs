use super::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    files: Arc<RwLock<HashMap<FileId, Bytes>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save(&self, bytes: Bytes) -> Result<FileId, StorageError> {
        let file_id = FileId::generate()?;
        self.files.write().await.insert(file_id, bytes);
        Ok(file_id)
    }

    async fn take(&self, file_id: &FileId) -> Result<Vec<u8>, StorageError> {
        self.files
            .write()
            .await
            .remove(file_id)
            .map(|bytes| bytes.to_vec())
            .ok_or(StorageError::NotFound)
    }
}
