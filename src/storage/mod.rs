mod in_memory;
mod local_fs;

pub use in_memory::InMemoryStorage;
pub use local_fs::LocalFileStorage;

use async_trait::async_trait;
use axum::body::Bytes;
use rand::{RngCore, rngs::OsRng};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::{Builder, Uuid};

/// Suffix appended to every stored file, whatever the payload actually is.
pub const FILE_SUFFIX: &str = ".tar.gz";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found")]
    NotFound,
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to remove served file: {0}")]
    Cleanup(#[source] std::io::Error),
}

/// Key of a stored file: a random (version 4) UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(Uuid);

impl FileId {
    /// Draws 128 bits from the OS entropy source. Fails instead of falling
    /// back to a weaker generator.
    pub fn generate() -> Result<Self, StorageError> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(Builder::from_random_bytes(bytes).into_uuid()))
    }

    /// Name of the file backing this id, e.g. `<uuid>.tar.gz`.
    pub fn file_name(&self) -> String {
        format!("{}{FILE_SUFFIX}", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Stores `bytes` under a freshly generated id.
    async fn save(&self, bytes: Bytes) -> Result<FileId, StorageError>;

    /// Returns the stored bytes and removes them. At most one caller ever
    /// receives the contents for a given id.
    async fn take(&self, file_id: &FileId) -> Result<Vec<u8>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Version;

    #[test]
    fn generated_ids_are_v4_and_distinct() {
        let a = FileId::generate().unwrap();
        let b = FileId::generate().unwrap();

        assert_ne!(a, b);
        assert_eq!(a.0.get_version(), Some(Version::Random));
        assert_eq!(a.0.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn display_is_canonical_hyphenated() {
        let id = FileId::generate().unwrap();
        let text = id.to_string();

        assert_eq!(text.len(), 36);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(text.matches('-').count(), 4);
        assert_eq!(text.parse::<FileId>().unwrap(), id);
    }

    #[test]
    fn parse_normalizes_case() {
        let id: FileId = "67E55044-10B1-426F-9247-BB680E5FE0C8".parse().unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn parse_rejects_non_uuid() {
        assert!("..".parse::<FileId>().is_err());
        assert!("hello".parse::<FileId>().is_err());
        assert!("".parse::<FileId>().is_err());
    }

    #[test]
    fn file_name_has_fixed_suffix() {
        let id: FileId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(
            id.file_name(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8.tar.gz"
        );
    }
}
