use crate::domain::ports::Storage;
use crate::utils::error::{DisasterDataError, Result};
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at `base_path`; keys are `/`-separated.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(DisasterDataError::StorageError {
                message: format!("refusing to leave the storage root: {}", path),
            });
        }
        Ok(Path::new(&self.base_path).join(path.trim_start_matches('/')))
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path)?;
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(tokio::fs::try_exists(full_path).await?)
    }

    fn location(&self, path: &str) -> String {
        Path::new(&self.base_path)
            .join(path.trim_start_matches('/'))
            .display()
            .to_string()
    }
}
