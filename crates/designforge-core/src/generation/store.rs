use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::domain::ImageReference;

/// Errors from image persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid image file name: {0:?}")]
    InvalidFileName(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Destination for generated image bytes.
pub trait ImageStore: Send + Sync {
    /// Persist `data` under `file_name` and return a reference to it.
    fn put(&self, file_name: &str, data: &[u8]) -> Result<ImageReference>;

    /// Whether `file_name` has been stored.
    fn contains(&self, file_name: &str) -> bool;
}

/// Flat-directory image store. Files are served under `url_prefix`.
///
/// Layout: `<root>/<file_name>`
pub struct FsImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl FsImageStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>, url_prefix: impl Into<String>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Reject names that could escape the store directory.
pub(crate) fn check_file_name(file_name: &str) -> Result<()> {
    let bad = file_name.is_empty()
        || file_name == "."
        || file_name.contains("..")
        || file_name.contains('/')
        || file_name.contains('\\');
    if bad {
        return Err(StoreError::InvalidFileName(file_name.to_string()));
    }
    Ok(())
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

impl ImageStore for FsImageStore {
    fn put(&self, file_name: &str, data: &[u8]) -> Result<ImageReference> {
        check_file_name(file_name)?;
        let path = self.root.join(file_name);

        // Write to a temp file in the same directory, then rename into place.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(ImageReference {
            path,
            url: format!("{}/{}", self.url_prefix, file_name),
            sha256: sha256_hex(data),
            size_bytes: data.len() as u64,
        })
    }

    fn contains(&self, file_name: &str) -> bool {
        check_file_name(file_name).is_ok() && self.root.join(file_name).is_file()
    }
}
