//! Container persistence with randomized file names.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// Writes a container under `dir` with a randomized name and returns the
/// path. The directory is created on first use.
pub fn save_container(dir: &Path, container: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("{}.wav", Uuid::new_v4()));
    fs::write(&path, container)?;

    info!("Recording saved to {}", path.display());
    Ok(path)
}
