use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{Result, WargaError};

pub const UPLOADS_DIR: &str = "uploads";

pub fn uploads_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(UPLOADS_DIR)
}

fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Copy a proof-of-payment image into the uploads directory and return the
/// stored file name. Identical files map to the same name.
pub fn store_proof(data_dir: &Path, source: &Path) -> Result<String> {
    if !source.is_file() {
        return Err(WargaError::NotFound(format!("Proof image {}", source.display())));
    }
    let data = std::fs::read(source)?;
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    let file_name = format!("proof-{}.{ext}", &content_hash(&data)[..16]);

    let dir = uploads_dir(data_dir);
    std::fs::create_dir_all(&dir)?;
    let dest = dir.join(&file_name);
    if !dest.exists() {
        std::fs::write(&dest, &data)?;
        tracing::info!(file = %file_name, bytes = data.len(), "stored proof image");
    }
    Ok(file_name)
}
