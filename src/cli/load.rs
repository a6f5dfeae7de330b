use std::path::PathBuf;

use crate::error::{Result, WargaError};
use crate::settings::{db_path, load_settings, save_settings, shellexpand_path};

pub fn run(path: &str) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));
    let db = db_path(&resolved);

    if !db.exists() {
        return Err(WargaError::Settings(format!(
            "No database found at {}\nRun `warga init --data-dir {}` to create one.",
            db.display(),
            resolved.display()
        )));
    }

    let mut settings = load_settings();
    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Switched to {}", resolved.display());
    Ok(())
}
