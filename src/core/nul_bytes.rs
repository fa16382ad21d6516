use std::path::{Path, PathBuf};

/// True if the file contains a 0x00 byte. Unreadable files count as clean.
pub fn file_has_nul(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => bytes.contains(&0u8),
        Err(e) => {
            tracing::debug!("Skipping {}: {}", path.display(), e);
            false
        }
    }
}

/// Offending files, in argument order.
pub fn check_files<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| file_has_nul(p))
        .map(Path::to_path_buf)
        .collect()
}
