use std::path::{Path, PathBuf};

use crate::tally::*;

pub fn simplify_file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lists the `.csv` files of a directory, sorted by name.
///
/// A directory that does not exist has no files.
pub fn list_csv_files(dir: &Path) -> TallyResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("list_csv_files: {} is not a directory", dir.display());
        return Ok(vec![]);
    }
    let path = dir.display().to_string();
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).context(ReadingDirectorySnafu { path: path.clone() })? {
        let entry = entry.context(ReadingDirectorySnafu { path: path.clone() })?;
        let p = entry.path();
        if p.is_file() && p.extension().map_or(false, |ext| ext == "csv") {
            files.push(p);
        }
    }
    files.sort();
    debug!("list_csv_files: {} files in {}", files.len(), path);
    Ok(files)
}
