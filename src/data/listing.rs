// ============================================================
// Layer 4 — Directory Listing
// ============================================================
// Both the XML corpus loader and the context extractor walk a
// single directory level looking for files by extension.
// Entries are returned sorted by file name so the order of
// records and candidates does not depend on the filesystem.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

/// True when `path` ends in one of `extensions` (ASCII case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|want| e.eq_ignore_ascii_case(want)))
        .unwrap_or(false)
}

/// Regular files directly inside `dir` whose extension is one of `extensions`.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// File name of `path` as UTF-8, for use in candidate sources and logs.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
