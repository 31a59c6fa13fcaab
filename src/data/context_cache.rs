// ============================================================
// Layer 4 — Context Cache
// ============================================================
// Extraction reads and parses every JSON file in a directory,
// so results are memoised per directory. The cache is a plain
// owned value: the caller decides how long it lives and can
// drop entries explicitly. Entries are never refreshed when
// files change on disk.

use std::{collections::HashMap, path::{Path, PathBuf}};

use crate::data::context_extractor::{extract_from_dir, ExtractLimits};
use crate::domain::candidate::ContextCandidate;

/// Memoised candidate lists keyed by directory path.
#[derive(Debug, Default)]
pub struct ContextCache {
    entries: HashMap<PathBuf, Vec<ContextCandidate>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates for `dir`, extracting them with `limits` on first access.
    /// Later calls return the stored list whatever limits they pass.
    pub fn get_or_load(&mut self, dir: &Path, limits: ExtractLimits) -> &[ContextCandidate] {
        self.entries
            .entry(dir.to_path_buf())
            .or_insert_with(|| {
                tracing::debug!("Context cache miss for '{}'", dir.display());
                extract_from_dir(dir, limits)
            })
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.entries.contains_key(dir)
    }

    /// Forget the entry for `dir`; the next access re-reads the directory.
    pub fn invalidate(&mut self, dir: &Path) -> bool {
        self.entries.remove(dir).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_passages(dir: &Path, passages: &[&str]) {
        fs::write(dir.join("passages.json"), serde_json::to_string(passages).unwrap()).unwrap();
    }

    #[test]
    fn test_second_access_is_identical_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        write_passages(dir.path(), &[
            "Tome paracetamol a cada 8 horas por três dias.",
            "Repouso e hidratação abundante durante a recuperação.",
        ]);

        let mut cache = ContextCache::new();
        let first     = cache.get_or_load(dir.path(), ExtractLimits::default()).to_vec();
        assert!(cache.contains(dir.path()));

        // Files changing on disk are not picked up while the entry lives
        fs::remove_file(dir.path().join("passages.json")).unwrap();
        let second = cache.get_or_load(dir.path(), ExtractLimits::default()).to_vec();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        write_passages(dir.path(), &["Tome paracetamol a cada 8 horas por três dias."]);

        let mut cache = ContextCache::new();
        assert_eq!(cache.get_or_load(dir.path(), ExtractLimits::default()).len(), 1);

        write_passages(dir.path(), &[
            "Tome paracetamol a cada 8 horas por três dias.",
            "Repouso e hidratação abundante durante a recuperação.",
        ]);
        assert!(cache.invalidate(dir.path()));
        assert!(!cache.invalidate(dir.path()));
        assert_eq!(cache.get_or_load(dir.path(), ExtractLimits::default()).len(), 2);

        cache.clear();
        assert!(!cache.contains(dir.path()));
    }

    #[test]
    fn test_missing_directory_is_cached_as_empty() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("modelo_treinado");

        let mut cache = ContextCache::new();
        assert!(cache.get_or_load(&missing, ExtractLimits::default()).is_empty());
        assert!(cache.contains(&missing));
    }
}
