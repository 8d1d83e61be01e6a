//! Session Store
//! Holds the dataset of the current upload for the lifetime of the session.

use crate::data::Dataset;
use crate::error::{RenderHalt, RenderResult};
use std::path::{Path, PathBuf};

/// Single-writer store for the uploaded dataset.
///
/// An upload replaces the dataset wholesale. Render passes only read it and
/// coerce columns on a copy of their own.
#[derive(Default)]
pub struct SessionStore {
    dataset: Option<Dataset>,
    source: Option<PathBuf>,
    generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly uploaded dataset, discarding the previous one.
    pub fn replace(&mut self, dataset: Dataset, source: Option<PathBuf>) {
        if let Some(old) = &self.dataset {
            log::info!(
                "Replacing dataset ({} rows) with new upload ({} rows)",
                old.height(),
                dataset.height()
            );
        }
        self.dataset = Some(dataset);
        self.source = source;
        self.generation += 1;
    }

    pub fn clear(&mut self) {
        if self.dataset.take().is_some() {
            log::info!("Session dataset cleared");
            self.generation += 1;
        }
        self.source = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    /// Bumped on every replace/clear, so views can drop derived data.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn dataset(&self) -> RenderResult<&Dataset> {
        self.dataset.as_ref().ok_or(RenderHalt::MissingInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset(rows: usize) -> Dataset {
        let values: Vec<i64> = (0..rows as i64).collect();
        Dataset::new(df!("v" => values).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_session_is_missing_input() {
        let session = SessionStore::new();
        assert!(matches!(session.dataset(), Err(RenderHalt::MissingInput)));
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_upload_replaces_wholesale() {
        let mut session = SessionStore::new();
        session.replace(dataset(3), Some(PathBuf::from("a.csv")));
        let first_gen = session.generation();
        session.replace(dataset(5), Some(PathBuf::from("b.csv")));

        assert_eq!(session.dataset().unwrap().height(), 5);
        assert_eq!(session.source(), Some(Path::new("b.csv")));
        assert!(session.generation() > first_gen);
    }

    #[test]
    fn test_clear() {
        let mut session = SessionStore::new();
        session.replace(dataset(2), None);
        session.clear();
        assert!(session.dataset().is_err());
        assert_eq!(session.source(), None);
    }
}
