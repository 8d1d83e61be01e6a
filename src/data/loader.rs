//! CSV Data Loader Module
//! Handles CSV file loading using Polars.

use crate::data::Dataset;
use crate::error::LoaderError;
use polars::prelude::*;
use std::path::Path;

/// Suffix Polars appends when a header name repeats.
const DUPLICATE_MARKER: &str = "_duplicated_";

/// Name given to an unnamed leading index column once it is reset.
const RESET_INDEX_NAME: &str = "index";

/// Placeholder Polars gives a blank first header.
const BLANK_FIRST_HEADER: &str = "column_1";

/// Reads comma-separated files into a [`Dataset`].
pub struct DataLoader {
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(10000)
    }
}

impl DataLoader {
    pub fn new(infer_schema_length: usize) -> Self {
        Self {
            infer_schema_length,
        }
    }

    /// Load a CSV file with a header row.
    ///
    /// The leading column is the file's row index. It is reset to an
    /// ordinary column (named `index` when its header is blank) and rows
    /// are addressed positionally from then on. Repeated headers are
    /// renamed `name.1`, `name.2`, ...
    pub fn load_csv(&self, file_path: &Path) -> Result<Dataset, LoaderError> {
        let mut df = self.read(file_path, Some(self.infer_schema_length))?;
        self.report_dropped_cells(file_path, &df);

        Self::rename_duplicates(&mut df)?;
        Self::reset_index(&mut df)?;

        log::info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        Dataset::new(df)
    }

    /// `Some(0)` reads every column as text.
    fn read(&self, file_path: &Path, infer: Option<usize>) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(infer)
            .with_ignore_errors(true)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Cells that do not fit the inferred column type are read as null.
    /// Re-read the file as text and log how many cells that cost per column.
    fn report_dropped_cells(&self, file_path: &Path, typed: &DataFrame) {
        let raw = match self.read(file_path, Some(0)) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("Skipping dropped-cell check for {}: {}", file_path.display(), e);
                return;
            }
        };

        for (name, count) in dropped_cells(&raw, typed) {
            log::warn!(
                "{}: {} value(s) in column '{}' did not match its inferred type and were read as empty",
                file_path.display(),
                count,
                name
            );
        }
    }

    /// Polars renames a repeated header to `name_duplicated_N`. Rename it
    /// to `name.{N+1}` instead, skipping names already taken.
    fn rename_duplicates(df: &mut DataFrame) -> Result<(), LoaderError> {
        let mut names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for i in 0..names.len() {
            let Some((base, counter)) = split_duplicate(&names[i]) else {
                continue;
            };
            if !names.iter().any(|n| n == base) {
                continue;
            }
            let base = base.to_string();
            let mut n = counter + 1;
            let mut renamed = format!("{}.{}", base, n);
            while names.iter().any(|existing| *existing == renamed) {
                n += 1;
                renamed = format!("{}.{}", base, n);
            }
            log::warn!("Repeated column '{}' renamed to '{}'", base, renamed);
            df.rename(&names[i], renamed.as_str().into())?;
            names[i] = renamed;
        }
        Ok(())
    }

    fn reset_index(df: &mut DataFrame) -> Result<(), LoaderError> {
        let first = match df.get_column_names().first() {
            Some(name) => name.to_string(),
            None => return Err(LoaderError::NoColumns),
        };
        let blank = first.trim().is_empty() || first == BLANK_FIRST_HEADER;
        if blank && df.get_column_index(RESET_INDEX_NAME).is_none() {
            df.rename(&first, RESET_INDEX_NAME.into())?;
        }
        Ok(())
    }
}

/// `("a", 0)` for `a_duplicated_0`.
fn split_duplicate(name: &str) -> Option<(&str, usize)> {
    let pos = name.rfind(DUPLICATE_MARKER)?;
    let counter = name[pos + DUPLICATE_MARKER.len()..].parse().ok()?;
    Some((&name[..pos], counter))
}

/// Per column, cells present in the text read but null in the typed read.
fn dropped_cells(raw: &DataFrame, typed: &DataFrame) -> Vec<(String, usize)> {
    typed
        .get_columns()
        .iter()
        .filter_map(|column| {
            let raw_column = raw.column(column.name()).ok()?;
            let present = raw_column.as_materialized_series().is_not_null();
            let missing = column.as_materialized_series().is_null();
            let lost = &present & &missing;
            let count = lost.into_iter().filter(|v| *v == Some(true)).count();
            (count > 0).then(|| (column.name().to_string(), count))
        })
        .collect()
}
