//! Dataset Module
//! The uploaded table, its column kinds and in-place coercions.

use crate::error::{LoaderError, RenderHalt, RenderResult};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;

/// Inferred kind of a column, as far as charting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
    Categorical,
    Other,
}

/// Columns in the same family can share an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonFamily {
    Numeric,
    Textual,
    Temporal,
    Other,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Boolean
            | DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Numeric,
            DataType::String => ColumnKind::Text,
            DataType::Date | DataType::Datetime(..) | DataType::Time => ColumnKind::Date,
            DataType::Categorical(..) | DataType::Enum(..) => ColumnKind::Categorical,
            _ => ColumnKind::Other,
        }
    }

    pub fn family(&self) -> ComparisonFamily {
        match self {
            ColumnKind::Numeric => ComparisonFamily::Numeric,
            ColumnKind::Text | ColumnKind::Categorical => ComparisonFamily::Textual,
            ColumnKind::Date => ComparisonFamily::Temporal,
            ColumnKind::Other => ComparisonFamily::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
            ColumnKind::Categorical => "category",
            ColumnKind::Other => "other",
        }
    }
}

/// A column name known to exist in the dataset it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef(String);

impl ColumnRef {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, uniquely named columns of one uploaded file.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub fn new(df: DataFrame) -> Result<Self, LoaderError> {
        if df.width() == 0 {
            return Err(LoaderError::NoColumns);
        }
        let mut seen = HashSet::new();
        for name in df.get_column_names() {
            if !seen.insert(name.to_string()) {
                return Err(LoaderError::DuplicateColumn(name.to_string()));
            }
        }
        Ok(Self { df })
    }

    /// Wrap a row subset of this dataset. Columns are unchanged so no re-check.
    pub(crate) fn derived(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Resolve a user-selected name, rejecting dangling references.
    pub fn column_ref(&self, name: &str) -> RenderResult<ColumnRef> {
        if self.contains(name) {
            Ok(ColumnRef(name.to_string()))
        } else {
            Err(RenderHalt::UnknownColumn {
                column: name.to_string(),
            })
        }
    }

    pub fn column(&self, column: &ColumnRef) -> RenderResult<&Column> {
        Ok(self.df.column(column.name())?)
    }

    pub fn kind(&self, column: &ColumnRef) -> ColumnKind {
        self.df
            .column(column.name())
            .map(|c| ColumnKind::from_dtype(c.dtype()))
            .unwrap_or(ColumnKind::Other)
    }

    /// Fail with `MixedFormatType` unless every column shares a comparison family.
    pub fn ensure_comparable(&self, columns: &[ColumnRef]) -> RenderResult<()> {
        let kinds: Vec<(String, ColumnKind)> = columns
            .iter()
            .map(|c| (c.name().to_string(), self.kind(c)))
            .collect();

        let families: HashSet<ComparisonFamily> = kinds.iter().map(|(_, k)| k.family()).collect();
        if families.len() <= 1 {
            return Ok(());
        }

        Err(RenderHalt::MixedFormatType {
            columns: kinds
                .into_iter()
                .map(|(name, kind)| format!("{} ({})", name, kind.label()))
                .collect(),
        })
    }

    /// Number of distinct values (nulls count as one value).
    pub fn cardinality(&self, column: &ColumnRef) -> RenderResult<usize> {
        Ok(self.column(column)?.as_materialized_series().n_unique()?)
    }

    /// Replace a column by one of the same name, keeping its position.
    pub fn replace_column(&mut self, series: Series) -> RenderResult<()> {
        if !self.contains(series.name().as_str()) {
            return Err(RenderHalt::UnknownColumn {
                column: series.name().to_string(),
            });
        }
        self.df.with_column(series)?;
        Ok(())
    }

    /// Reinterpret a column as a categorical label set, in place.
    ///
    /// Values go through their string form first, so numbers, dates and
    /// booleans all become labels. Nested types cannot be labelled.
    pub fn coerce_to_categorical(&mut self, column: &ColumnRef) -> RenderResult<()> {
        let current = self.column(column)?;
        if self.kind(column) == ColumnKind::Categorical {
            return Ok(());
        }
        if current.dtype().is_nested() {
            return Err(RenderHalt::NotCategorical {
                column: column.name().to_string(),
                reason: format!("{} values have no label form", current.dtype()),
            });
        }

        let not_categorical = |e: PolarsError| RenderHalt::NotCategorical {
            column: column.name().to_string(),
            reason: e.to_string(),
        };

        let categorical = current
            .cast(&DataType::String)
            .and_then(|c| c.cast(&DataType::Categorical(None, Default::default())))
            .map_err(not_categorical)?;

        log::debug!("Coerced column '{}' to categorical", column);
        self.replace_column(categorical.as_materialized_series().clone())
    }

    /// Keep only the rows where `mask` is true; order is preserved.
    pub fn filter_rows(&self, mask: &BooleanChunked) -> RenderResult<Dataset> {
        Ok(Dataset::derived(self.df.filter(mask)?))
    }

    /// First `n` rows, for the uploaded-file preview.
    pub fn preview(&self, n: usize) -> DataFrame {
        self.df.head(Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df!(
            "date" => ["2024-01-01", "2024-01-02", "2024-01-03"],
            "sales" => [10i64, 20, 30],
            "price" => [1.5f64, 2.5, 3.5],
            "region" => ["north", "south", "north"]
        )
        .unwrap();
        Dataset::new(df).unwrap()
    }

    #[test]
    fn test_column_names_keep_file_order() {
        let ds = sample();
        assert_eq!(ds.column_names(), vec!["date", "sales", "price", "region"]);
        assert_eq!(ds.height(), 3);
    }

    #[test]
    fn test_column_ref_rejects_dangling_name() {
        let ds = sample();
        assert!(ds.column_ref("sales").is_ok());
        let err = ds.column_ref("profit").unwrap_err();
        assert!(matches!(err, RenderHalt::UnknownColumn { column } if column == "profit"));
    }

    #[test]
    fn test_kinds() {
        let ds = sample();
        let kind = |n: &str| ds.kind(&ds.column_ref(n).unwrap());
        assert_eq!(kind("sales"), ColumnKind::Numeric);
        assert_eq!(kind("price"), ColumnKind::Numeric);
        assert_eq!(kind("region"), ColumnKind::Text);
    }

    #[test]
    fn test_ensure_comparable() {
        let ds = sample();
        let refs = |names: &[&str]| -> Vec<ColumnRef> {
            names.iter().map(|n| ds.column_ref(n).unwrap()).collect()
        };
        assert!(ds.ensure_comparable(&refs(&["sales", "price"])).is_ok());
        assert!(ds.ensure_comparable(&refs(&["date", "region"])).is_ok());

        let err = ds.ensure_comparable(&refs(&["sales", "region"])).unwrap_err();
        match err {
            RenderHalt::MixedFormatType { columns } => {
                assert_eq!(columns, vec!["sales (numeric)", "region (text)"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_coerce_to_categorical_in_place() {
        let mut ds = sample();
        let price = ds.column_ref("price").unwrap();
        ds.coerce_to_categorical(&price).unwrap();
        assert_eq!(ds.kind(&price), ColumnKind::Categorical);
        // position unchanged
        assert_eq!(ds.column_names()[2], "price");
        assert_eq!(ds.cardinality(&price).unwrap(), 3);
    }

    #[test]
    fn test_coerce_nested_column_fails() {
        let inner = Series::new("v".into(), [1i32, 2]);
        let list = Series::new("nested".into(), [inner.clone(), inner]);
        let df = DataFrame::new(vec![list.into_column()]).unwrap();
        let mut ds = Dataset::new(df).unwrap();
        let nested = ds.column_ref("nested").unwrap();

        let err = ds.coerce_to_categorical(&nested).unwrap_err();
        assert!(matches!(err, RenderHalt::NotCategorical { .. }));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let result = Dataset::new(DataFrame::empty());
        assert!(matches!(result, Err(LoaderError::NoColumns)));
    }
}
