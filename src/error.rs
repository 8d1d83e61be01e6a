//! Error Types
//! Failure kinds that halt a render pass, plus loader/config/export errors.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Reason a render pass stopped before producing a chart.
///
/// None of these are fatal to the process: the pass is abandoned, the
/// message is shown, and the next change of selection starts a fresh pass.
#[derive(Error, Debug)]
pub enum RenderHalt {
    #[error("No dataset uploaded")]
    MissingInput,
    #[error("Column '{column}' is not a valid date column (could not parse '{value}')")]
    InvalidDateFormat { column: String, value: String },
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("Selected columns have mixed format types: {}", .columns.join(", "))]
    MixedFormatType { columns: Vec<String> },
    #[error("Column '{column}' cannot be viewed as a category: {reason}")]
    NotCategorical { column: String, reason: String },
    #[error("Column '{column}' does not exist in the current dataset")]
    UnknownColumn { column: String },
    #[error("Incomplete selection: {0}")]
    Selection(String),
    #[error("Data engine error: {0}")]
    Polars(#[from] PolarsError),
}

/// How a halted pass is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Whole interaction waits for user input (nothing uploaded yet).
    Prompt,
    /// Only the current chart is abandoned.
    Warning,
}

impl RenderHalt {
    pub fn severity(&self) -> Severity {
        match self {
            RenderHalt::MissingInput => Severity::Prompt,
            _ => Severity::Warning,
        }
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderHalt::MissingInput => "missing_input",
            RenderHalt::InvalidDateFormat { .. } => "invalid_date_format",
            RenderHalt::InvalidDateRange { .. } => "invalid_date_range",
            RenderHalt::MixedFormatType { .. } => "mixed_format_type",
            RenderHalt::NotCategorical { .. } => "not_categorical",
            RenderHalt::UnknownColumn { .. } => "unknown_column",
            RenderHalt::Selection(_) => "selection",
            RenderHalt::Polars(_) => "engine",
        }
    }

    /// Text shown to the user in place of the chart.
    pub fn user_message(&self) -> String {
        match self {
            RenderHalt::MissingInput => {
                "Please upload a file before we can continue.".to_string()
            }
            RenderHalt::InvalidDateFormat { column, value } => format!(
                "The column '{}' does not have a valid date format ('{}' could not be read). \
                 Please make sure the format of the column's values is ISO8601.",
                column, value
            ),
            RenderHalt::InvalidDateRange { .. } => "Please select dates that are valid.".to_string(),
            RenderHalt::MixedFormatType { columns } => format!(
                "One of the variables has a different format type ({}). \
                 Please remove the variable to continue.",
                columns.join(", ")
            ),
            RenderHalt::NotCategorical { column, .. } => format!(
                "The variable '{}' cannot be viewed as a category.",
                column
            ),
            RenderHalt::UnknownColumn { column } => format!(
                "The variable '{}' is not part of the uploaded file. Please select another one.",
                column
            ),
            RenderHalt::Selection(msg) => msg.clone(),
            RenderHalt::Polars(e) => format!("Unable to prepare the chart: {}", e),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Duplicate column name '{0}' in header")]
    DuplicateColumn(String),
    #[error("The file has no columns")]
    NoColumns,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Nothing to export: {0}")]
    Empty(String),
}

pub type RenderResult<T> = std::result::Result<T, RenderHalt>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_prompt() {
        assert_eq!(RenderHalt::MissingInput.severity(), Severity::Prompt);
        assert_eq!(
            RenderHalt::NotCategorical {
                column: "a".into(),
                reason: "x".into()
            }
            .severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_user_messages_name_the_column() {
        let halt = RenderHalt::InvalidDateFormat {
            column: "when".into(),
            value: "yesterday".into(),
        };
        let msg = halt.user_message();
        assert!(msg.contains("when"));
        assert!(msg.contains("ISO8601"));

        let halt = RenderHalt::MixedFormatType {
            columns: vec!["a (numeric)".into(), "b (text)".into()],
        };
        assert!(halt.user_message().contains("different format type"));
        assert_eq!(halt.kind(), "mixed_format_type");
    }
}
