//! Date Handling Module
//! Fixed ISO-8601 date profile, date column validation and date-range filtering.

use crate::data::dataset::{ColumnRef, Dataset};
use crate::error::{RenderHalt, RenderResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Date-time layouts accepted after the `YYYY-MM-DD` part.
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Same layouts with a trailing UTC offset.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%:z",
];

/// Parse one cell under the fixed profile: year-month-day, optional time,
/// optional `Z`/offset (normalised to UTC).
pub fn parse_date_value(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_utc());
        }
    }
    None
}

pub fn to_millis(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

pub fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// A column whose every non-null value parsed under the date profile.
#[derive(Debug, Clone)]
pub struct DateColumn {
    column: ColumnRef,
    values: Vec<Option<NaiveDateTime>>,
    min: NaiveDateTime,
    max: NaiveDateTime,
}

impl DateColumn {
    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    pub fn values(&self) -> &[Option<NaiveDateTime>] {
        &self.values
    }

    pub fn min(&self) -> NaiveDateTime {
        self.min
    }

    pub fn max(&self) -> NaiveDateTime {
        self.max
    }

    pub fn min_date(&self) -> NaiveDate {
        self.min.date()
    }

    pub fn max_date(&self) -> NaiveDate {
        self.max.date()
    }

    /// Millisecond datetime series carrying the column's name.
    pub fn to_series(&self) -> RenderResult<Series> {
        let millis: Vec<Option<i64>> = self.values.iter().map(|v| v.map(to_millis)).collect();
        let series = Series::new(self.column.name().into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        Ok(series)
    }
}

/// Validate that `column` holds dates under the fixed profile.
///
/// Null cells are missing values and are kept as such. A single
/// unparseable value rejects the whole column.
pub fn validate_date_column(dataset: &Dataset, column: &ColumnRef) -> RenderResult<DateColumn> {
    let col = dataset.column(column)?;

    let values = match col.dtype() {
        DataType::Date | DataType::Datetime(..) => {
            let millis = col
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            let parsed: Vec<Option<NaiveDateTime>> = millis
                .i64()?
                .into_iter()
                .map(|v| v.and_then(from_millis))
                .collect();
            parsed
        }
        DataType::String | DataType::Categorical(..) | DataType::Enum(..) => {
            let text = col.cast(&DataType::String)?;
            let mut parsed = Vec::with_capacity(text.len());
            for value in text.str()?.into_iter() {
                match value {
                    None => parsed.push(None),
                    Some(raw) => match parse_date_value(raw) {
                        Some(dt) => parsed.push(Some(dt)),
                        None => {
                            return Err(RenderHalt::InvalidDateFormat {
                                column: column.name().to_string(),
                                value: raw.to_string(),
                            })
                        }
                    },
                }
            }
            parsed
        }
        _ => {
            let text = col.cast(&DataType::String)?;
            let first = text
                .str()?
                .into_iter()
                .flatten()
                .next()
                .unwrap_or_default()
                .to_string();
            return Err(RenderHalt::InvalidDateFormat {
                column: column.name().to_string(),
                value: first,
            });
        }
    };

    let min = values.iter().flatten().min().copied();
    let max = values.iter().flatten().max().copied();
    match (min, max) {
        (Some(min), Some(max)) => Ok(DateColumn {
            column: column.clone(),
            values,
            min,
            max,
        }),
        _ => Err(RenderHalt::InvalidDateFormat {
            column: column.name().to_string(),
            value: "(no values)".to_string(),
        }),
    }
}

/// Inclusive calendar-date window over one date column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilter {
    pub column: ColumnRef,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateFilter {
    /// Clamp both bounds to the column's observed range. Missing bounds
    /// default to the column's min and max.
    pub fn new(
        date_column: &DateColumn,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RenderResult<Self> {
        let (lo, hi) = (date_column.min_date(), date_column.max_date());
        let start = start.unwrap_or(lo).clamp(lo, hi);
        let end = end.unwrap_or(hi).clamp(lo, hi);

        if start > end {
            return Err(RenderHalt::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            column: date_column.column().clone(),
            start,
            end,
        })
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        let day = value.date();
        self.start <= day && day <= self.end
    }

    /// Rows whose date falls inside the window, in original order.
    pub fn apply(&self, dataset: &Dataset, date_column: &DateColumn) -> RenderResult<Dataset> {
        if date_column.values().len() != dataset.height() {
            return Err(RenderHalt::Selection(format!(
                "date column '{}' no longer matches the dataset",
                self.column
            )));
        }

        let mask: BooleanChunked = date_column
            .values()
            .iter()
            .map(|v| v.is_some_and(|dt| self.contains(dt)))
            .collect();

        let subset = dataset.filter_rows(&mask)?;
        log::debug!(
            "Date filter {}..={} on '{}' kept {}/{} rows",
            self.start,
            self.end,
            self.column,
            subset.height(),
            dataset.height()
        );
        Ok(subset)
    }
}

/// Clamp `start`/`end` to the column's range and keep the rows inside it.
pub fn filter_by_date_range(
    dataset: &Dataset,
    date_column: &DateColumn,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> RenderResult<Dataset> {
    DateFilter::new(date_column, start, end)?.apply(dataset, date_column)
}
