//! Data module - CSV loading, dataset model, dates and session state

mod dataset;
mod dates;
mod loader;
mod session;

pub use dataset::{ColumnKind, ColumnRef, ComparisonFamily, Dataset};
pub use dates::{
    filter_by_date_range, from_millis, parse_date_value, to_millis, validate_date_column,
    DateColumn, DateFilter,
};
pub use loader::DataLoader;
pub use session::SessionStore;
