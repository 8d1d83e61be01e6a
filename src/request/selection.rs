//! Selection State
//! Flat set of user choices, re-evaluated from scratch on every change.

use crate::request::types::{BarMode, HistogramVariant};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Individual selection is locked while 'select all' is active")]
pub struct SelectionLocked;

/// Multi-column choice with an all-columns toggle.
///
/// While the toggle is on the resolved set is every option, in order, and
/// individual changes are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSelect {
    select_all: bool,
    chosen: Option<Vec<String>>,
}

impl MultiSelect {
    pub fn with_chosen(chosen: Vec<String>) -> Self {
        Self {
            select_all: false,
            chosen: Some(chosen),
        }
    }

    pub fn is_select_all(&self) -> bool {
        self.select_all
    }

    pub fn set_select_all(&mut self, on: bool) {
        self.select_all = on;
    }

    /// Columns picked by hand, `None` until the user first changes them.
    pub fn chosen(&self) -> Option<&[String]> {
        self.chosen.as_deref()
    }

    pub fn set_chosen(&mut self, chosen: Vec<String>) -> Result<(), SelectionLocked> {
        if self.select_all {
            return Err(SelectionLocked);
        }
        self.chosen = Some(chosen);
        Ok(())
    }

    pub fn select(&mut self, name: &str) -> Result<(), SelectionLocked> {
        if self.select_all {
            return Err(SelectionLocked);
        }
        let chosen = self.chosen.get_or_insert_with(Vec::new);
        if !chosen.iter().any(|c| c == name) {
            chosen.push(name.to_string());
        }
        Ok(())
    }

    pub fn deselect(&mut self, name: &str) -> Result<(), SelectionLocked> {
        if self.select_all {
            return Err(SelectionLocked);
        }
        if let Some(chosen) = &mut self.chosen {
            chosen.retain(|c| c != name);
        }
        Ok(())
    }

    /// Check or uncheck one column. The first edit starts from `shown`, the
    /// set the widget displayed while the selection was untouched.
    pub fn toggle(
        &mut self,
        name: &str,
        checked: bool,
        shown: &[String],
    ) -> Result<(), SelectionLocked> {
        if self.chosen.is_none() {
            self.set_chosen(shown.to_vec())?;
        }
        if checked {
            self.select(name)
        } else {
            self.deselect(name)
        }
    }

    /// Resolve against the current options. An untouched selection falls
    /// back to the option at `default_index` (or the last one).
    pub fn resolve(&self, options: &[String], default_index: usize) -> Vec<String> {
        if self.select_all {
            return options.to_vec();
        }
        match &self.chosen {
            Some(chosen) => chosen.clone(),
            None => options
                .get(default_index)
                .or_else(|| options.last())
                .cloned()
                .into_iter()
                .collect(),
        }
    }
}

/// Chart family picked in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotFamily {
    Scatter,
    Timeline,
    Histogram,
    Categorical,
}

impl PlotFamily {
    pub const ALL: [PlotFamily; 4] = [
        PlotFamily::Scatter,
        PlotFamily::Timeline,
        PlotFamily::Histogram,
        PlotFamily::Categorical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlotFamily::Scatter => "Scatter Plot",
            PlotFamily::Timeline => "Timeline",
            PlotFamily::Histogram => "Histogram",
            PlotFamily::Categorical => "Categorical Variables Charts",
        }
    }
}

/// `None` column fields mean "the widget default" (first or second column).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScatterSelection {
    pub x: Option<String>,
    pub y: Option<String>,
    pub three_d: bool,
    pub z: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineSelection {
    pub x: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub y: MultiSelect,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistogramSelection {
    pub variant: HistogramVariant,
    pub x: Option<String>,
    pub columns: MultiSelect,
    pub mode: BarMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoricalSelection {
    pub x: Option<String>,
    pub y: Option<String>,
    pub mode: BarMode,
    pub dates_only: bool,
    pub date_column: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub pie_confirmed: bool,
}

impl CategoricalSelection {
    /// Same choices ignoring the pie confirmation flag.
    pub fn same_charts(&self, other: &Self) -> bool {
        Self {
            pie_confirmed: false,
            ..self.clone()
        } == Self {
            pie_confirmed: false,
            ..other.clone()
        }
    }
}

/// Everything the sidebar holds. No hidden transitions: each render pass
/// reads the fields as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub plot: Option<PlotFamily>,
    pub scatter: ScatterSelection,
    pub timeline: TimelineSelection,
    pub histogram: HistogramSelection,
    pub categorical: CategoricalSelection,
}
