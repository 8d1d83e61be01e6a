//! Chart Request Types
//! Chart kinds, composition modes and the normalized request handed to rendering.

use crate::data::{ColumnRef, Dataset, DateFilter};
use crate::error::RenderResult;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter2d,
    Scatter3d,
    Timeseries,
    HistogramUnivariate,
    HistogramMultivariate,
    Bar,
    Pie,
}

impl ChartKind {
    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Scatter2d => "Scatter Plot",
            ChartKind::Scatter3d => "3D Scatter Plot",
            ChartKind::Timeseries => "Line Chart",
            ChartKind::HistogramUnivariate => "Univariate Histogram",
            ChartKind::HistogramMultivariate => "Multivariate Histogram",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Pie => "Pie Chart",
        }
    }
}

/// How several series share the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarMode {
    #[default]
    Relative,
    Group,
    Overlay,
    Stack,
}

impl BarMode {
    pub const ALL: [BarMode; 4] = [
        BarMode::Relative,
        BarMode::Group,
        BarMode::Overlay,
        BarMode::Stack,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BarMode::Relative => "relative",
            BarMode::Group => "group",
            BarMode::Overlay => "overlay",
            BarMode::Stack => "stack",
        }
    }

    /// Relative and stack both pile series on top of each other.
    pub fn is_stacked(&self) -> bool {
        matches!(self, BarMode::Relative | BarMode::Stack)
    }
}

impl fmt::Display for BarMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistogramVariant {
    #[default]
    Univariate,
    Multivariate,
}

impl HistogramVariant {
    pub fn label(&self) -> &'static str {
        match self {
            HistogramVariant::Univariate => "Univariate",
            HistogramVariant::Multivariate => "Multivariate",
        }
    }
}

/// One column or an ordered set of columns bound to an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    One(ColumnRef),
    Many(Vec<ColumnRef>),
}

impl Binding {
    pub fn columns(&self) -> Vec<&ColumnRef> {
        match self {
            Binding::One(c) => vec![c],
            Binding::Many(cs) => cs.iter().collect(),
        }
    }
}

/// Normalized description of one chart: kind plus column bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: Binding,
    pub y: Option<Binding>,
    pub z: Option<ColumnRef>,
    pub mode: Option<BarMode>,
    pub date_filter: Option<DateFilter>,
}

impl ChartRequest {
    pub fn new(kind: ChartKind, x: Binding) -> Self {
        Self {
            kind,
            x,
            y: None,
            z: None,
            mode: None,
            date_filter: None,
        }
    }

    pub fn with_y(mut self, y: Binding) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_z(mut self, z: Option<ColumnRef>) -> Self {
        self.z = z;
        self
    }

    pub fn with_mode(mut self, mode: BarMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_date_filter(mut self, filter: Option<DateFilter>) -> Self {
        self.date_filter = filter;
        self
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// Every column the request refers to, x first.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut cols = self.x.columns();
        if let Some(y) = &self.y {
            cols.extend(y.columns());
        }
        if let Some(z) = &self.z {
            cols.push(z);
        }
        if let Some(f) = &self.date_filter {
            cols.push(&f.column);
        }
        cols
    }

    /// Re-check every reference against `dataset`.
    pub fn validate_against(&self, dataset: &Dataset) -> RenderResult<()> {
        for column in self.columns() {
            dataset.column_ref(column.name())?;
        }
        Ok(())
    }
}

/// A request together with the data subset it is drawn from.
#[derive(Debug, Clone)]
pub struct PreparedChart {
    pub request: ChartRequest,
    pub data: Dataset,
}

/// Why the pie chart asks for confirmation before it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieAdvisory {
    pub categories: usize,
    pub threshold: usize,
    pub values_numeric: bool,
}

impl PieAdvisory {
    /// High-cardinality labels or non-numeric values make the pie expensive.
    pub fn is_heavy(&self) -> bool {
        self.categories > self.threshold || !self.values_numeric
    }

    pub fn message(&self) -> String {
        let mut msg = String::from(
            "Remember that the pie chart can be computationally intensive, especially if \
             both the x variable and the variable selected for values are not categorical!",
        );
        if self.categories > self.threshold {
            msg.push_str(&format!(
                " The x variable has {} distinct values.",
                self.categories
            ));
        }
        if !self.values_numeric {
            msg.push_str(" The selected values are not numeric.");
        }
        msg
    }
}

#[derive(Debug, Clone)]
pub enum PieGate {
    AwaitingConfirmation,
    Ready(PreparedChart),
}

/// Bar and pie requests built from one shared, filtered subset.
#[derive(Debug, Clone)]
pub struct CategoricalCharts {
    pub bar: PreparedChart,
    pub pie: PieGate,
    pub advisory: PieAdvisory,
}
