//! Request module - selection state, chart request building and render passes

mod builder;
mod plan;
mod selection;
mod types;

pub use builder::{
    build_categorical_request, build_histogram_request, build_scatter_request,
    build_timeline_request, coerce_date_column, CategoricalParams, DateRange,
};
pub use plan::{default_column, evaluate, render_pass, PlanOptions, RenderPlan};
pub use selection::{
    CategoricalSelection, HistogramSelection, MultiSelect, PlotFamily, ScatterSelection,
    Selection, SelectionLocked, TimelineSelection,
};
pub use types::{
    BarMode, Binding, CategoricalCharts, ChartKind, ChartRequest, HistogramVariant, PieAdvisory,
    PieGate, PreparedChart,
};
