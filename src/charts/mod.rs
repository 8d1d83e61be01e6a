//! Charts module - series building, interactive plotting and PNG export

mod export;
mod plotter;
mod series;

pub use export::{export_png, padded_range};
pub use plotter::{series_color, ChartPlotter, ViewAngles, PALETTE};
pub use series::{
    box_stats, build_series, compose_bars, default_bin_count, Axis, AxisScale, BarRect,
    BarSeries, BoxStats, ChartSeries, PieSeries, PieSlice, Scatter3dSeries, SeriesOptions, Trace,
    XySeries,
};
