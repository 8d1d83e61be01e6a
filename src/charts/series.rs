//! Chart Series Module
//! Converts a prepared chart into plottable coordinates: traces, bins, bars and slices.

use crate::data::{from_millis, ColumnKind, ColumnRef, Dataset};
use crate::error::{RenderHalt, RenderResult};
use crate::request::{BarMode, ChartKind, PreparedChart};
use polars::prelude::*;
use statrs::statistics::{Data, OrderStatistics};
use std::collections::HashMap;

/// Rendering knobs taken from the app config.
#[derive(Debug, Clone, Copy)]
pub struct SeriesOptions {
    pub bins: Option<usize>,
    pub bar_gap: f64,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            bins: None,
            bar_gap: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AxisScale {
    Linear,
    /// Epoch milliseconds.
    Time,
    /// Coordinate `i` is the label at index `i`.
    Category(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub scale: AxisScale,
}

impl Axis {
    fn linear(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scale: AxisScale::Linear,
        }
    }

    /// Tick text for a coordinate on this axis.
    pub fn format_value(&self, value: f64) -> String {
        match &self.scale {
            AxisScale::Linear => format_number(value),
            AxisScale::Time => match from_millis(value.round() as i64) {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
                Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
                None => String::new(),
            },
            AxisScale::Category(labels) => {
                let idx = value.round();
                if (value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// One named set of 2D points.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XySeries {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub traces: Vec<Trace>,
    /// Connect points in row order (timeseries) instead of drawing markers.
    pub lines: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scatter3dSeries {
    pub axes: [Axis; 3],
    pub points: Vec<[f64; 3]>,
}

/// One drawn rectangle; `value` may be negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub series: usize,
    pub center: f64,
    pub width: f64,
    pub base: f64,
    pub value: f64,
}

impl BarRect {
    pub fn top(&self) -> f64 {
        self.base + self.value
    }
}

/// Five-number summary for the marginal box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series_names: Vec<String>,
    pub bars: Vec<BarRect>,
    pub mode: BarMode,
    /// Univariate histograms carry a box of the raw values.
    pub box_stats: Option<BoxStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSeries {
    pub names_label: String,
    pub values_label: String,
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSeries {
    Xy(XySeries),
    Scatter3d(Scatter3dSeries),
    Bars(BarSeries),
    Pie(PieSeries),
}

/// Build drawable data for `chart`. Values that the chart kind cannot
/// place (e.g. text where numbers are needed) halt with `MixedFormatType`.
pub fn build_series(chart: &PreparedChart, options: &SeriesOptions) -> RenderResult<ChartSeries> {
    let request = &chart.request;
    let data = &chart.data;
    let x_cols = request.x.columns();
    let y_cols = request.y.as_ref().map(|y| y.columns()).unwrap_or_default();

    match request.kind {
        ChartKind::Scatter2d | ChartKind::Timeseries => {
            let lines = request.kind == ChartKind::Timeseries;
            xy_series(data, x_cols[0], &y_cols, lines).map(ChartSeries::Xy)
        }
        ChartKind::Scatter3d => {
            let z = request
                .z
                .as_ref()
                .ok_or_else(|| RenderHalt::Selection("Select a z variable.".to_string()))?;
            let y = first(&y_cols, "y")?;
            scatter3d_series(data, [x_cols[0], y, z]).map(ChartSeries::Scatter3d)
        }
        ChartKind::HistogramUnivariate | ChartKind::HistogramMultivariate => {
            let mode = request.mode.unwrap_or_default();
            let with_box = request.kind == ChartKind::HistogramUnivariate;
            histogram_series(data, &x_cols, mode, with_box, options).map(ChartSeries::Bars)
        }
        ChartKind::Bar => {
            let y = first(&y_cols, "y")?;
            let mode = request.mode.unwrap_or_default();
            bar_series(data, x_cols[0], y, mode, options.bar_gap).map(ChartSeries::Bars)
        }
        ChartKind::Pie => {
            let values = first(&y_cols, "values")?;
            pie_series(data, x_cols[0], values).map(ChartSeries::Pie)
        }
    }
}

fn first<'a>(cols: &[&'a ColumnRef], what: &str) -> RenderResult<&'a ColumnRef> {
    cols.first()
        .copied()
        .ok_or_else(|| RenderHalt::Selection(format!("Select a {} variable.", what)))
}

fn mixed(columns: &[(&ColumnRef, ColumnKind)]) -> RenderHalt {
    RenderHalt::MixedFormatType {
        columns: columns
            .iter()
            .map(|(c, k)| format!("{} ({})", c, k.label()))
            .collect(),
    }
}

/// Column values as read for plotting.
enum RawColumn {
    Numbers(Vec<Option<f64>>),
    Times(Vec<Option<f64>>),
    Labels(Vec<Option<String>>),
}

impl RawColumn {
    fn numbers(&self) -> Option<&[Option<f64>]> {
        match self {
            RawColumn::Numbers(v) | RawColumn::Times(v) => Some(v),
            RawColumn::Labels(_) => None,
        }
    }

    fn into_labels(self) -> Vec<Option<String>> {
        match self {
            RawColumn::Labels(v) => v,
            RawColumn::Numbers(v) => v.into_iter().map(|o| o.map(format_number)).collect(),
            RawColumn::Times(v) => {
                let axis = Axis {
                    label: String::new(),
                    scale: AxisScale::Time,
                };
                v.into_iter().map(|o| o.map(|ms| axis.format_value(ms))).collect()
            }
        }
    }
}

fn read_column(data: &Dataset, column: &ColumnRef) -> RenderResult<RawColumn> {
    let col = data.column(column)?;
    let kind = data.kind(column);

    match (kind, col.dtype()) {
        (ColumnKind::Numeric, _) => {
            let floats = col.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = floats.f64()?.into_iter().collect();
            Ok(RawColumn::Numbers(values))
        }
        (ColumnKind::Date, DataType::Date | DataType::Datetime(..)) => {
            let millis = col
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            let values: Vec<Option<f64>> =
                millis.i64()?.into_iter().map(|v| v.map(|ms| ms as f64)).collect();
            Ok(RawColumn::Times(values))
        }
        (ColumnKind::Date | ColumnKind::Text | ColumnKind::Categorical, _) => {
            let text = col.cast(&DataType::String)?;
            let values: Vec<Option<String>> = text
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect();
            Ok(RawColumn::Labels(values))
        }
        (ColumnKind::Other, _) => Err(mixed(&[(column, kind)])),
    }
}

/// Label-to-index mapping in first-appearance order.
#[derive(Default)]
struct CategoryIndex {
    order: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl CategoryIndex {
    fn code(&mut self, label: &str) -> usize {
        if let Some(&idx) = self.lookup.get(label) {
            return idx;
        }
        let idx = self.order.len();
        self.order.push(label.to_string());
        self.lookup.insert(label.to_string(), idx);
        idx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScaleKind {
    Linear,
    Time,
    Category,
}

/// Map a column onto axis coordinates, sharing `index` across columns.
fn encode(raw: RawColumn, index: &mut CategoryIndex) -> (ScaleKind, Vec<Option<f64>>) {
    match raw {
        RawColumn::Numbers(v) => (ScaleKind::Linear, v),
        RawColumn::Times(v) => (ScaleKind::Time, v),
        RawColumn::Labels(v) => (
            ScaleKind::Category,
            v.iter()
                .map(|o| o.as_deref().map(|l| index.code(l) as f64))
                .collect(),
        ),
    }
}

fn make_axis(label: String, kind: ScaleKind, index: CategoryIndex) -> Axis {
    let scale = match kind {
        ScaleKind::Linear => AxisScale::Linear,
        ScaleKind::Time => AxisScale::Time,
        ScaleKind::Category => AxisScale::Category(index.order),
    };
    Axis { label, scale }
}

fn xy_series(
    data: &Dataset,
    x: &ColumnRef,
    ys: &[&ColumnRef],
    lines: bool,
) -> RenderResult<XySeries> {
    let mut x_index = CategoryIndex::default();
    let (x_kind, xs) = encode(read_column(data, x)?, &mut x_index);

    let mut y_index = CategoryIndex::default();
    let mut y_kind: Option<ScaleKind> = None;
    let mut traces = Vec::with_capacity(ys.len());

    for y in ys {
        let (kind, values) = encode(read_column(data, y)?, &mut y_index);
        match y_kind {
            None => y_kind = Some(kind),
            Some(k) if k != kind => {
                let kinds: Vec<(&ColumnRef, ColumnKind)> =
                    ys.iter().map(|c| (*c, data.kind(c))).collect();
                return Err(mixed(&kinds));
            }
            Some(_) => {}
        }
        let points = xs
            .iter()
            .zip(values.iter())
            .filter_map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) => Some([*x, *y]),
                _ => None,
            })
            .collect();
        traces.push(Trace {
            name: y.name().to_string(),
            points,
        });
    }

    let y_label = match ys {
        [single] => single.name().to_string(),
        _ => "value".to_string(),
    };

    Ok(XySeries {
        x_axis: make_axis(x.name().to_string(), x_kind, x_index),
        y_axis: make_axis(y_label, y_kind.unwrap_or(ScaleKind::Linear), y_index),
        traces,
        lines,
    })
}

fn scatter3d_series(data: &Dataset, cols: [&ColumnRef; 3]) -> RenderResult<Scatter3dSeries> {
    let mut encoded = Vec::with_capacity(3);
    let mut axes = Vec::with_capacity(3);
    for col in cols {
        let mut index = CategoryIndex::default();
        let (kind, values) = encode(read_column(data, col)?, &mut index);
        axes.push(make_axis(col.name().to_string(), kind, index));
        encoded.push(values);
    }

    let points = (0..data.height())
        .filter_map(|row| {
            match (encoded[0][row], encoded[1][row], encoded[2][row]) {
                (Some(x), Some(y), Some(z)) => Some([x, y, z]),
                _ => None,
            }
        })
        .collect();

    let [x_axis, y_axis, z_axis]: [Axis; 3] = axes
        .try_into()
        .map_err(|_| RenderHalt::Selection("A 3D scatter needs three axes.".to_string()))?;
    Ok(Scatter3dSeries {
        axes: [x_axis, y_axis, z_axis],
        points,
    })
}

/// Sturges' rule.
pub fn default_bin_count(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        ((n as f64).log2().ceil() as usize + 1).max(1)
    }
}

/// Lay out per-slot values as rectangles under `mode`.
///
/// `slots[i]` lists `(series, value)` entries drawn at `centers[i]`.
pub fn compose_bars(
    slots: &[Vec<(usize, f64)>],
    centers: &[f64],
    slot_width: f64,
    mode: BarMode,
    gap: f64,
) -> Vec<BarRect> {
    let inner = slot_width * (1.0 - gap.clamp(0.0, 0.95));
    let mut bars = Vec::new();

    for (entries, &center) in slots.iter().zip(centers) {
        let mut positive = 0.0;
        let mut negative = 0.0;
        let mut running = 0.0;
        let group_width = inner / entries.len().max(1) as f64;

        for (pos, &(series, value)) in entries.iter().enumerate() {
            if value == 0.0 || !value.is_finite() {
                continue;
            }
            let rect = match mode {
                BarMode::Relative => {
                    let base = if value >= 0.0 { positive } else { negative };
                    if value >= 0.0 {
                        positive += value;
                    } else {
                        negative += value;
                    }
                    BarRect { series, center, width: inner, base, value }
                }
                BarMode::Stack => {
                    let base = running;
                    running += value;
                    BarRect { series, center, width: inner, base, value }
                }
                BarMode::Group => BarRect {
                    series,
                    center: center - inner / 2.0 + group_width * (pos as f64 + 0.5),
                    width: group_width,
                    base: 0.0,
                    value,
                },
                BarMode::Overlay => BarRect { series, center, width: inner, base: 0.0, value },
            };
            bars.push(rect);
        }
    }
    bars
}

/// Quartile box with whiskers at 1.5 IQR, clipped to the data.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let mut data = Data::new(finite.clone());
    let q1 = data.lower_quartile();
    let median = data.median();
    let q3 = data.upper_quartile();
    let iqr = q3 - q1;

    let mut sorted = finite;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|&v| v >= q1 - 1.5 * iqr)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= q3 + 1.5 * iqr)
        .unwrap_or(q3);

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
    })
}

fn histogram_series(
    data: &Dataset,
    cols: &[&ColumnRef],
    mode: BarMode,
    with_box: bool,
    options: &SeriesOptions,
) -> RenderResult<BarSeries> {
    let raws = cols
        .iter()
        .map(|c| read_column(data, c))
        .collect::<RenderResult<Vec<_>>>()?;
    let series_names: Vec<String> = cols.iter().map(|c| c.name().to_string()).collect();
    let x_label = match cols {
        [single] => single.name().to_string(),
        _ => "value".to_string(),
    };
    let y_axis = Axis::linear("count");

    let all_numeric = raws.iter().all(|r| r.numbers().is_some());
    let all_labels = raws.iter().all(|r| r.numbers().is_none());

    if all_labels {
        let mut index = CategoryIndex::default();
        let mut counts: Vec<HashMap<usize, f64>> = vec![HashMap::new(); raws.len()];
        for (series, raw) in raws.into_iter().enumerate() {
            for label in raw.into_labels().into_iter().flatten() {
                *counts[series].entry(index.code(&label)).or_insert(0.0) += 1.0;
            }
        }
        let slots: Vec<Vec<(usize, f64)>> = (0..index.order.len())
            .map(|slot| {
                counts
                    .iter()
                    .enumerate()
                    .map(|(series, c)| (series, c.get(&slot).copied().unwrap_or(0.0)))
                    .collect()
            })
            .collect();
        let centers: Vec<f64> = (0..slots.len()).map(|i| i as f64).collect();
        let bars = compose_bars(&slots, &centers, 1.0, mode, options.bar_gap);
        return Ok(BarSeries {
            x_axis: make_axis(x_label, ScaleKind::Category, index),
            y_axis,
            series_names,
            bars,
            mode,
            box_stats: None,
        });
    }

    if !all_numeric {
        let kinds: Vec<(&ColumnRef, ColumnKind)> = cols.iter().map(|c| (*c, data.kind(c))).collect();
        return Err(mixed(&kinds));
    }

    let is_time = raws.iter().any(|r| matches!(r, RawColumn::Times(_)));
    let values: Vec<Vec<f64>> = raws
        .iter()
        .map(|r| r.numbers().unwrap_or_default().iter().flatten().copied().collect())
        .collect();

    let lo = values.iter().flatten().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale = if is_time { ScaleKind::Time } else { ScaleKind::Linear };
    let box_stats = if with_box {
        values.first().and_then(|v| box_stats(v))
    } else {
        None
    };

    if !lo.is_finite() || !hi.is_finite() {
        return Ok(BarSeries {
            x_axis: make_axis(x_label, scale, CategoryIndex::default()),
            y_axis,
            series_names,
            bars: Vec::new(),
            mode,
            box_stats,
        });
    }

    let longest = values.iter().map(Vec::len).max().unwrap_or(0);
    let (start, width, n_bins) = if hi > lo {
        let n = options.bins.unwrap_or_else(|| default_bin_count(longest)).max(1);
        (lo, (hi - lo) / n as f64, n)
    } else {
        (lo - 0.5, 1.0, 1)
    };

    let mut counts = vec![vec![0.0; n_bins]; values.len()];
    for (series, vals) in values.iter().enumerate() {
        for &v in vals {
            let bin = (((v - start) / width).floor().max(0.0) as usize).min(n_bins - 1);
            counts[series][bin] += 1.0;
        }
    }

    let slots: Vec<Vec<(usize, f64)>> = (0..n_bins)
        .map(|bin| (0..values.len()).map(|s| (s, counts[s][bin])).collect())
        .collect();
    let centers: Vec<f64> = (0..n_bins)
        .map(|bin| start + width * (bin as f64 + 0.5))
        .collect();

    Ok(BarSeries {
        x_axis: make_axis(x_label, scale, CategoryIndex::default()),
        y_axis,
        series_names,
        bars: compose_bars(&slots, &centers, width, mode, options.bar_gap),
        mode,
        box_stats,
    })
}

fn bar_series(
    data: &Dataset,
    x: &ColumnRef,
    y: &ColumnRef,
    mode: BarMode,
    gap: f64,
) -> RenderResult<BarSeries> {
    let labels = read_column(data, x)?.into_labels();
    let raw_y = read_column(data, y)?;
    let values = match &raw_y {
        RawColumn::Numbers(v) => v,
        _ => return Err(mixed(&[(x, data.kind(x)), (y, data.kind(y))])),
    };

    let mut index = CategoryIndex::default();
    let mut slots: Vec<Vec<(usize, f64)>> = Vec::new();
    for (label, value) in labels.iter().zip(values.iter()) {
        if let (Some(label), Some(value)) = (label, value) {
            let slot = index.code(label);
            if slot == slots.len() {
                slots.push(Vec::new());
            }
            slots[slot].push((0, *value));
        }
    }
    let centers: Vec<f64> = (0..slots.len()).map(|i| i as f64).collect();

    Ok(BarSeries {
        x_axis: make_axis(x.name().to_string(), ScaleKind::Category, index),
        y_axis: Axis::linear(y.name()),
        series_names: vec![y.name().to_string()],
        bars: compose_bars(&slots, &centers, 1.0, mode, gap),
        mode,
        box_stats: None,
    })
}

fn pie_series(data: &Dataset, names: &ColumnRef, values: &ColumnRef) -> RenderResult<PieSeries> {
    let labels = read_column(data, names)?.into_labels();
    let raw_values = read_column(data, values)?;
    let amounts = match &raw_values {
        RawColumn::Numbers(v) => v,
        _ => {
            return Err(mixed(&[
                (names, data.kind(names)),
                (values, data.kind(values)),
            ]))
        }
    };

    let mut index = CategoryIndex::default();
    let mut totals: Vec<f64> = Vec::new();
    for (label, amount) in labels.iter().zip(amounts.iter()) {
        if let (Some(label), Some(amount)) = (label, amount) {
            let slot = index.code(label);
            if slot == totals.len() {
                totals.push(0.0);
            }
            totals[slot] += amount;
        }
    }

    let sum: f64 = totals.iter().filter(|v| **v > 0.0).sum();
    let slices = index
        .order
        .into_iter()
        .zip(totals)
        .filter(|(_, v)| *v > 0.0)
        .map(|(label, value)| PieSlice {
            label,
            value,
            fraction: value / sum,
        })
        .collect();

    Ok(PieSeries {
        names_label: names.name().to_string(),
        values_label: values.name().to_string(),
        slices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{
        build_categorical_request, build_histogram_request, build_scatter_request,
        build_timeline_request, CategoricalParams, HistogramVariant, MultiSelect, PieGate,
    };

    fn shop() -> Dataset {
        let df = df!(
            "date" => ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"],
            "sales" => [10i64, 20, 30, 40],
            "cost" => [1.0f64, 2.0, 3.0, 4.0],
            "region" => ["north", "south", "north", "east"]
        )
        .unwrap();
        Dataset::new(df).unwrap()
    }

    #[test]
    fn test_scatter_points() {
        let ds = shop();
        let chart = build_scatter_request(&ds, "sales", "cost", None).unwrap();
        match build_series(&chart, &SeriesOptions::default()).unwrap() {
            ChartSeries::Xy(xy) => {
                assert!(!xy.lines);
                assert_eq!(xy.traces.len(), 1);
                assert_eq!(xy.traces[0].points[1], [20.0, 2.0]);
                assert_eq!(xy.x_axis.scale, AxisScale::Linear);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_scatter_text_axis_is_categorical() {
        let ds = shop();
        let chart = build_scatter_request(&ds, "region", "sales", None).unwrap();
        match build_series(&chart, &SeriesOptions::default()).unwrap() {
            ChartSeries::Xy(xy) => {
                let xs: Vec<f64> = xy.traces[0].points.iter().map(|p| p[0]).collect();
                assert_eq!(xs, vec![0.0, 1.0, 0.0, 2.0]);
                assert_eq!(xy.x_axis.format_value(2.0), "east");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_timeline_uses_time_axis() {
        let mut ds = shop();
        let y = MultiSelect::with_chosen(vec!["sales".into(), "cost".into()]);
        let chart = build_timeline_request(&mut ds, "date", &y, None, None).unwrap();
        match build_series(&chart, &SeriesOptions::default()).unwrap() {
            ChartSeries::Xy(xy) => {
                assert!(xy.lines);
                assert_eq!(xy.x_axis.scale, AxisScale::Time);
                assert_eq!(xy.traces.len(), 2);
                assert_eq!(xy.y_axis.label, "value");
                assert_eq!(xy.x_axis.format_value(xy.traces[0].points[0][0]), "2024-01-01");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_univariate_histogram_counts_every_value() {
        let ds = shop();
        let chart =
            build_histogram_request(&ds, HistogramVariant::Univariate, &["sales".into()], None)
                .unwrap();
        let options = SeriesOptions {
            bins: Some(2),
            bar_gap: 0.05,
        };
        match build_series(&chart, &options).unwrap() {
            ChartSeries::Bars(bars) => {
                let total: f64 = bars.bars.iter().map(|b| b.value).sum();
                assert_eq!(total, 4.0);
                assert_eq!(bars.bars.len(), 2);
                let stats = bars.box_stats.unwrap();
                assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
                assert_eq!(stats.lower_whisker, 10.0);
                assert_eq!(stats.upper_whisker, 40.0);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_text_histogram_counts_labels() {
        let ds = shop();
        let chart =
            build_histogram_request(&ds, HistogramVariant::Univariate, &["region".into()], None)
                .unwrap();
        match build_series(&chart, &SeriesOptions::default()).unwrap() {
            ChartSeries::Bars(bars) => {
                assert_eq!(
                    bars.x_axis.scale,
                    AxisScale::Category(vec!["north".into(), "south".into(), "east".into()])
                );
                let north = bars.bars.iter().find(|b| b.center == 0.0).unwrap();
                assert_eq!(north.value, 2.0);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_compose_modes() {
        let slots = vec![vec![(0, 2.0), (1, 3.0)], vec![(0, -1.0), (1, 4.0)]];
        let centers = [0.0, 1.0];

        let stacked = compose_bars(&slots, &centers, 1.0, BarMode::Relative, 0.0);
        assert_eq!(stacked[1].base, 2.0);
        assert_eq!(stacked[1].top(), 5.0);
        // negative goes below zero, positive starts from zero
        assert_eq!(stacked[2].base, 0.0);
        assert_eq!(stacked[3].base, 0.0);

        let stack = compose_bars(&slots, &centers, 1.0, BarMode::Stack, 0.0);
        assert_eq!(stack[3].base, -1.0);

        let group = compose_bars(&slots, &centers, 1.0, BarMode::Group, 0.0);
        assert_eq!(group[0].width, 0.5);
        assert_eq!(group[0].center, -0.25);
        assert_eq!(group[1].center, 0.25);

        let overlay = compose_bars(&slots, &centers, 1.0, BarMode::Overlay, 0.0);
        assert!(overlay.iter().all(|b| b.base == 0.0));
    }

    #[test]
    fn test_bar_and_pie_from_categorical_pair() {
        let mut ds = shop();
        let params = CategoricalParams {
            x: "region",
            y: "sales",
            mode: BarMode::Relative,
            date_range: None,
            pie_confirmed: true,
            advisory_cardinality: 50,
        };
        let charts = build_categorical_request(&mut ds, &params).unwrap();

        match build_series(&charts.bar, &SeriesOptions::default()).unwrap() {
            ChartSeries::Bars(bars) => {
                // north rows stack: 10 then 30
                let north: Vec<&BarRect> = bars.bars.iter().filter(|b| b.center == 0.0).collect();
                assert_eq!(north.len(), 2);
                assert_eq!(north[1].base, 10.0);
                assert_eq!(north[1].top(), 40.0);
            }
            other => panic!("unexpected: {:?}", other),
        }

        let PieGate::Ready(pie) = charts.pie else {
            panic!("pie was confirmed");
        };
        match build_series(&pie, &SeriesOptions::default()).unwrap() {
            ChartSeries::Pie(pie) => {
                let labels: Vec<&str> = pie.slices.iter().map(|s| s.label.as_str()).collect();
                assert_eq!(labels, vec!["north", "south", "east"]);
                assert_eq!(pie.slices[0].value, 40.0);
                let total: f64 = pie.slices.iter().map(|s| s.fraction).sum();
                assert!((total - 1.0).abs() < 1e-9);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_bar_with_text_values_is_mixed() {
        let mut ds = shop();
        let params = CategoricalParams {
            x: "sales",
            y: "region",
            mode: BarMode::Group,
            date_range: None,
            pie_confirmed: false,
            advisory_cardinality: 50,
        };
        let charts = build_categorical_request(&mut ds, &params).unwrap();
        let result = build_series(&charts.bar, &SeriesOptions::default());
        assert!(matches!(result, Err(RenderHalt::MixedFormatType { .. })));
    }

    #[test]
    fn test_sturges() {
        assert_eq!(default_bin_count(0), 1);
        assert_eq!(default_bin_count(1), 1);
        assert_eq!(default_bin_count(8), 4);
        assert_eq!(default_bin_count(1000), 11);
    }
}
