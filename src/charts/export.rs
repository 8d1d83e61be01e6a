//! Static Chart Export
//! Renders a chart series to a PNG file with plotters.

use crate::charts::plotter::{normalize_3d, pie_wedge, project, series_color, ViewAngles};
use crate::charts::series::{Axis, BarSeries, ChartSeries, PieSeries, Scatter3dSeries, XySeries};
use crate::error::ExportError;
use crate::request::BarMode;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
/// The backend outlives the chart's borrow of the drawing area.
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn drawing<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Drawing(e.to_string())
}

fn palette(index: usize) -> RGBColor {
    let c = series_color(index);
    RGBColor(c.r(), c.g(), c.b())
}

/// Value range with 5% padding. Degenerate input still yields a usable span.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    if hi == lo {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn is_empty(series: &ChartSeries) -> bool {
    match series {
        ChartSeries::Xy(xy) => xy.traces.iter().all(|t| t.points.is_empty()),
        ChartSeries::Scatter3d(s) => s.points.is_empty(),
        ChartSeries::Bars(b) => b.bars.is_empty(),
        ChartSeries::Pie(p) => p.slices.is_empty(),
    }
}

/// Write `series` to `path` as a PNG of `size` pixels.
pub fn export_png(
    series: &ChartSeries,
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<(), ExportError> {
    if is_empty(series) {
        return Err(ExportError::Empty(title.to_string()));
    }

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(drawing)?;

    match series {
        ChartSeries::Xy(xy) => draw_xy(&root, title, xy)?,
        ChartSeries::Scatter3d(s) => draw_scatter3d(&root, title, s)?,
        ChartSeries::Bars(b) => draw_bars(&root, title, b)?,
        ChartSeries::Pie(p) => draw_pie(&root, title, p)?,
    }

    root.present().map_err(drawing)?;
    log::info!("Exported '{}' to {}", title, path.display());
    Ok(())
}

fn draw_xy(root: &Area<'_>, title: &str, xy: &XySeries) -> Result<(), ExportError> {
    let points = || xy.traces.iter().flat_map(|t| t.points.iter());
    let x_range = padded_range(points().map(|p| p[0]));
    let y_range = padded_range(points().map(|p| p[1]));

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(drawing)?;

    configure_mesh(&mut chart, &xy.x_axis, &xy.y_axis)?;

    for (i, trace) in xy.traces.iter().enumerate() {
        let color = palette(i);
        let coords: Vec<(f64, f64)> = trace.points.iter().map(|p| (p[0], p[1])).collect();
        let anno = if xy.lines {
            chart
                .draw_series(LineSeries::new(coords, color.stroke_width(2)))
                .map_err(drawing)?
        } else {
            chart
                .draw_series(coords.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))
                .map_err(drawing)?
        };
        anno.label(trace.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    draw_legend(&mut chart)
}

fn draw_bars(root: &Area<'_>, title: &str, series: &BarSeries) -> Result<(), ExportError> {
    let peak = series.bars.iter().map(|b| b.top()).fold(0.0_f64, f64::max);
    let box_row = if peak > 0.0 { peak * 1.12 } else { 1.0 };

    let x_range = padded_range(series.bars.iter().flat_map(|b| {
        [b.center - b.width / 2.0, b.center + b.width / 2.0]
    }));
    let mut y_values: Vec<f64> = series.bars.iter().flat_map(|b| [b.base, b.top()]).collect();
    y_values.push(0.0);
    if series.box_stats.is_some() {
        y_values.push(box_row * 1.06);
    }
    let y_range = padded_range(y_values);

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(drawing)?;

    configure_mesh(&mut chart, &series.x_axis, &series.y_axis)?;

    let alpha = if series.mode == BarMode::Overlay { 0.5 } else { 0.9 };
    for (index, name) in series.series_names.iter().enumerate() {
        let color = palette(index);
        chart
            .draw_series(series.bars.iter().filter(|b| b.series == index).map(|b| {
                let half = b.width / 2.0;
                Rectangle::new(
                    [(b.center - half, b.base), (b.center + half, b.top())],
                    color.mix(alpha).filled(),
                )
            }))
            .map_err(drawing)?
            .label(name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    if let Some(stats) = series.box_stats {
        let color = palette(0);
        let half = box_row * 0.04;
        chart
            .draw_series([
                Rectangle::new(
                    [(stats.q1, box_row - half), (stats.q3, box_row + half)],
                    color.mix(0.3).filled(),
                ),
                Rectangle::new(
                    [(stats.q1, box_row - half), (stats.q3, box_row + half)],
                    color.stroke_width(2),
                ),
            ])
            .map_err(drawing)?;
        chart
            .draw_series([
                PathElement::new(
                    vec![(stats.lower_whisker, box_row), (stats.q1, box_row)],
                    color,
                ),
                PathElement::new(
                    vec![(stats.q3, box_row), (stats.upper_whisker, box_row)],
                    color,
                ),
                PathElement::new(
                    vec![(stats.median, box_row - half), (stats.median, box_row + half)],
                    color.stroke_width(2),
                ),
            ])
            .map_err(drawing)?;
    }

    draw_legend(&mut chart)
}

fn draw_pie(root: &Area<'_>, title: &str, pie: &PieSeries) -> Result<(), ExportError> {
    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 24))
        .build_cartesian_2d(-1.6..1.6, -1.2..1.2)
        .map_err(drawing)?;

    let mut start = 0.0;
    for (i, slice) in pie.slices.iter().enumerate() {
        let end = start + slice.fraction;
        let color = palette(i);
        let outline: Vec<(f64, f64)> = pie_wedge(start, end).into_iter().map(|p| (p[0], p[1])).collect();
        chart
            .draw_series(std::iter::once(Polygon::new(outline, color.filled())))
            .map_err(drawing)?
            .label(slice.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

        if slice.fraction >= 0.03 {
            let mid = std::f64::consts::FRAC_PI_2 - (start + end) / 2.0 * std::f64::consts::TAU;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{:.1}%", slice.fraction * 100.0),
                    (mid.cos() * 0.65, mid.sin() * 0.65),
                    ("sans-serif", 14).into_font().color(&WHITE),
                )))
                .map_err(drawing)?;
        }
        start = end;
    }

    draw_legend(&mut chart)
}

fn draw_scatter3d(root: &Area<'_>, title: &str, series: &Scatter3dSeries) -> Result<(), ExportError> {
    let view = ViewAngles::default();
    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(title, ("sans-serif", 24))
        .build_cartesian_2d(-2.0..2.0, -1.8..1.8)
        .map_err(drawing)?;

    let origin = project([-1.0, -1.0, -1.0], view);
    let ends = [[1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]];
    for (axis, end) in series.axes.iter().zip(ends) {
        let tip = project(end, view);
        chart
            .draw_series([PathElement::new(
                vec![(origin[0], origin[1]), (tip[0], tip[1])],
                BLACK.mix(0.5),
            )])
            .map_err(drawing)?;
        chart
            .draw_series(std::iter::once(Text::new(
                axis.label.clone(),
                (tip[0] * 1.08, tip[1] * 1.08),
                ("sans-serif", 14),
            )))
            .map_err(drawing)?;
    }

    let color = palette(0);
    chart
        .draw_series(normalize_3d(&series.points).into_iter().map(|p| {
            let [x, y] = project(p, view);
            Circle::new((x, y), 2, color.filled())
        }))
        .map_err(drawing)?;
    Ok(())
}

fn configure_mesh<'a, 'b: 'a>(
    chart: &mut Chart<'a, 'b>,
    x_axis: &Axis,
    y_axis: &Axis,
) -> Result<(), ExportError> {
    let x_fmt = |v: &f64| x_axis.format_value(*v);
    let y_fmt = |v: &f64| y_axis.format_value(*v);
    chart
        .configure_mesh()
        .x_desc(x_axis.label.as_str())
        .y_desc(y_axis.label.as_str())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()
        .map_err(drawing)
}

fn draw_legend<'a, 'b: 'a>(
    chart: &mut Chart<'a, 'b>,
) -> Result<(), ExportError> {
    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(drawing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::series::AxisScale;

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(Vec::<f64>::new()), 0.0..1.0);
        assert_eq!(padded_range([3.0, 3.0]), 2.5..3.5);
        let r = padded_range([0.0, 10.0, f64::NAN]);
        assert_eq!(r, -0.5..10.5);
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let series = ChartSeries::Pie(PieSeries {
            names_label: "x".into(),
            values_label: "y".into(),
            slices: Vec::new(),
        });
        let dir = tempfile::tempdir().unwrap();
        let result = export_png(&series, "Pie Chart", &dir.path().join("pie.png"), (200, 200));
        assert!(matches!(result, Err(ExportError::Empty(_))));

        let xy = ChartSeries::Xy(XySeries {
            x_axis: Axis { label: "a".into(), scale: AxisScale::Linear },
            y_axis: Axis { label: "b".into(), scale: AxisScale::Linear },
            traces: Vec::new(),
            lines: false,
        });
        assert!(is_empty(&xy));
    }
}
