//! Chart Plotter Module
//! Draws chart series as interactive egui_plot widgets.

use crate::charts::series::{Axis, BarSeries, ChartSeries, PieSeries, Scatter3dSeries, XySeries};
use crate::request::BarMode;
use egui::{Color32, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoint, PlotPoints, Points,
    Polygon, Text,
};

/// Color palette for series
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

pub fn series_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Camera angles for the 3D scatter, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngles {
    pub yaw: f64,
    pub pitch: f64,
}

impl Default for ViewAngles {
    fn default() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.4,
        }
    }
}

/// Rotate a point in the unit cube and drop depth.
pub fn project(point: [f64; 3], view: ViewAngles) -> [f64; 2] {
    let [x, y, z] = point;
    let (sy, cy) = view.yaw.sin_cos();
    let (sp, cp) = view.pitch.sin_cos();
    // yaw around the vertical (z) axis, then tilt toward the viewer
    let rx = x * cy - y * sy;
    let ry = x * sy + y * cy;
    [rx, z * cp - ry * sp]
}

/// Scale each coordinate into [-1, 1] using the column range.
pub fn normalize_3d(points: &[[f64; 3]]) -> Vec<[f64; 3]> {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in points {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(p[axis]);
            hi[axis] = hi[axis].max(p[axis]);
        }
    }
    points
        .iter()
        .map(|p| {
            let mut out = [0.0; 3];
            for axis in 0..3 {
                let span = hi[axis] - lo[axis];
                out[axis] = if span > 0.0 {
                    (p[axis] - lo[axis]) / span * 2.0 - 1.0
                } else {
                    0.0
                };
            }
            out
        })
        .collect()
}

/// Outline of one pie wedge: center, then the arc clockwise from 12 o'clock.
pub fn pie_wedge(start: f64, end: f64) -> Vec<[f64; 2]> {
    let steps = (((end - start) * 120.0).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push([0.0, 0.0]);
    for i in 0..=steps {
        let frac = start + (end - start) * i as f64 / steps as f64;
        let angle = std::f64::consts::FRAC_PI_2 - frac * std::f64::consts::TAU;
        points.push([angle.cos(), angle.sin()]);
    }
    points
}

/// Creates interactive charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw any chart series under a heading.
    pub fn draw(
        ui: &mut egui::Ui,
        id: &str,
        title: &str,
        series: &ChartSeries,
        view: &mut ViewAngles,
        height: f32,
    ) {
        ui.label(RichText::new(title).strong().size(16.0));
        match series {
            ChartSeries::Xy(xy) => Self::draw_xy(ui, id, xy, height),
            ChartSeries::Scatter3d(s) => Self::draw_scatter3d(ui, id, s, view, height),
            ChartSeries::Bars(bars) => Self::draw_bars(ui, id, bars, height),
            ChartSeries::Pie(pie) => Self::draw_pie(ui, id, pie, height),
        }
    }

    fn base_plot(id: &str, x_axis: &Axis, y_axis: &Axis, height: f32) -> Plot<'static> {
        let x_fmt = x_axis.clone();
        let y_fmt = y_axis.clone();
        let (x_hover, y_hover) = (x_axis.clone(), y_axis.clone());
        Plot::new(id.to_string())
            .height(height)
            .legend(Legend::default())
            .x_axis_label(x_axis.label.clone())
            .y_axis_label(y_axis.label.clone())
            .x_axis_formatter(move |mark, _range| x_fmt.format_value(mark.value))
            .y_axis_formatter(move |mark, _range| y_fmt.format_value(mark.value))
            .label_formatter(move |name, value: &PlotPoint| {
                let coords = format!(
                    "{}: {}\n{}: {}",
                    x_hover.label,
                    x_hover.format_value(value.x),
                    y_hover.label,
                    y_hover.format_value(value.y)
                );
                if name.is_empty() {
                    coords
                } else {
                    format!("{}\n{}", name, coords)
                }
            })
    }

    /// Scatter markers or row-ordered lines, one trace per y column.
    pub fn draw_xy(ui: &mut egui::Ui, id: &str, xy: &XySeries, height: f32) {
        Self::base_plot(id, &xy.x_axis, &xy.y_axis, height).show(ui, |plot_ui| {
            for (i, trace) in xy.traces.iter().enumerate() {
                let color = series_color(i);
                let points = PlotPoints::from(trace.points.clone());
                if xy.lines {
                    plot_ui.line(Line::new("", points).color(color).width(1.5).name(&trace.name));
                } else {
                    plot_ui.points(Points::new("", points).radius(3.0).color(color).name(&trace.name));
                }
            }
        });
    }

    /// Histogram or bar chart, with the optional marginal box above the bars.
    pub fn draw_bars(ui: &mut egui::Ui, id: &str, series: &BarSeries, height: f32) {
        let alpha = if series.mode == BarMode::Overlay { 0.5 } else { 0.9 };
        let peak = series
            .bars
            .iter()
            .map(|b| b.top())
            .fold(0.0_f64, f64::max);

        Self::base_plot(id, &series.x_axis, &series.y_axis, height).show(ui, |plot_ui| {
            for (index, name) in series.series_names.iter().enumerate() {
                let color = series_color(index);
                let bars: Vec<Bar> = series
                    .bars
                    .iter()
                    .filter(|b| b.series == index)
                    .map(|b| {
                        Bar::new(b.center, b.value)
                            .width(b.width)
                            .base_offset(b.base)
                            .fill(color.gamma_multiply(alpha))
                            .stroke(Stroke::new(0.5, color))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new("", bars).color(color).name(name));
            }

            if let Some(stats) = series.box_stats {
                let color = series_color(0);
                let position = if peak > 0.0 { peak * 1.12 } else { 1.0 };
                let elem = BoxElem::new(
                    position,
                    BoxSpread::new(
                        stats.lower_whisker,
                        stats.q1,
                        stats.median,
                        stats.q3,
                        stats.upper_whisker,
                    ),
                )
                .box_width(position * 0.08)
                .fill(color.gamma_multiply(0.3))
                .stroke(Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new("", vec![elem]).horizontal().name("box"));
            }
        });
    }

    /// Pie wedges as filled polygons on an axis-free, square plot.
    pub fn draw_pie(ui: &mut egui::Ui, id: &str, pie: &PieSeries, height: f32) {
        Plot::new(id.to_string())
            .height(height)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                let mut start = 0.0;
                for (i, slice) in pie.slices.iter().enumerate() {
                    let end = start + slice.fraction;
                    let color = series_color(i);
                    plot_ui.polygon(
                        Polygon::new("", PlotPoints::from(pie_wedge(start, end)))
                            .fill_color(color)
                            .stroke(Stroke::new(1.0, Color32::WHITE))
                            .name(&slice.label),
                    );
                    if slice.fraction >= 0.03 {
                        let mid = std::f64::consts::FRAC_PI_2
                            - (start + end) / 2.0 * std::f64::consts::TAU;
                        plot_ui.text(Text::new(
                            "",
                            PlotPoint::new(mid.cos() * 0.65, mid.sin() * 0.65),
                            RichText::new(format!("{:.1}%", slice.fraction * 100.0))
                                .color(Color32::WHITE)
                                .strong(),
                        ));
                    }
                    start = end;
                }
            });
        ui.label(
            RichText::new(format!("names: {}    values: {}", pie.names_label, pie.values_label))
                .small()
                .weak(),
        );
    }

    /// Orthographic projection of the normalized cube with draggable angles.
    pub fn draw_scatter3d(
        ui: &mut egui::Ui,
        id: &str,
        series: &Scatter3dSeries,
        view: &mut ViewAngles,
        height: f32,
    ) {
        ui.horizontal(|ui| {
            ui.label("Rotate");
            ui.add(egui::Slider::new(&mut view.yaw, -std::f64::consts::PI..=std::f64::consts::PI).text("yaw"));
            ui.add(
                egui::Slider::new(
                    &mut view.pitch,
                    -std::f64::consts::FRAC_PI_2..=std::f64::consts::FRAC_PI_2,
                )
                .text("pitch"),
            );
        });

        let view = *view;
        let normalized = normalize_3d(&series.points);
        let projected: Vec<[f64; 2]> = normalized.iter().map(|p| project(*p, view)).collect();
        let axis_ends = [[1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]];
        let origin = project([-1.0, -1.0, -1.0], view);

        Plot::new(id.to_string())
            .height(height)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .show(ui, |plot_ui| {
                for (axis, end) in series.axes.iter().zip(axis_ends) {
                    let tip = project(end, view);
                    plot_ui.line(
                        Line::new("", PlotPoints::from(vec![origin, tip]))
                            .color(Color32::GRAY)
                            .width(1.0),
                    );
                    plot_ui.text(Text::new(
                        "",
                        PlotPoint::new(tip[0] * 1.08, tip[1] * 1.08),
                        RichText::new(&axis.label).small(),
                    ));
                }
                plot_ui.points(
                    Points::new("", PlotPoints::from(projected))
                        .radius(2.5)
                        .color(series_color(0)),
                );
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_identity_view() {
        let flat = ViewAngles { yaw: 0.0, pitch: 0.0 };
        assert_eq!(project([0.5, 0.3, -0.2], flat), [0.5, -0.2]);
    }

    #[test]
    fn test_normalize_spans_unit_cube() {
        let pts = normalize_3d(&[[0.0, 10.0, 5.0], [2.0, 20.0, 5.0]]);
        assert_eq!(pts[0], [-1.0, -1.0, 0.0]);
        assert_eq!(pts[1], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_pie_wedge_starts_at_top() {
        let wedge = pie_wedge(0.0, 0.25);
        assert_eq!(wedge[0], [0.0, 0.0]);
        assert!((wedge[1][0] - 0.0).abs() < 1e-9 && (wedge[1][1] - 1.0).abs() < 1e-9);
        let last = wedge[wedge.len() - 1];
        // a quarter turn clockwise ends at 3 o'clock
        assert!((last[0] - 1.0).abs() < 1e-9 && last[1].abs() < 1e-9);
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(series_color(0), series_color(PALETTE.len()));
    }
}
