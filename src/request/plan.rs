//! Render Pass
//! One synchronous evaluation from the current selection to a chart plan or a halt.

use crate::data::{Dataset, SessionStore};
use crate::error::{RenderHalt, RenderResult};
use crate::request::builder::{
    build_categorical_request, build_histogram_request, build_scatter_request,
    build_timeline_request, CategoricalParams, DateRange,
};
use crate::request::selection::{PlotFamily, Selection};
use crate::request::types::{CategoricalCharts, HistogramVariant, PreparedChart};

/// What the chart area should show after a pass.
#[derive(Debug, Clone)]
pub enum RenderPlan {
    /// No chart family picked yet.
    Idle,
    Single(PreparedChart),
    Categorical(CategoricalCharts),
}

/// Knobs the pass needs from the application config.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub pie_advisory_cardinality: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            pie_advisory_cardinality: 50,
        }
    }
}

/// Column at `index`, or the last one when the table is narrower.
pub fn default_column(dataset: &Dataset, index: usize) -> RenderResult<String> {
    let names = dataset.column_names();
    names
        .get(index)
        .or_else(|| names.last())
        .cloned()
        .ok_or_else(|| RenderHalt::Selection("The dataset has no columns.".to_string()))
}

fn chosen_or_default(dataset: &Dataset, chosen: &Option<String>, index: usize) -> RenderResult<String> {
    match chosen {
        Some(name) => Ok(name.clone()),
        None => default_column(dataset, index),
    }
}

/// Evaluate `selection` against a working copy of the dataset.
///
/// Single-column coercions (dates, categories) are applied to `dataset` in
/// place. The first failure halts the pass.
pub fn evaluate(
    dataset: &mut Dataset,
    selection: &Selection,
    options: &PlanOptions,
) -> RenderResult<RenderPlan> {
    let Some(plot) = selection.plot else {
        return Ok(RenderPlan::Idle);
    };

    match plot {
        PlotFamily::Scatter => {
            let s = &selection.scatter;
            let x = chosen_or_default(dataset, &s.x, 0)?;
            let y = chosen_or_default(dataset, &s.y, 1)?;
            let z = if s.three_d {
                Some(chosen_or_default(dataset, &s.z, 1)?)
            } else {
                None
            };
            build_scatter_request(dataset, &x, &y, z.as_deref()).map(RenderPlan::Single)
        }
        PlotFamily::Timeline => {
            let t = &selection.timeline;
            let x = chosen_or_default(dataset, &t.x, 0)?;
            build_timeline_request(dataset, &x, &t.y, t.start, t.end).map(RenderPlan::Single)
        }
        PlotFamily::Histogram => {
            let h = &selection.histogram;
            let columns = match h.variant {
                HistogramVariant::Univariate => vec![chosen_or_default(dataset, &h.x, 0)?],
                HistogramVariant::Multivariate => h.columns.resolve(&dataset.column_names(), 0),
            };
            build_histogram_request(dataset, h.variant, &columns, Some(h.mode))
                .map(RenderPlan::Single)
        }
        PlotFamily::Categorical => {
            let c = &selection.categorical;
            let x = chosen_or_default(dataset, &c.x, 0)?;
            let y = chosen_or_default(dataset, &c.y, 1)?;
            let date_column = if c.dates_only {
                Some(chosen_or_default(dataset, &c.date_column, 0)?)
            } else {
                None
            };
            let params = CategoricalParams {
                x: &x,
                y: &y,
                mode: c.mode,
                date_range: date_column.as_deref().map(|column| DateRange {
                    column,
                    start: c.start,
                    end: c.end,
                }),
                pie_confirmed: c.pie_confirmed,
                advisory_cardinality: options.pie_advisory_cardinality,
            };
            build_categorical_request(dataset, &params).map(RenderPlan::Categorical)
        }
    }
}

/// Run one pass against the session. Halts are logged and returned.
///
/// The pass works on its own copy of the uploaded dataset, so coercions
/// never leak into later passes.
pub fn render_pass(
    session: &SessionStore,
    selection: &Selection,
    options: &PlanOptions,
) -> RenderResult<RenderPlan> {
    let result = session.dataset().and_then(|dataset| {
        let mut working = dataset.clone();
        evaluate(&mut working, selection, options)
    });

    match &result {
        Ok(RenderPlan::Idle) => log::debug!("Render pass: no chart family selected"),
        Ok(_) => log::debug!("Render pass complete for {:?}", selection.plot),
        Err(halt) => log::warn!("Render pass halted ({}): {}", halt.kind(), halt),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::selection::MultiSelect;
    use crate::request::types::{ChartKind, PieGate};
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn session() -> SessionStore {
        let df = df!(
            "date" => ["2024-01-01", "2024-01-02", "2024-01-03"],
            "sales" => [10i64, 20, 30],
            "region" => ["a", "b", "a"]
        )
        .unwrap();
        let mut session = SessionStore::new();
        session.replace(Dataset::new(df).unwrap(), None);
        session
    }

    fn single(plan: RenderPlan) -> PreparedChart {
        match plan {
            RenderPlan::Single(chart) => chart,
            other => panic!("expected single chart, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_input() {
        let empty = SessionStore::new();
        let result = render_pass(&empty, &Selection::default(), &PlanOptions::default());
        assert!(matches!(result, Err(RenderHalt::MissingInput)));
    }

    #[test]
    fn test_no_family_is_idle() {
        let s = session();
        let plan = render_pass(&s, &Selection::default(), &PlanOptions::default()).unwrap();
        assert!(matches!(plan, RenderPlan::Idle));
    }

    #[test]
    fn test_scatter_defaults() {
        let s = session();
        let mut selection = Selection {
            plot: Some(PlotFamily::Scatter),
            ..Default::default()
        };
        let chart = single(render_pass(&s, &selection, &PlanOptions::default()).unwrap());
        assert_eq!(chart.request.kind, ChartKind::Scatter2d);

        selection.scatter.three_d = true;
        let chart = single(render_pass(&s, &selection, &PlanOptions::default()).unwrap());
        assert_eq!(chart.request.kind, ChartKind::Scatter3d);
        assert_eq!(chart.request.z.as_ref().map(|z| z.name()), Some("sales"));
    }

    #[test]
    fn test_timeline_pass() {
        let s = session();
        let selection = Selection {
            plot: Some(PlotFamily::Timeline),
            ..Default::default()
        };
        let chart = single(render_pass(&s, &selection, &PlanOptions::default()).unwrap());
        assert_eq!(chart.request.kind, ChartKind::Timeseries);
    }

    #[test]
    fn test_histogram_multivariate_default_column() {
        let s = session();
        let mut selection = Selection {
            plot: Some(PlotFamily::Histogram),
            ..Default::default()
        };
        selection.histogram.variant = HistogramVariant::Multivariate;
        let chart = single(render_pass(&s, &selection, &PlanOptions::default()).unwrap());
        assert_eq!(chart.request.x.columns()[0].name(), "date");

        selection.histogram.columns = MultiSelect::with_chosen(vec!["sales".into(), "region".into()]);
        let result = render_pass(&s, &selection, &PlanOptions::default());
        assert!(matches!(result, Err(RenderHalt::MixedFormatType { .. })));
    }

    #[test]
    fn test_categorical_pass_and_recovery() {
        let s = session();
        let mut selection = Selection {
            plot: Some(PlotFamily::Categorical),
            ..Default::default()
        };
        selection.categorical.x = Some("region".into());
        selection.categorical.dates_only = true;
        selection.categorical.date_column = Some("region".into());

        // a bad date column halts only this pass
        let result = render_pass(&s, &selection, &PlanOptions::default());
        assert!(matches!(result, Err(RenderHalt::InvalidDateFormat { .. })));

        selection.categorical.date_column = Some("date".into());
        selection.categorical.pie_confirmed = true;
        match render_pass(&s, &selection, &PlanOptions::default()).unwrap() {
            RenderPlan::Categorical(charts) => {
                assert!(matches!(charts.pie, PieGate::Ready(_)));
                assert_eq!(charts.bar.data.height(), 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_categorical_pass_leaves_session_untouched() {
        let s = session();
        let mut histogram = Selection {
            plot: Some(PlotFamily::Histogram),
            ..Default::default()
        };
        histogram.histogram.variant = HistogramVariant::Multivariate;
        histogram.histogram.columns = MultiSelect::with_chosen(vec!["sales".into()]);
        let before = single(render_pass(&s, &histogram, &PlanOptions::default()).unwrap());

        let mut categorical = Selection {
            plot: Some(PlotFamily::Categorical),
            ..Default::default()
        };
        categorical.categorical.x = Some("sales".into());
        categorical.categorical.y = Some("sales".into());
        categorical.categorical.dates_only = true;
        categorical.categorical.date_column = Some("date".into());
        assert!(render_pass(&s, &categorical, &PlanOptions::default()).is_ok());

        let frame = s.dataset().unwrap().frame();
        assert_eq!(frame.column("sales").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("date").unwrap().dtype(), &DataType::String);

        let after = single(render_pass(&s, &histogram, &PlanOptions::default()).unwrap());
        assert_eq!(
            after.data.frame().column("sales").unwrap().dtype(),
            before.data.frame().column("sales").unwrap().dtype()
        );
    }

    #[test]
    fn test_inverted_manual_bounds_halt_categorical() {
        let s = session();
        let mut selection = Selection {
            plot: Some(PlotFamily::Categorical),
            ..Default::default()
        };
        selection.categorical.x = Some("region".into());
        selection.categorical.dates_only = true;
        selection.categorical.date_column = Some("date".into());
        selection.categorical.start = NaiveDate::from_ymd_opt(2024, 1, 3);
        selection.categorical.end = NaiveDate::from_ymd_opt(2024, 1, 2);

        let result = render_pass(&s, &selection, &PlanOptions::default());
        assert!(matches!(result, Err(RenderHalt::InvalidDateRange { .. })));

        selection.categorical.end = None;
        assert!(render_pass(&s, &selection, &PlanOptions::default()).is_ok());
    }
}
