//! Chart Request Builder
//! Turns column choices into validated chart requests and their data subsets.

use crate::data::{validate_date_column, ColumnKind, ColumnRef, Dataset, DateColumn, DateFilter};
use crate::error::{RenderHalt, RenderResult};
use crate::request::selection::MultiSelect;
use crate::request::types::{
    BarMode, Binding, CategoricalCharts, ChartKind, ChartRequest, HistogramVariant, PieAdvisory,
    PieGate, PreparedChart,
};
use chrono::NaiveDate;

/// Date window as picked in the UI, before clamping.
#[derive(Debug, Clone, Copy)]
pub struct DateRange<'a> {
    pub column: &'a str,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Inputs of the bar/pie pair.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalParams<'a> {
    pub x: &'a str,
    pub y: &'a str,
    pub mode: BarMode,
    pub date_range: Option<DateRange<'a>>,
    pub pie_confirmed: bool,
    pub advisory_cardinality: usize,
}

/// Validate a date column and replace it in place by its datetime form.
pub fn coerce_date_column(dataset: &mut Dataset, column: &ColumnRef) -> RenderResult<DateColumn> {
    let date_column = validate_date_column(dataset, column)?;
    dataset.replace_column(date_column.to_series()?)?;
    Ok(date_column)
}

/// Coerce the range's column, clamp the window and cut the subset.
fn apply_date_range(
    dataset: &mut Dataset,
    range: &DateRange<'_>,
) -> RenderResult<(DateFilter, Dataset)> {
    let column = dataset.column_ref(range.column)?;
    let date_column = coerce_date_column(dataset, &column)?;
    let filter = DateFilter::new(&date_column, range.start, range.end)?;
    let subset = filter.apply(dataset, &date_column)?;
    Ok((filter, subset))
}

/// Two- or three-variable scatter. Column types are not checked here;
/// unplottable values surface when the chart is drawn.
pub fn build_scatter_request(
    dataset: &Dataset,
    x: &str,
    y: &str,
    z: Option<&str>,
) -> RenderResult<PreparedChart> {
    let x = dataset.column_ref(x)?;
    let y = dataset.column_ref(y)?;
    let z = z.map(|z| dataset.column_ref(z)).transpose()?;

    let kind = if z.is_some() {
        ChartKind::Scatter3d
    } else {
        ChartKind::Scatter2d
    };
    let request = ChartRequest::new(kind, Binding::One(x))
        .with_y(Binding::One(y))
        .with_z(z);

    log::debug!("Built {:?} request on {:?}", kind, request.columns());
    Ok(PreparedChart {
        request,
        data: dataset.clone(),
    })
}

/// Line chart over a date x axis.
///
/// The x column must pass date validation and is coerced in place. The y
/// options are the columns of the date-filtered subset; the chosen set
/// must be non-empty and mutually comparable.
pub fn build_timeline_request(
    dataset: &mut Dataset,
    x: &str,
    y: &MultiSelect,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> RenderResult<PreparedChart> {
    let x_ref = dataset.column_ref(x)?;
    let (filter, subset) = apply_date_range(
        dataset,
        &DateRange {
            column: x,
            start,
            end,
        },
    )?;

    let options = subset.column_names();
    let chosen = y.resolve(&options, 1);
    if chosen.is_empty() {
        return Err(RenderHalt::Selection(
            "Select at least one variable for the y axis.".to_string(),
        ));
    }
    let y_refs = chosen
        .iter()
        .map(|name| subset.column_ref(name))
        .collect::<RenderResult<Vec<_>>>()?;
    subset.ensure_comparable(&y_refs)?;

    let request = ChartRequest::new(ChartKind::Timeseries, Binding::One(x_ref))
        .with_y(Binding::Many(y_refs))
        .with_date_filter(Some(filter));

    log::debug!(
        "Built timeline request on {:?} ({} rows)",
        request.columns(),
        subset.height()
    );
    Ok(PreparedChart {
        request,
        data: subset,
    })
}

/// Univariate takes exactly one column; multivariate takes one or more
/// mutually comparable columns and a composition mode.
pub fn build_histogram_request(
    dataset: &Dataset,
    variant: HistogramVariant,
    columns: &[String],
    mode: Option<BarMode>,
) -> RenderResult<PreparedChart> {
    let request = match variant {
        HistogramVariant::Univariate => {
            let [column] = columns else {
                return Err(RenderHalt::Selection(
                    "A univariate histogram takes exactly one variable.".to_string(),
                ));
            };
            ChartRequest::new(
                ChartKind::HistogramUnivariate,
                Binding::One(dataset.column_ref(column)?),
            )
        }
        HistogramVariant::Multivariate => {
            if columns.is_empty() {
                return Err(RenderHalt::Selection(
                    "Select at least one variable.".to_string(),
                ));
            }
            let refs = columns
                .iter()
                .map(|name| dataset.column_ref(name))
                .collect::<RenderResult<Vec<_>>>()?;
            dataset.ensure_comparable(&refs)?;
            ChartRequest::new(ChartKind::HistogramMultivariate, Binding::Many(refs))
                .with_mode(mode.unwrap_or_default())
        }
    };

    log::debug!("Built {:?} request on {:?}", request.kind, request.columns());
    Ok(PreparedChart {
        request,
        data: dataset.clone(),
    })
}

/// Bar chart and pie chart over one categorical x.
///
/// x is coerced to a categorical in place. Both charts share the same
/// (optionally date-filtered) subset. The pie is only produced once the
/// user has confirmed it.
pub fn build_categorical_request(
    dataset: &mut Dataset,
    params: &CategoricalParams<'_>,
) -> RenderResult<CategoricalCharts> {
    let x = dataset.column_ref(params.x)?;
    dataset.coerce_to_categorical(&x)?;
    let y = dataset.column_ref(params.y)?;

    let (filter, subset) = match &params.date_range {
        Some(range) => {
            let (filter, subset) = apply_date_range(dataset, range)?;
            (Some(filter), subset)
        }
        None => (None, dataset.clone()),
    };

    let advisory = PieAdvisory {
        categories: subset.cardinality(&x)?,
        threshold: params.advisory_cardinality,
        values_numeric: subset.kind(&y) == ColumnKind::Numeric,
    };

    let bar = ChartRequest::new(ChartKind::Bar, Binding::One(x.clone()))
        .with_y(Binding::One(y.clone()))
        .with_mode(params.mode)
        .with_date_filter(filter.clone());

    let pie = if params.pie_confirmed {
        let request = ChartRequest::new(ChartKind::Pie, Binding::One(x))
            .with_y(Binding::One(y))
            .with_date_filter(filter);
        PieGate::Ready(PreparedChart {
            request,
            data: subset.clone(),
        })
    } else {
        PieGate::AwaitingConfirmation
    };

    if advisory.is_heavy() {
        log::debug!(
            "Pie advisory: {} categories, numeric values: {}",
            advisory.categories,
            advisory.values_numeric
        );
    }

    Ok(CategoricalCharts {
        bar: PreparedChart {
            request: bar,
            data: subset,
        },
        pie,
        advisory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

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

    fn names(refs: Vec<&ColumnRef>) -> Vec<&str> {
        refs.into_iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_scatter_2d_and_3d() {
        let ds = shop();
        let chart = build_scatter_request(&ds, "sales", "cost", None).unwrap();
        assert_eq!(chart.request.kind, ChartKind::Scatter2d);

        let chart = build_scatter_request(&ds, "sales", "cost", Some("region")).unwrap();
        assert_eq!(chart.request.kind, ChartKind::Scatter3d);
        assert_eq!(names(chart.request.columns()), vec!["sales", "cost", "region"]);
    }

    #[test]
    fn test_scatter_does_not_check_types() {
        let ds = shop();
        assert!(build_scatter_request(&ds, "region", "date", None).is_ok());
        assert!(matches!(
            build_scatter_request(&ds, "region", "nope", None),
            Err(RenderHalt::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_timeline_default_y_is_second_column() {
        let mut ds = shop();
        let chart =
            build_timeline_request(&mut ds, "date", &MultiSelect::default(), None, None).unwrap();
        assert_eq!(chart.request.kind, ChartKind::Timeseries);
        assert_eq!(names(chart.request.columns()), vec!["date", "sales", "date"]);
        assert_eq!(chart.data.height(), 4);
        // x was coerced in place on the working copy
        let date = ds.column_ref("date").unwrap();
        assert_eq!(ds.kind(&date), ColumnKind::Date);
    }

    #[test]
    fn test_timeline_filters_rows() {
        let mut ds = shop();
        let y = MultiSelect::with_chosen(vec!["sales".into(), "cost".into()]);
        let chart =
            build_timeline_request(&mut ds, "date", &y, Some(ymd(2024, 1, 2)), Some(ymd(2024, 1, 3)))
                .unwrap();
        assert_eq!(chart.data.height(), 2);
        let filter = chart.request.date_filter.unwrap();
        assert_eq!(filter.start, ymd(2024, 1, 2));
        assert_eq!(filter.end, ymd(2024, 1, 3));
    }

    #[test]
    fn test_timeline_mixed_types() {
        let mut ds = shop();
        let y = MultiSelect::with_chosen(vec!["sales".into(), "region".into()]);
        let err = build_timeline_request(&mut ds, "date", &y, None, None).unwrap_err();
        assert!(matches!(err, RenderHalt::MixedFormatType { .. }));
    }

    #[test]
    fn test_timeline_select_all_includes_every_column() {
        let mut ds = shop();
        let mut y = MultiSelect::default();
        y.set_select_all(true);
        // date, numbers and text together are not comparable
        let err = build_timeline_request(&mut ds, "date", &y, None, None).unwrap_err();
        match err {
            RenderHalt::MixedFormatType { columns } => assert_eq!(columns.len(), 4),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_timeline_rejects_non_date_x() {
        let mut ds = shop();
        let err =
            build_timeline_request(&mut ds, "region", &MultiSelect::default(), None, None)
                .unwrap_err();
        assert!(matches!(err, RenderHalt::InvalidDateFormat { .. }));
    }

    #[test]
    fn test_timeline_empty_y() {
        let mut ds = shop();
        let y = MultiSelect::with_chosen(vec![]);
        let err = build_timeline_request(&mut ds, "date", &y, None, None).unwrap_err();
        assert!(matches!(err, RenderHalt::Selection(_)));
    }

    #[test]
    fn test_histograms() {
        let ds = shop();
        let uni = build_histogram_request(
            &ds,
            HistogramVariant::Univariate,
            &["sales".to_string()],
            None,
        )
        .unwrap();
        assert_eq!(uni.request.kind, ChartKind::HistogramUnivariate);
        assert_eq!(uni.request.mode, None);

        let two = ["sales".to_string(), "cost".to_string()];
        assert!(matches!(
            build_histogram_request(&ds, HistogramVariant::Univariate, &two, None),
            Err(RenderHalt::Selection(_))
        ));

        let multi =
            build_histogram_request(&ds, HistogramVariant::Multivariate, &two, Some(BarMode::Overlay))
                .unwrap();
        assert_eq!(multi.request.kind, ChartKind::HistogramMultivariate);
        assert_eq!(multi.request.mode, Some(BarMode::Overlay));

        let mixed = ["sales".to_string(), "region".to_string()];
        assert!(matches!(
            build_histogram_request(&ds, HistogramVariant::Multivariate, &mixed, None),
            Err(RenderHalt::MixedFormatType { .. })
        ));
    }

    #[test]
    fn test_categorical_pair_shares_subset() {
        let mut ds = shop();
        let params = CategoricalParams {
            x: "region",
            y: "sales",
            mode: BarMode::Group,
            date_range: Some(DateRange {
                column: "date",
                start: Some(ymd(2024, 1, 2)),
                end: None,
            }),
            pie_confirmed: true,
            advisory_cardinality: 50,
        };
        let charts = build_categorical_request(&mut ds, &params).unwrap();
        assert_eq!(charts.bar.request.kind, ChartKind::Bar);
        assert_eq!(charts.bar.request.mode, Some(BarMode::Group));
        assert_eq!(charts.bar.data.height(), 3);
        match charts.pie {
            PieGate::Ready(pie) => {
                assert_eq!(pie.request.kind, ChartKind::Pie);
                assert_eq!(pie.data.height(), charts.bar.data.height());
            }
            PieGate::AwaitingConfirmation => panic!("pie was confirmed"),
        }
        assert!(!charts.advisory.is_heavy());

        let region = ds.column_ref("region").unwrap();
        assert_eq!(ds.kind(&region), ColumnKind::Categorical);
    }

    #[test]
    fn test_pie_waits_for_confirmation() {
        let mut ds = shop();
        let params = CategoricalParams {
            x: "region",
            y: "sales",
            mode: BarMode::Relative,
            date_range: None,
            pie_confirmed: false,
            advisory_cardinality: 2,
        };
        let charts = build_categorical_request(&mut ds, &params).unwrap();
        assert!(matches!(charts.pie, PieGate::AwaitingConfirmation));
        assert_eq!(charts.advisory.categories, 3);
        assert!(charts.advisory.is_heavy());
    }

    #[test]
    fn test_high_cardinality_float_column_is_categorical_with_advisory() {
        let values: Vec<f64> = (0..10_000).map(|i| i as f64 * 0.5).collect();
        let weights: Vec<i64> = (0..10_000).collect();
        let mut ds = Dataset::new(df!("v" => values, "w" => weights).unwrap()).unwrap();
        let params = CategoricalParams {
            x: "v",
            y: "w",
            mode: BarMode::Stack,
            date_range: None,
            pie_confirmed: false,
            advisory_cardinality: 50,
        };
        let charts = build_categorical_request(&mut ds, &params).unwrap();
        assert_eq!(charts.advisory.categories, 10_000);
        assert!(charts.advisory.is_heavy());
        assert!(matches!(charts.pie, PieGate::AwaitingConfirmation));
    }
}
