//! LitePlots Main Application
//! Main window: control panel on the left, intro, preview and charts in the center.

use crate::charts::{export_png, ChartSeries, SeriesOptions};
use crate::config::AppConfig;
use crate::data::{validate_date_column, DataLoader, SessionStore};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, DateBounds, ViewerAction};
use crate::request::{default_column, render_pass, PlanOptions, PlotFamily, Selection};
use egui::{RichText, ScrollArea, SidePanel};
use polars::prelude::AnyValue;

const INTRO: &str = "Welcome to LitePlots, a lightweight visualization app. Its purpose is to \
efficiently display a selection of common plots.\n\n\
It is capable of producing plots for most datasets in .csv format. All visualizations provide \
interactive functionality.\n\n\
Please note that this app is not optimized for handling large datasets. Users are advised to \
have some familiarity with their dataset before loading it into the app, as certain \
visualizations can be computationally intensive when dealing with sizable datasets or variables \
with certain format types.\n\n\
To begin, upload your file with the Browse button and select your choices as they appear. For \
easier navigation between graphs, consider folding this introduction and the file viewer after \
uploading your file.";

/// Main application window.
pub struct LitePlotsApp {
    config: AppConfig,
    loader: DataLoader,
    session: SessionStore,
    selection: Selection,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    show_file: bool,
    /// Generation and selection of the last render pass.
    last_pass: Option<(u64, Selection)>,
    /// Date bounds keyed by generation and column name.
    bounds_cache: Option<((u64, String), Option<DateBounds>)>,
}

impl LitePlotsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            loader: DataLoader::new(config.infer_schema_length),
            config,
            session: SessionStore::new(),
            selection: Selection::default(),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            show_file: false,
            last_pass: None,
            bounds_cache: None,
        }
    }

    fn series_options(&self) -> SeriesOptions {
        SeriesOptions {
            bins: self.config.histogram_bins,
            bar_gap: self.config.histogram_bar_gap,
        }
    }

    fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            pie_advisory_cardinality: self.config.pie_advisory_cardinality,
        }
    }

    /// Handle CSV file selection. Loading is synchronous.
    fn handle_browse_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        match self.loader.load_csv(&path) {
            Ok(dataset) => {
                let status = format!(
                    "Loaded {} rows, {} columns",
                    dataset.height(),
                    dataset.width()
                );
                self.session.replace(dataset, Some(path));
                self.reset_derived();
                self.control_panel.set_status(status);
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.control_panel.set_status(format!("Error: {}", e));
            }
        }
    }

    fn handle_clear_file(&mut self) {
        self.session.clear();
        self.reset_derived();
        self.control_panel.set_status("Ready");
    }

    /// Everything computed from the previous dataset is dropped.
    fn reset_derived(&mut self) {
        self.selection = Selection::default();
        self.chart_viewer.clear();
        self.last_pass = None;
        self.bounds_cache = None;
    }

    fn handle_export(&mut self, title: &str, series: &ChartSeries) {
        let file_name = format!("{}.png", title.to_lowercase().replace(' ', "_"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(file_name)
            .save_file()
        else {
            return;
        };

        let size = (self.config.export_width, self.config.export_height);
        match export_png(series, title, &path, size) {
            Ok(()) => {
                self.control_panel
                    .set_status(format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    log::warn!("Could not open {}: {}", path.display(), e);
                }
            }
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.control_panel.set_status(format!("Error: {}", e));
            }
        }
    }

    /// Run a pass when the dataset or the selection changed since the last one.
    fn refresh(&mut self) {
        if let Some((_, last)) = &self.last_pass {
            if !self.selection.categorical.same_charts(&last.categorical) {
                self.selection.categorical.pie_confirmed = false;
            }
        }

        let generation = self.session.generation();
        let up_to_date = matches!(
            &self.last_pass,
            Some((g, s)) if *g == generation && *s == self.selection
        );
        if up_to_date {
            return;
        }

        let plan_options = self.plan_options();
        let outcome = render_pass(&self.session, &self.selection, &plan_options);
        let options = self.series_options();
        self.chart_viewer.set_outcome(outcome, &options);
        self.last_pass = Some((generation, self.selection.clone()));
    }

    /// First and last date of the column the selection filters on, if it
    /// parses as dates.
    fn date_bounds(&mut self) -> Option<DateBounds> {
        let dataset = self.session.dataset().ok()?;
        let chosen = match self.selection.plot? {
            PlotFamily::Timeline => self.selection.timeline.x.clone(),
            PlotFamily::Categorical if self.selection.categorical.dates_only => {
                self.selection.categorical.date_column.clone()
            }
            _ => return None,
        };
        let name = match chosen {
            Some(name) => name,
            None => default_column(dataset, 0).ok()?,
        };

        let key = (self.session.generation(), name);
        if let Some((cached_key, bounds)) = &self.bounds_cache {
            if *cached_key == key {
                return *bounds;
            }
        }
        let bounds = dataset
            .column_ref(&key.1)
            .and_then(|column| validate_date_column(dataset, &column))
            .map(|dates| (dates.min_date(), dates.max_date()))
            .ok();
        self.bounds_cache = Some((key, bounds));
        bounds
    }

    fn show_preview(&self, ui: &mut egui::Ui) {
        let Ok(dataset) = self.session.dataset() else {
            return;
        };
        let preview = dataset.preview(self.config.preview_rows);
        ui.label(RichText::new("Uploaded File").size(16.0).strong());
        ui.label(
            RichText::new(format!(
                "{} rows x {} columns (showing up to {})",
                dataset.height(),
                dataset.width(),
                self.config.preview_rows
            ))
            .size(11.0)
            .weak(),
        );

        ScrollArea::both()
            .id_salt("preview")
            .max_height(260.0)
            .show(ui, |ui| {
                egui::Grid::new("preview_grid")
                    .striped(true)
                    .min_col_width(60.0)
                    .show(ui, |ui| {
                        for name in preview.get_column_names() {
                            ui.label(RichText::new(name.as_str()).strong());
                        }
                        ui.end_row();
                        for row in 0..preview.height() {
                            for column in preview.get_columns() {
                                let text = match column.get(row) {
                                    Ok(AnyValue::Null) | Err(_) => String::new(),
                                    Ok(AnyValue::String(s)) => s.to_string(),
                                    Ok(value) => value.to_string(),
                                };
                                ui.label(text);
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

impl eframe::App for LitePlotsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let columns = self
            .session
            .dataset()
            .map(|d| d.column_names())
            .unwrap_or_default();
        let date_bounds = self.date_bounds();

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(320.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                let action = self.control_panel.show(
                    ui,
                    &mut self.selection,
                    &columns,
                    self.session.source(),
                    date_bounds,
                );
                match action {
                    ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                    ControlPanelAction::ClearFile => self.handle_clear_file(),
                    ControlPanelAction::None => {}
                }
            });

        self.refresh();

        // Central panel - intro, file viewer and charts
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                egui::CollapsingHeader::new(RichText::new("Introduction").strong())
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.label(RichText::new("LitePlots").size(24.0).strong());
                        ui.label(INTRO);
                    });
                ui.separator();

                if self.session.is_loaded() {
                    ui.checkbox(&mut self.show_file, "Show Uploaded File");
                    if self.show_file {
                        self.show_preview(ui);
                    }
                    ui.separator();
                }

                match self.chart_viewer.show(ui) {
                    ViewerAction::None => {}
                    ViewerAction::ConfirmPie => {
                        self.selection.categorical.pie_confirmed = true;
                        ctx.request_repaint();
                    }
                    ViewerAction::Export { title, series } => self.handle_export(title, &series),
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::error::RenderHalt;
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn app_with_data() -> LitePlotsApp {
        let mut app = LitePlotsApp::with_config(AppConfig::default());
        let df = df!(
            "region" => ["a", "b", "a"],
            "sales" => [1i64, 2, 3],
            "date" => ["2024-01-03", "2024-01-01", "2024-01-02"]
        )
        .unwrap();
        app.session.replace(Dataset::new(df).unwrap(), None);
        app
    }

    #[test]
    fn test_refresh_only_on_change() {
        let mut app = app_with_data();
        app.refresh();
        assert!(app.last_pass.is_some());

        app.selection.plot = Some(PlotFamily::Categorical);
        app.refresh();
        let (_, last) = app.last_pass.as_ref().unwrap();
        assert_eq!(last.plot, Some(PlotFamily::Categorical));
    }

    #[test]
    fn test_pie_confirmation_resets_on_new_choices() {
        let mut app = app_with_data();
        app.selection.plot = Some(PlotFamily::Categorical);
        app.refresh();

        app.selection.categorical.pie_confirmed = true;
        app.refresh();
        assert!(app.selection.categorical.pie_confirmed);

        app.selection.categorical.y = Some("region".into());
        app.refresh();
        assert!(!app.selection.categorical.pie_confirmed);
    }

    #[test]
    fn test_clear_file_drops_selection() {
        let mut app = app_with_data();
        app.selection.plot = Some(PlotFamily::Scatter);
        app.refresh();
        app.handle_clear_file();
        assert!(!app.session.is_loaded());
        assert_eq!(app.selection, Selection::default());
        assert!(app.last_pass.is_none());

        // with nothing uploaded the pass halts with a prompt
        app.refresh();
        assert!(app.last_pass.is_some());
        let plan_options = app.plan_options();
        let outcome = render_pass(&app.session, &app.selection, &plan_options);
        assert!(matches!(outcome, Err(RenderHalt::MissingInput)));
    }

    #[test]
    fn test_date_bounds_follow_selected_column() {
        let mut app = app_with_data();
        assert_eq!(app.date_bounds(), None);

        app.selection.plot = Some(PlotFamily::Timeline);
        app.selection.timeline.x = Some("date".into());
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(app.date_bounds(), Some((first, last)));

        app.selection.timeline.x = Some("region".into());
        assert_eq!(app.date_bounds(), None);
    }
}
