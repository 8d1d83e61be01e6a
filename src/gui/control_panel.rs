//! Control Panel Widget
//! Left side panel: data source, chart family and per-family selections.

use crate::request::{BarMode, HistogramVariant, MultiSelect, PlotFamily, Selection};
use chrono::{Datelike, NaiveDate};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use egui_extras::DatePickerButton;
use std::path::Path;

const LABEL_WIDTH: f32 = 110.0;
const COMBO_WIDTH: f32 = 170.0;

const SCATTER_HELP: &str = "Please select the variables to be used on the graphs. Check the \
    checkbox below if you wish to view a 3D scatter plot of three variables instead of two.";
const TIMELINE_HELP: &str = "Please select the variables to be used on the graphs. For clear \
    results, variable x should be a date with no duplicate entries and the variable or variables \
    selected for y axis should be either continuous or discrete.";
const HISTOGRAM_HELP: &str = "Please select whether you would like to see a univariate or \
    multivariate histogram. Keep in mind that in the case of a multivariate histogram, all the \
    variables need to have the same format type.";
const CATEGORICAL_HELP: &str = "Please select the x variable. Keep in mind the following: \
    1) The app will automatically attempt to convert the values of the column you selected into \
    a category. For proper visualisation, the variable selected must be categorical. \
    2) The pie chart can be computationally intensive depending on the variables selected and \
    the number of values.";
const MODE_HELP: &str = "relative: bars of several series are stacked, negative values below \
    the axis. group: bars are placed side by side. overlay: bars are drawn on top of each other. \
    stack: bars are stacked in order.";

/// First and last calendar date of the column a date filter runs on.
pub type DateBounds = (NaiveDate, NaiveDate);

/// Left side control panel with file selection and chart settings.
#[derive(Default)]
pub struct ControlPanel {
    pub status: String,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self {
            status: "Ready".to_string(),
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Draw the control panel. `date_bounds` belong to the date column of
    /// the current selection, when it parses.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        selection: &mut Selection,
        columns: &[String],
        source: Option<&Path>,
        date_bounds: Option<DateBounds>,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 LitePlots")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Upload File").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = source
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());
                    ui.label(RichText::new(&path_text).size(12.0).color(if source.is_some() {
                        ui.visuals().text_color()
                    } else {
                        Color32::GRAY
                    }));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                        if source.is_some() && ui.small_button("✖").on_hover_text("Remove file").clicked() {
                            action = ControlPanelAction::ClearFile;
                        }
                    });
                });
            });

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        if columns.is_empty() {
            ui.label(RichText::new(&self.status).size(11.0).color(Color32::GRAY));
            return action;
        }

        // ===== Chart Family =====
        ui.label(RichText::new("What kind of visualization would you like to see?").strong());
        ComboBox::from_id_salt("plot_family")
            .width(COMBO_WIDTH + LABEL_WIDTH)
            .selected_text(
                selection
                    .plot
                    .map(|p| p.label())
                    .unwrap_or("Select Graph Type..."),
            )
            .show_ui(ui, |ui| {
                for family in PlotFamily::ALL {
                    ui.selectable_value(&mut selection.plot, Some(family), family.label());
                }
            });

        ui.add_space(10.0);

        ScrollArea::vertical().show(ui, |ui| {
            match selection.plot {
                Some(PlotFamily::Scatter) => Self::show_scatter(ui, selection, columns),
                Some(PlotFamily::Timeline) => {
                    Self::show_timeline(ui, selection, columns, date_bounds)
                }
                Some(PlotFamily::Histogram) => Self::show_histogram(ui, selection, columns),
                Some(PlotFamily::Categorical) => {
                    Self::show_categorical(ui, selection, columns, date_bounds)
                }
                None => {}
            }

            ui.add_space(15.0);
            ui.separator();
            let status_color = if self.status.contains("Error") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        });

        action
    }

    fn show_scatter(ui: &mut egui::Ui, selection: &mut Selection, columns: &[String]) {
        let s = &mut selection.scatter;
        ui.label(RichText::new(SCATTER_HELP).size(11.0));
        ui.add_space(5.0);
        column_combo(ui, "scatter_x", "Select x variable:", &mut s.x, columns, 0);
        column_combo(ui, "scatter_y", "Select y variable:", &mut s.y, columns, 1);
        ui.separator();
        ui.checkbox(&mut s.three_d, "Visualize 3 variables");
        if s.three_d {
            column_combo(ui, "scatter_z", "Select z variable:", &mut s.z, columns, 1);
        }
    }

    fn show_timeline(
        ui: &mut egui::Ui,
        selection: &mut Selection,
        columns: &[String],
        date_bounds: Option<DateBounds>,
    ) {
        let t = &mut selection.timeline;
        ui.label(RichText::new(TIMELINE_HELP).size(11.0));
        ui.add_space(5.0);
        column_combo(ui, "timeline_x", "Date variable:", &mut t.x, columns, 0);
        date_range_pickers(ui, "timeline", &mut t.start, &mut t.end, date_bounds);

        ui.add_space(5.0);
        ui.label("Select y variables:");
        multi_select(ui, "timeline_y", &mut t.y, columns, 1);
    }

    fn show_histogram(ui: &mut egui::Ui, selection: &mut Selection, columns: &[String]) {
        let h = &mut selection.histogram;
        ui.label(RichText::new(HISTOGRAM_HELP).size(11.0));
        ui.add_space(5.0);
        ui.horizontal(|ui| {
            ui.radio_value(&mut h.variant, HistogramVariant::Univariate, HistogramVariant::Univariate.label());
            ui.radio_value(&mut h.variant, HistogramVariant::Multivariate, HistogramVariant::Multivariate.label());
        });

        match h.variant {
            HistogramVariant::Univariate => {
                column_combo(ui, "hist_x", "Select Variable", &mut h.x, columns, 0);
            }
            HistogramVariant::Multivariate => {
                mode_combo(ui, "hist_mode", "Type of histogram:", &mut h.mode);
                ui.label("Select variables:");
                multi_select(ui, "hist_columns", &mut h.columns, columns, 0);
            }
        }
    }

    fn show_categorical(
        ui: &mut egui::Ui,
        selection: &mut Selection,
        columns: &[String],
        date_bounds: Option<DateBounds>,
    ) {
        let c = &mut selection.categorical;
        ui.label(RichText::new(CATEGORICAL_HELP).size(11.0));
        ui.add_space(5.0);
        column_combo(ui, "cat_x", "Categorical x:", &mut c.x, columns, 0);
        column_combo(ui, "cat_y", "Values for x:", &mut c.y, columns, 1);
        mode_combo(ui, "cat_mode", "Type of barplot:", &mut c.mode);

        ui.add_space(5.0);
        ui.checkbox(&mut c.dates_only, "View charts for selected dates only");
        if c.dates_only {
            column_combo(ui, "cat_date", "Date variable:", &mut c.date_column, columns, 0);
            date_range_pickers(ui, "cat", &mut c.start, &mut c.end, date_bounds);
        }
    }
}

/// Single column picker. `None` shows the column at `default_index`.
fn column_combo(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    value: &mut Option<String>,
    columns: &[String],
    default_index: usize,
) {
    let shown = value
        .clone()
        .or_else(|| columns.get(default_index).or(columns.last()).cloned())
        .unwrap_or_default();

    ui.horizontal(|ui| {
        ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(label));
        ComboBox::from_id_salt(id)
            .width(COMBO_WIDTH)
            .selected_text(&shown)
            .show_ui(ui, |ui| {
                for col in columns {
                    if ui.selectable_label(shown == *col, col).clicked() {
                        *value = Some(col.clone());
                    }
                }
            });
    });
}

fn mode_combo(ui: &mut egui::Ui, id: &str, label: &str, mode: &mut BarMode) {
    ui.horizontal(|ui| {
        ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(label));
        ComboBox::from_id_salt(id)
            .width(COMBO_WIDTH)
            .selected_text(mode.label())
            .show_ui(ui, |ui| {
                for m in BarMode::ALL {
                    ui.selectable_value(mode, m, m.label());
                }
            })
            .response
            .on_hover_text(MODE_HELP);
    });
}

/// Checkbox list with a "select all" toggle that locks the individual boxes.
fn multi_select(
    ui: &mut egui::Ui,
    id: &str,
    select: &mut MultiSelect,
    columns: &[String],
    default_index: usize,
) {
    let resolved = select.resolve(columns, default_index);

    egui::Frame::none()
        .fill(ui.visuals().widgets.noninteractive.bg_fill)
        .rounding(5.0)
        .inner_margin(5.0)
        .show(ui, |ui| {
            ScrollArea::vertical()
                .id_salt(id)
                .max_height(140.0)
                .show(ui, |ui| {
                    ui.add_enabled_ui(!select.is_select_all(), |ui| {
                        for col in columns {
                            let mut checked = resolved.contains(col);
                            if ui.checkbox(&mut checked, col).changed() {
                                if let Err(e) = select.toggle(col, checked, &resolved) {
                                    log::debug!("{}", e);
                                }
                            }
                        }
                    });
                });
        });

    let mut all = select.is_select_all();
    if ui.checkbox(&mut all, "Select all variables").changed() {
        select.set_select_all(all);
    }
}

/// Start and end pickers kept inside the column's dates. `None` stands for
/// the first/last date. A start moved past the end is left for the render
/// pass to reject.
fn date_range_pickers(
    ui: &mut egui::Ui,
    id: &str,
    start: &mut Option<NaiveDate>,
    end: &mut Option<NaiveDate>,
    bounds: Option<DateBounds>,
) {
    let Some((first, last)) = bounds else {
        ui.label(
            RichText::new("Date range pickers appear once the date variable holds valid dates.")
                .size(11.0)
                .color(Color32::GRAY),
        );
        return;
    };

    ui.label(
        RichText::new(format!("Dates available: {} to {}", first, last))
            .size(11.0)
            .color(Color32::GRAY),
    );
    date_picker(ui, &format!("{}_start", id), "Start date:", start, first, (first, last));
    let floor = clamp_date(start.unwrap_or(first), (first, last));
    date_picker(ui, &format!("{}_end", id), "End date:", end, last, (floor, last));
}

fn date_picker(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    value: &mut Option<NaiveDate>,
    fallback: NaiveDate,
    allowed: DateBounds,
) {
    let mut date = value.unwrap_or(fallback);
    ui.horizontal(|ui| {
        ui.add_sized([LABEL_WIDTH, 20.0], egui::Label::new(label));
        let response = ui.add(
            DatePickerButton::new(&mut date)
                .id_salt(id)
                .start_end_years(allowed.0.year()..=allowed.1.year()),
        );
        if response.changed() {
            *value = Some(clamp_date(date, allowed));
        }
        if value.is_some() && ui.small_button("↺").on_hover_text("Reset").clicked() {
            *value = None;
        }
    });
}

/// A floor past the ceiling yields the ceiling.
fn clamp_date(date: NaiveDate, (floor, ceiling): DateBounds) -> NaiveDate {
    date.max(floor).min(ceiling)
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    ClearFile,
}
