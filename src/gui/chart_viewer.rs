//! Chart Viewer Widget
//! Central area: the chart of the latest render pass, or why it halted.

use crate::charts::{build_series, ChartPlotter, ChartSeries, SeriesOptions, ViewAngles};
use crate::error::{RenderHalt, RenderResult, Severity};
use crate::request::{PieAdvisory, PieGate, PreparedChart, RenderPlan};
use egui::{Color32, RichText};

const CHART_HEIGHT: f32 = 480.0;

/// A chart ready to draw, or the halt raised while building its series.
struct ChartCard {
    title: &'static str,
    series: RenderResult<ChartSeries>,
    caption: Option<String>,
}

impl ChartCard {
    fn build(chart: &PreparedChart, options: &SeriesOptions) -> Self {
        let series = build_series(chart, options);
        if let Err(halt) = &series {
            log::warn!("Chart series halted ({}): {}", halt.kind(), halt);
        }
        let caption = chart.request.date_filter.as_ref().map(|f| {
            format!(
                "Showing rows of '{}' from {} to {} ({} rows)",
                f.column,
                f.start,
                f.end,
                chart.data.height()
            )
        });
        Self {
            title: chart.request.title(),
            series,
            caption,
        }
    }
}

enum ViewState {
    Empty,
    Halted(RenderHalt),
    Single(ChartCard),
    Categorical {
        bar: ChartCard,
        pie: Option<ChartCard>,
        advisory: PieAdvisory,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CategoricalTab {
    #[default]
    Bar,
    Pie,
}

/// What the user asked for inside the chart area.
pub enum ViewerAction {
    None,
    ConfirmPie,
    Export {
        title: &'static str,
        series: ChartSeries,
    },
}

pub struct ChartViewer {
    state: ViewState,
    tab: CategoricalTab,
    view: ViewAngles,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            state: ViewState::Empty,
            tab: CategoricalTab::default(),
            view: ViewAngles::default(),
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything derived from the previous dataset.
    pub fn clear(&mut self) {
        self.state = ViewState::Empty;
        self.tab = CategoricalTab::default();
        self.view = ViewAngles::default();
    }

    /// Take the outcome of a render pass and prepare its series once.
    pub fn set_outcome(&mut self, outcome: RenderResult<RenderPlan>, options: &SeriesOptions) {
        self.state = match outcome {
            Err(halt) => ViewState::Halted(halt),
            Ok(RenderPlan::Idle) => ViewState::Empty,
            Ok(RenderPlan::Single(chart)) => ViewState::Single(ChartCard::build(&chart, options)),
            Ok(RenderPlan::Categorical(charts)) => ViewState::Categorical {
                bar: ChartCard::build(&charts.bar, options),
                pie: match &charts.pie {
                    PieGate::Ready(pie) => Some(ChartCard::build(pie, options)),
                    PieGate::AwaitingConfirmation => None,
                },
                advisory: charts.advisory,
            },
        };
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> ViewerAction {
        let mut action = ViewerAction::None;

        match &self.state {
            ViewState::Empty => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("Select a graph type in the side panel").size(18.0).weak());
                });
            }
            ViewState::Halted(halt) => Self::draw_halt(ui, halt),
            ViewState::Single(card) => {
                action = Self::draw_card(ui, "chart_single", card, &mut self.view);
            }
            ViewState::Categorical { bar, pie, advisory } => {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.tab, CategoricalTab::Bar, "Bar Chart");
                    ui.selectable_value(&mut self.tab, CategoricalTab::Pie, "Pie Chart");
                });
                ui.separator();

                match (self.tab, pie) {
                    (CategoricalTab::Bar, _) => {
                        action = Self::draw_card(ui, "chart_bar", bar, &mut self.view);
                    }
                    (CategoricalTab::Pie, Some(card)) => {
                        action = Self::draw_card(ui, "chart_pie", card, &mut self.view);
                    }
                    (CategoricalTab::Pie, None) => {
                        egui::Frame::none()
                            .fill(ui.visuals().widgets.noninteractive.bg_fill)
                            .rounding(5.0)
                            .inner_margin(10.0)
                            .show(ui, |ui| {
                                ui.label(
                                    RichText::new(format!("ℹ {}", advisory.message()))
                                        .color(Color32::from_rgb(52, 152, 219)),
                                );
                                ui.add_space(8.0);
                                if ui.button("Got it, show me anyway").clicked() {
                                    action = ViewerAction::ConfirmPie;
                                }
                            });
                    }
                }
            }
        }

        action
    }

    fn draw_halt(ui: &mut egui::Ui, halt: &RenderHalt) {
        let (icon, color) = match halt.severity() {
            Severity::Prompt => ("ℹ", Color32::from_rgb(52, 152, 219)),
            Severity::Warning => ("⚠", Color32::from_rgb(243, 156, 18)),
        };
        egui::Frame::none()
            .stroke(egui::Stroke::new(1.5, color))
            .rounding(5.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.label(RichText::new(format!("{} {}", icon, halt.user_message())).color(color));
            });
    }

    fn draw_card(
        ui: &mut egui::Ui,
        id: &str,
        card: &ChartCard,
        view: &mut ViewAngles,
    ) -> ViewerAction {
        let mut action = ViewerAction::None;
        match &card.series {
            Err(halt) => Self::draw_halt(ui, halt),
            Ok(series) => {
                ui.horizontal(|ui| {
                    if let Some(caption) = &card.caption {
                        ui.label(RichText::new(caption).size(11.0).color(Color32::GRAY));
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("💾 Export PNG").clicked() {
                            action = ViewerAction::Export {
                                title: card.title,
                                series: series.clone(),
                            };
                        }
                    });
                });
                ChartPlotter::draw(ui, id, card.title, series, view, CHART_HEIGHT);
            }
        }
        action
    }
}
