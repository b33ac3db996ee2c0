use std::f64::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Polygon, Text,
    uniform_grid_spacer,
};

use crate::charts::{ChartKind, ChartSpec};
use crate::color::{ColorMap, heat_color};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 300.0;

// ---------------------------------------------------------------------------
// Chart stack (central panel)
// ---------------------------------------------------------------------------

/// Render the five charts, top to bottom.
pub fn chart_stack(ui: &mut Ui, state: &AppState) {
    if state.dashboard.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view OTA performance  (File → Open…)");
        });
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt("chart_stack")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, spec) in state.charts.iter().enumerate() {
                ui.heading(&spec.title);
                if spec.is_empty() {
                    no_data(ui);
                } else {
                    let id = format!("chart_{i}");
                    match spec.kind {
                        ChartKind::Line => line_chart(ui, &id, spec, state.color_map.as_ref()),
                        ChartKind::GroupedBar => bar_chart(ui, &id, spec, state.color_map.as_ref()),
                        ChartKind::Heatmap => heatmap(ui, &id, spec),
                        ChartKind::Pie => pie_chart(ui, &id, spec, state.color_map.as_ref()),
                    }
                }
                ui.add_space(12.0);
            }
        });
}

fn no_data(ui: &mut Ui) {
    let (rect, _) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), CHART_HEIGHT * 0.5),
        egui::Sense::hover(),
    );
    ui.painter()
        .rect_stroke(rect, 4.0, Stroke::new(1.0, Color32::DARK_GRAY), egui::StrokeKind::Inside);
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        "No data",
        egui::FontId::proportional(18.0),
        Color32::GRAY,
    );
}

fn series_color(color_map: Option<&ColorMap>, group: &str) -> Color32 {
    color_map
        .map(|cm| cm.color_for(group))
        .unwrap_or(Color32::LIGHT_BLUE)
}

/// Axis labels for a categorical axis placed at 0, 1, 2, …
fn category_formatter(
    categories: Vec<String>,
) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String + 'static {
    move |mark, _range| {
        let v = mark.value;
        if v < -0.5 || (v - v.round()).abs() > 1e-6 {
            return String::new();
        }
        categories.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

fn category_plot(id: &str, spec: &ChartSpec) -> Plot<'static> {
    Plot::new(id.to_string())
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .x_axis_formatter(category_formatter(spec.x_categories.clone()))
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .allow_scroll(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_zoom(true)
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

fn line_chart(ui: &mut Ui, id: &str, spec: &ChartSpec, color_map: Option<&ColorMap>) {
    category_plot(id, spec).include_y(0.0).show(ui, |plot_ui| {
        for series in &spec.series {
            let points: PlotPoints = series
                .points
                .iter()
                .filter_map(|p| Some([spec.x_index(&p.x)? as f64, p.value as f64]))
                .collect();

            let line = Line::new(points)
                .name(&series.name)
                .color(series_color(color_map, &series.group))
                .width(1.5);

            plot_ui.line(line);
        }
    });
}

// ---------------------------------------------------------------------------
// Grouped bars
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, id: &str, spec: &ChartSpec, color_map: Option<&ColorMap>) {
    let n = spec.series.len().max(1) as f64;
    let slot = 0.8 / n;

    category_plot(id, spec).include_y(0.0).show(ui, |plot_ui| {
        for (s, series) in spec.series.iter().enumerate() {
            let color = series_color(color_map, &series.group);
            let bars: Vec<Bar> = series
                .points
                .iter()
                .filter_map(|p| {
                    let i = spec.x_index(&p.x)? as f64;
                    let x = i - 0.4 + slot * (s as f64 + 0.5);
                    Some(
                        Bar::new(x, p.value as f64)
                            .width(slot * 0.95)
                            .name(format!("{} · {}", p.x, series.name))
                            .fill(color),
                    )
                })
                .collect();

            plot_ui.bar_chart(BarChart::new(bars).name(&series.name).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, id: &str, spec: &ChartSpec) {
    let max = spec.max_value().max(1) as f32;

    Plot::new(id.to_string())
        .height(CHART_HEIGHT)
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .x_axis_formatter(category_formatter(spec.x_categories.clone()))
        .y_axis_formatter(category_formatter(spec.y_categories.clone()))
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .y_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .show_grid(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for series in &spec.series {
                for p in &series.points {
                    let (Some(x), Some(y)) = (
                        spec.x_index(&p.x),
                        p.y.as_deref().and_then(|y| spec.y_index(y)),
                    ) else {
                        continue;
                    };
                    let (x, y) = (x as f64, y as f64);
                    let cell = vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(cell))
                            .fill_color(heat_color(p.value as f32 / max))
                            .stroke(Stroke::new(1.0, Color32::from_gray(20))),
                    );
                    plot_ui.text(Text::new(
                        PlotPoint::new(x, y),
                        RichText::new(p.value.to_string()).color(Color32::WHITE),
                    ));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

/// Wedges are split into pieces of at most a quarter turn so each polygon
/// stays convex.
fn wedge_pieces(start: f64, sweep: f64) -> Vec<Vec<[f64; 2]>> {
    let pieces = (sweep / (TAU / 4.0)).ceil().max(1.0) as usize;
    let step = sweep / pieces as f64;
    (0..pieces)
        .map(|k| {
            let a0 = start + step * k as f64;
            let segments = 16;
            let mut pts = vec![[0.0, 0.0]];
            for j in 0..=segments {
                let a = a0 + step * j as f64 / segments as f64;
                pts.push([a.cos(), a.sin()]);
            }
            pts
        })
        .collect()
}

fn pie_chart(ui: &mut Ui, id: &str, spec: &ChartSpec, color_map: Option<&ColorMap>) {
    let total = spec.total().max(1) as f64;

    Plot::new(id.to_string())
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            // Start at 12 o'clock and run clockwise, like plotly.
            let mut angle = TAU / 4.0;
            for series in &spec.series {
                for p in &series.points {
                    let share = p.value as f64 / total;
                    let sweep = share * TAU;
                    let name = format!("{} ({:.1}%)", p.x, share * 100.0);
                    let color = series_color(color_map, &p.x);
                    for piece in wedge_pieces(angle - sweep, sweep) {
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(piece))
                                .name(&name)
                                .fill_color(color)
                                .stroke(Stroke::new(1.0, Color32::from_gray(20))),
                        );
                    }
                    angle -= sweep;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_whole_positions() {
        let fmt = category_formatter(vec!["Goa-1".into(), "Goa-2".into()]);
        let range = 0.0..=1.0;
        let mark = |value| GridMark { value, step_size: 1.0 };
        assert_eq!(fmt(mark(0.0), &range), "Goa-1");
        assert_eq!(fmt(mark(1.0), &range), "Goa-2");
        assert_eq!(fmt(mark(0.5), &range), "");
        assert_eq!(fmt(mark(2.0), &range), "");
        assert_eq!(fmt(mark(-1.0), &range), "");
    }

    #[test]
    fn wedges_stay_within_a_quarter_turn() {
        let pieces = wedge_pieces(0.0, TAU * 0.9);
        assert_eq!(pieces.len(), 4);
        assert_eq!(wedge_pieces(0.0, 0.1).len(), 1);
        for piece in pieces {
            assert_eq!(piece[0], [0.0, 0.0]);
            assert_eq!(piece.len(), 18);
        }
    }
}
