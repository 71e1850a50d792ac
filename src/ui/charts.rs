use std::f32::consts::TAU;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Plot, PlotBounds, PlotPoint, PlotPoints, Polygon, Text};

use crate::color;
use crate::data::filter::Granularity;
use crate::data::model::{
    bin_value, day_number, instant_to_x, month_start, x_to_instant, DecadeBucket, Season,
    CORR_BIN_WIDTH, DIS_BIN_WIDTH,
};
use crate::state::{AppState, ChartId};

// ---------------------------------------------------------------------------
// Dashboard layout (central panel)
// ---------------------------------------------------------------------------

/// Render all five linked charts.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an analogues file to explore it  (File → Open data…)");
        });
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Reference dates");
            time_chart(ui, state);
            ui.add_space(8.0);

            ui.columns(2, |cols: &mut [Ui]| {
                cols[0].strong("Seasons");
                season_pie(&mut cols[0], state);
                cols[1].strong("Analogue decades");
                decade_chart(&mut cols[1], state);
            });
            ui.add_space(8.0);

            ui.columns(2, |cols: &mut [Ui]| {
                score_chart(&mut cols[0], state, ScoreDim::Correlation);
                score_chart(&mut cols[1], state, ScoreDim::Distance);
            });
        });
}

// ---------------------------------------------------------------------------
// Time bar chart – brush, zoom and the granularity switch
// ---------------------------------------------------------------------------

fn time_chart(ui: &mut Ui, state: &mut AppState) {
    let Some(agg) = state.aggregates.as_ref() else {
        return;
    };
    let counts: Vec<(NaiveDate, usize)> = agg.time.iter().map(|(&d, &c)| (d, c)).collect();
    let y_max = counts.iter().map(|&(_, c)| c).max().unwrap_or(0) as f64;

    let granularity = state.dash.granularity;
    let axis_domain = state.dash.axis_domain;
    let selection = current_overlay(state);

    let bars: Vec<Bar> = counts
        .iter()
        .map(|&(key, count)| {
            let (x, width) = match granularity {
                Granularity::Day => (day_number(key) + 0.5, 0.9),
                Granularity::Month => month_bar(key),
            };
            Bar::new(x, count as f64).width(width).fill(color::BAR_FILL)
        })
        .collect();

    let fmt_granularity = granularity;
    let plot = Plot::new("time_chart")
        .height(220.0)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_scroll(false)
        .allow_zoom([true, false])
        .allow_double_click_reset(false)
        .x_axis_formatter(move |mark: egui_plot::GridMark, _range: &std::ops::RangeInclusive<f64>| {
            format_tick(mark.value, fmt_granularity)
        })
        .label_formatter(move |_name: &str, point: &PlotPoint| {
            format_tick(point.x, fmt_granularity)
        });

    let apply_domain = state.dash.axis_dirty;
    let response = plot.show(ui, |plot_ui: &mut egui_plot::PlotUi| {
        if apply_domain {
            // A transition moved the axis: pin the new domain.
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [axis_domain.0, 0.0],
                [axis_domain.1, (y_max * 1.05).max(1.0)],
            ));
        } else {
            // Keep the x-domain where it is, let the count axis fit.
            plot_ui.set_auto_bounds([false, true]);
        }

        plot_ui.bar_chart(
            BarChart::new(bars).element_formatter(Box::new(move |bar: &Bar, _: &BarChart| {
                format!("{}: {} analogues", format_tick(bar.argument, fmt_granularity), bar.value)
            })),
        );

        // Shaded overlay for the active selection (live drag wins).
        if let Some((lo, hi)) = selection {
            let top = (y_max * 1.05).max(1.0);
            let corners: Vec<[f64; 2]> = vec![[lo, 0.0], [hi, 0.0], [hi, top], [lo, top]];
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(corners))
                    .fill_color(Color32::from_rgba_unmultiplied(0x31, 0x82, 0xBD, 36))
                    .stroke(Stroke::new(1.0, color::BAR_FILL)),
            );
        }

        plot_ui.pointer_coordinate().map(|p: PlotPoint| p.x)
    });
    state.dash.axis_dirty = false;

    let pointer_x = response.inner;

    // Brush: primary drag selects a date range.
    if response.response.drag_started() {
        if let Some(x) = pointer_x {
            state.brush_drag = Some((x, x));
        }
    } else if response.response.dragged() {
        if let (Some(drag), Some(x)) = (state.brush_drag.as_mut(), pointer_x) {
            drag.1 = x;
        }
    } else if response.response.drag_stopped() {
        if let Some((a, b)) = state.brush_drag.take() {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if hi - lo > f64::EPSILON {
                state.brush(x_to_instant(lo), x_to_instant(hi));
            }
        }
    } else if response.response.double_clicked() {
        state.reset_chart(ChartId::Time);
    } else {
        // No gesture of our own: a changed x-domain means a wheel zoom.
        let bounds = response.transform.bounds();
        let seen = (bounds.min()[0], bounds.max()[0]);
        if (seen.0 - axis_domain.0).abs() > 1e-6 || (seen.1 - axis_domain.1).abs() > 1e-6 {
            state.zoom(seen);
        }
    }
}

fn current_overlay(state: &AppState) -> Option<(f64, f64)> {
    if let Some((a, b)) = state.brush_drag {
        return Some(if a <= b { (a, b) } else { (b, a) });
    }
    state
        .dash
        .filters
        .time
        .map(|(lo, hi)| (instant_to_x(lo), instant_to_x(hi)))
}

/// Bar centre and width of one month bucket.
fn month_bar(month_key: NaiveDate) -> (f64, f64) {
    let next = if month_key.month() == 12 {
        NaiveDate::from_ymd_opt(month_key.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month_key.year(), month_key.month() + 1, 1)
    }
    .unwrap_or(month_key);
    let start = day_number(month_key);
    let width = (day_number(next) - start).max(1.0);
    (start + width / 2.0, width * 0.92)
}

fn format_tick(x: f64, granularity: Granularity) -> String {
    let date = x_to_instant(x).date();
    match granularity {
        Granularity::Day => date.format("%d/%m/%Y").to_string(),
        Granularity::Month => month_start(date).format("%b %Y").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Season pie chart (painter-drawn wedges)
// ---------------------------------------------------------------------------

fn season_pie(ui: &mut Ui, state: &mut AppState) {
    let Some(agg) = state.aggregates.as_ref() else {
        return;
    };
    let slices: Vec<(Season, usize)> = agg.seasons.clone();
    let total: usize = slices.iter().map(|&(_, c)| c).sum();
    let selected = state.dash.filters.seasons.clone();

    let side = ui.available_width().min(180.0).max(110.0);
    let (rect, response) = ui.allocate_exact_size(Vec2::new(ui.available_width(), side), Sense::click());
    let painter = ui.painter().with_clip_rect(rect);

    let center = rect.center();
    let radius = (side / 2.0 - 8.0).max(20.0);

    let hover_angle = response
        .hover_pos()
        .and_then(|pos: Pos2| angle_in_pie(center, radius, pos));

    let mut clicked_season: Option<Season> = None;
    let mut hovered_label: Option<String> = None;

    if total == 0 {
        painter.circle_stroke(center, radius, Stroke::new(1.0, Color32::GRAY));
    } else {
        // Wedges start at 12 o'clock and run clockwise, DJF first.
        let mut start = -TAU / 4.0;
        for &(season, count) in &slices {
            if count == 0 {
                continue;
            }
            let sweep = TAU * count as f32 / total as f32;

            let base = color::season_color(season);
            let fill = if selected.is_empty() {
                base
            } else if selected.contains(&season) {
                color::highlight(base)
            } else {
                color::faded(base)
            };

            let hovered = hover_angle.is_some_and(|a: f32| angle_within(a, start, sweep));
            if hovered {
                hovered_label = Some(format!("{season}: {count} analogues"));
                if response.clicked() {
                    clicked_season = Some(season);
                }
            }

            painter.add(egui::Shape::convex_polygon(
                wedge_points(center, radius, start, sweep),
                fill,
                Stroke::new(1.0, Color32::WHITE),
            ));

            // Label the slice when it is wide enough to carry text.
            if sweep > 0.5 {
                let mid = start + sweep / 2.0;
                let pos = center + Vec2::new(mid.cos(), mid.sin()) * (radius * 0.6);
                painter.text(
                    pos,
                    Align2::CENTER_CENTER,
                    season.label(),
                    FontId::proportional(11.0),
                    Color32::from_gray(40),
                );
            }

            start += sweep;
        }
    }

    if let Some(season) = clicked_season {
        state.toggle_season(season);
    }

    // Legend with counts; clicking an entry toggles like the slice does.
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for &(season, count) in &slices {
            let text = egui::RichText::new(format!("{season} {count}"))
                .color(color::season_color(season))
                .strong();
            if ui.selectable_label(selected.contains(&season), text).clicked() {
                state.toggle_season(season);
            }
        }
    });
    if let Some(label) = hovered_label {
        ui.small(label);
    }
}

fn wedge_points(center: Pos2, radius: f32, start: f32, sweep: f32) -> Vec<Pos2> {
    let steps = ((sweep / 0.08).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let a = start + sweep * i as f32 / steps as f32;
        points.push(center + Vec2::new(a.cos(), a.sin()) * radius);
    }
    points
}

/// Angle of `pos` inside the pie disc, normalised to `[-TAU/4, 3*TAU/4)`.
fn angle_in_pie(center: Pos2, radius: f32, pos: Pos2) -> Option<f32> {
    let v = pos - center;
    if v.length() > radius {
        return None;
    }
    let mut angle = v.y.atan2(v.x);
    if angle < -TAU / 4.0 {
        angle += TAU;
    }
    Some(angle)
}

fn angle_within(angle: f32, start: f32, sweep: f32) -> bool {
    angle >= start && angle < start + sweep
}

// ---------------------------------------------------------------------------
// Decade row chart (horizontal bars)
// ---------------------------------------------------------------------------

fn decade_chart(ui: &mut Ui, state: &mut AppState) {
    let Some(agg) = state.aggregates.as_ref() else {
        return;
    };
    let rows: Vec<(DecadeBucket, usize)> = agg.decades.clone();
    let selected = state.dash.filters.decades.clone();
    let n = rows.len();
    let x_max = rows.iter().map(|&(_, c)| c).max().unwrap_or(0) as f64;

    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, &(decade, count))| {
            let base = color::decade_color(decade);
            let fill = if selected.is_empty() {
                base
            } else if selected.contains(&decade) {
                color::highlight(base)
            } else {
                color::faded(base)
            };
            // Earliest decade on the top row.
            Bar::new((n - 1 - i) as f64, count as f64).width(0.8).fill(fill)
        })
        .collect();

    let labels: Vec<(f64, String)> = rows
        .iter()
        .enumerate()
        .map(|(i, &(decade, count))| ((n - 1 - i) as f64, format!("{decade}  ({count})")))
        .collect();

    let response = Plot::new("decade_chart")
        .height(180.0)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_double_click_reset(false)
        .show_axes([true, false])
        .x_axis_label("Count")
        .show(ui, |plot_ui: &mut egui_plot::PlotUi| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [0.0, -0.6],
                [(x_max * 1.1).max(1.0), n as f64 - 0.4],
            ));
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
            let label_x = (x_max * 1.1).max(1.0) * 0.02;
            for (y, text) in &labels {
                plot_ui.text(
                    Text::new(PlotPoint::new(label_x, *y), text.clone())
                        .anchor(Align2::LEFT_CENTER)
                        .color(Color32::from_gray(60)),
                );
            }
            plot_ui.pointer_coordinate().map(|p: PlotPoint| p.y)
        });

    if response.response.clicked() {
        if let Some(y) = response.inner {
            let row = y.round();
            if row >= 0.0 && (row as usize) < n {
                let idx = n - 1 - row as usize;
                let decade = rows[idx].0;
                state.toggle_decade(decade);
            }
        }
    } else if response.response.double_clicked() {
        state.reset_chart(ChartId::Decade);
    }
}

// ---------------------------------------------------------------------------
// Correlation / distance bar charts
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum ScoreDim {
    Correlation,
    Distance,
}

fn score_chart(ui: &mut Ui, state: &mut AppState, dim: ScoreDim) {
    let Some(agg) = state.aggregates.as_ref() else {
        return;
    };

    let (title, rows, range, bin_width, selected): (
        &str,
        Vec<(i64, usize)>,
        (f64, f64),
        f64,
        std::collections::BTreeSet<i64>,
    ) = match dim {
        ScoreDim::Correlation => (
            "Correlation",
            agg.corr.clone(),
            state.dataset.as_ref().map(|ds| ds.corr_range).unwrap_or((0.0, 1.0)),
            CORR_BIN_WIDTH,
            state.dash.filters.corr_bins.clone(),
        ),
        ScoreDim::Distance => (
            "Distance",
            agg.dis.clone(),
            state.dataset.as_ref().map(|ds| ds.dis_range).unwrap_or((0.0, 1.0)),
            DIS_BIN_WIDTH,
            state.dash.filters.dis_bins.clone(),
        ),
    };

    ui.strong(title);

    let y_max = rows.iter().map(|&(_, c)| c).max().unwrap_or(0) as f64;
    let bars: Vec<Bar> = rows
        .iter()
        .map(|&(bin, count)| {
            let fill = if selected.is_empty() {
                color::BAR_FILL
            } else if selected.contains(&bin) {
                color::highlight(color::BAR_FILL)
            } else {
                color::faded(color::BAR_FILL)
            };
            Bar::new(bin_value(bin, bin_width), count as f64)
                .width(bin_width * 0.98)
                .fill(fill)
        })
        .collect();

    let fmt_dim = dim;
    let response = Plot::new(title)
        .height(180.0)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_double_click_reset(false)
        .x_axis_label(title)
        .y_axis_label("Count")
        .show(ui, |plot_ui: &mut egui_plot::PlotUi| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [range.0 - bin_width / 2.0, 0.0],
                [range.1 + bin_width / 2.0, (y_max * 1.05).max(1.0)],
            ));
            plot_ui.bar_chart(BarChart::new(bars).element_formatter(Box::new(
                move |bar: &Bar, _: &BarChart| {
                    format!("{}: {} analogues", format_score(bar.argument, fmt_dim), bar.value)
                },
            )));
            plot_ui.pointer_coordinate().map(|p: PlotPoint| p.x)
        });

    if response.response.clicked() {
        if let Some(x) = response.inner {
            let bin = (x / bin_width).round() as i64;
            if rows.iter().any(|&(b, _)| b == bin) {
                match dim {
                    ScoreDim::Correlation => state.toggle_corr_bin(bin),
                    ScoreDim::Distance => state.toggle_dis_bin(bin),
                }
            }
        }
    } else if response.response.double_clicked() {
        state.reset_chart(match dim {
            ScoreDim::Correlation => ChartId::Correlation,
            ScoreDim::Distance => ChartId::Distance,
        });
    }
}

fn format_score(value: f64, dim: ScoreDim) -> String {
    match dim {
        ScoreDim::Correlation => format!("{value:.1}"),
        ScoreDim::Distance => format!("{value:.0}"),
    }
}
