use chrono::{NaiveDate, NaiveDateTime};

use crate::data::filter::{aggregate, Aggregates, DimensionId, FilterSet, Granularity};
use crate::data::loader::RunConfig;
use crate::data::model::{day_number, noon, x_to_instant, AnalogDataset, DecadeBucket, Season};

// ---------------------------------------------------------------------------
// Granularity policy
// ---------------------------------------------------------------------------

/// Cutoff between day and month buckets on the time chart, in days.
/// Rendering thousands of daily bars across a multi-decade span is useless
/// and slow, so wide selections fall back to month buckets.
pub const RESOLUTION_LIMIT_DAYS: f64 = 260.0;

/// Day buckets at or below the limit, month buckets above it.
pub fn granularity_for_span(span_days: f64) -> Granularity {
    if span_days <= RESOLUTION_LIMIT_DAYS {
        Granularity::Day
    } else {
        Granularity::Month
    }
}

// ---------------------------------------------------------------------------
// Brush-edge recovery
// ---------------------------------------------------------------------------

/// Calendar day selected by the left edge of a brush interval. Records are
/// stamped at noon and the range is inclusive, so an edge strictly after
/// noon can only admit the next day.
pub fn brush_start_day(ts: NaiveDateTime) -> NaiveDate {
    if ts.time() > noon() {
        ts.date().succ_opt().unwrap_or(ts.date())
    } else {
        ts.date()
    }
}

/// Calendar day selected by the right edge: strictly before noon means the
/// last admitted record is on the previous day.
pub fn brush_end_day(ts: NaiveDateTime) -> NaiveDate {
    if ts.time() < noon() {
        ts.date().pred_opt().unwrap_or(ts.date())
    } else {
        ts.date()
    }
}

// ---------------------------------------------------------------------------
// Dashboard state – the filter coordinator
// ---------------------------------------------------------------------------

/// Which action last defined the time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSource {
    /// Manual date-picker entry.
    Calendar,
    /// A chart-native brush or zoom gesture.
    Brush,
}

/// Identifies a chart for per-chart resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartId {
    Time,
    Season,
    Decade,
    Correlation,
    Distance,
}

/// Baseline of the previous zoom step, for the stuck-zoom guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBaseline {
    pub span_days: f64,
    pub bounds: (f64, f64),
}

/// The explicit, render-free interaction state: active filters, time-chart
/// granularity, range source-of-truth and the zoom baseline. Every
/// transition ends with the caller rebuilding all chart aggregates — there
/// is no partial-redraw contract.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub filters: FilterSet,
    pub granularity: Granularity,
    pub source: RangeSource,
    /// Date-picker fields, mirroring the current time selection.
    pub picker_start: NaiveDate,
    pub picker_end: NaiveDate,
    /// Time-axis x-domain (day numbers, see [`day_number`]).
    pub axis_domain: (f64, f64),
    /// Set when a transition changed `axis_domain`; the time chart applies
    /// the new domain on its next frame and clears the flag.
    pub axis_dirty: bool,
    pub zoom_baseline: Option<ZoomBaseline>,
    /// Whether the "reset dates" affordance next to the pickers is shown.
    pub date_reset_visible: bool,
    /// Blocking message for invalid manual input.
    pub alert: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        DashboardState {
            filters: FilterSet::default(),
            granularity: Granularity::Month,
            source: RangeSource::Brush,
            picker_start: NaiveDate::default(),
            picker_end: NaiveDate::default(),
            axis_domain: (0.0, 1.0),
            axis_dirty: false,
            zoom_baseline: None,
            date_reset_visible: false,
            alert: None,
        }
    }
}

impl DashboardState {
    /// State right after a dataset load: full axis domain, the first year
    /// of data selected, granularity from the full span.
    pub fn on_load(dataset: &AnalogDataset) -> DashboardState {
        let (init_start, init_end) = dataset.initial_range();
        let mut state = DashboardState {
            granularity: granularity_for_span(dataset.full_range_days as f64),
            picker_start: init_start,
            picker_end: init_end,
            axis_domain: Self::full_domain(dataset),
            axis_dirty: true,
            ..DashboardState::default()
        };
        state.filters.time = Some((
            NaiveDateTime::new(init_start, noon()),
            NaiveDateTime::new(init_end, noon()),
        ));
        state
    }

    fn full_domain(dataset: &AnalogDataset) -> (f64, f64) {
        (
            day_number(dataset.min_date) + 0.5,
            day_number(dataset.max_date) + 0.5,
        )
    }

    /// Manual date entry from either picker. An end date earlier than the
    /// start alerts the user and falls back to the full data range.
    pub fn set_manual_dates(&mut self, dataset: &AnalogDataset, start: NaiveDate, end: NaiveDate) {
        self.date_reset_visible = true;

        let (start, end) = if end < start {
            self.alert = Some("End date is earlier than start date".to_string());
            (dataset.min_date, dataset.max_date)
        } else {
            (
                start.clamp(dataset.min_date, dataset.max_date),
                end.clamp(dataset.min_date, dataset.max_date),
            )
        };

        self.source = RangeSource::Calendar;
        self.picker_start = start;
        self.picker_end = end;
        self.filters.time = Some((
            NaiveDateTime::new(start, noon()),
            NaiveDateTime::new(end, noon()),
        ));
        self.time_filter_changed();
    }

    /// A committed brush drag on the time chart.
    pub fn set_brush(&mut self, lo: NaiveDateTime, hi: NaiveDateTime) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.date_reset_visible = true;
        self.source = RangeSource::Brush;
        self.filters.time = Some((lo, hi));
        self.time_filter_changed();
    }

    /// Runs after any filter mutation on the time dimension.
    ///
    /// Calendar-sourced ranges are authoritative: consume the flag, choose
    /// the granularity from the span and pin the axis to the range.
    /// Brush-sourced ranges only update the picker display, recovering the
    /// edge days with direction-aware noon rounding.
    fn time_filter_changed(&mut self) {
        let Some((lo, hi)) = self.filters.time else {
            return;
        };

        match self.source {
            RangeSource::Calendar => {
                self.source = RangeSource::Brush;
                let span_days = (hi - lo).num_seconds() as f64 / 86_400.0;
                self.granularity = granularity_for_span(span_days);
                self.axis_domain = (
                    day_number(self.picker_start) + 0.5,
                    day_number(self.picker_end) + 0.5,
                );
                self.axis_dirty = true;
            }
            RangeSource::Brush => {
                self.picker_start = brush_start_day(lo);
                self.picker_end = brush_end_day(hi);
            }
        }
    }

    /// A zoom gesture moved the visible window; the window becomes the
    /// time filter. Guards against a gesture that cannot zoom out further:
    /// when neither the span nor the bounds moved since the previous step,
    /// snap back to the full domain instead of spinning in place.
    pub fn set_zoom(&mut self, dataset: &AnalogDataset, bounds: (f64, f64)) {
        let span_days = bounds.1 - bounds.0;
        let stuck = self
            .zoom_baseline
            .map(|base| base.span_days == span_days && base.bounds == bounds)
            .unwrap_or(false);

        self.source = RangeSource::Brush;
        self.filters.time = Some((x_to_instant(bounds.0), x_to_instant(bounds.1)));
        self.date_reset_visible = true;

        if span_days == 0.0 {
            self.granularity = Granularity::Day;
            self.axis_domain = bounds;
        } else if stuck {
            self.axis_domain = Self::full_domain(dataset);
            self.axis_dirty = true;
            self.granularity = Granularity::Month;
        } else {
            self.granularity = granularity_for_span(span_days);
            self.axis_domain = bounds;
        }

        self.zoom_baseline = Some(ZoomBaseline { span_days, bounds });
        self.time_filter_changed();
    }

    pub fn toggle_season(&mut self, season: Season) {
        self.filters.toggle_season(season);
    }

    pub fn toggle_decade(&mut self, decade: DecadeBucket) {
        self.filters.toggle_decade(decade);
    }

    pub fn toggle_corr_bin(&mut self, bin: i64) {
        self.filters.toggle_corr_bin(bin);
    }

    pub fn toggle_dis_bin(&mut self, bin: i64) {
        self.filters.toggle_dis_bin(bin);
    }

    /// Clear every filter and restore the full view.
    pub fn reset_all(&mut self, dataset: &AnalogDataset) {
        self.filters.clear();
        self.picker_start = dataset.min_date;
        self.picker_end = dataset.max_date;
        self.granularity = granularity_for_span(dataset.full_range_days as f64);
        self.axis_domain = Self::full_domain(dataset);
        self.axis_dirty = true;
        self.zoom_baseline = None;
        self.date_reset_visible = false;
        self.source = RangeSource::Brush;
    }

    /// Per-chart reset. The time chart clears only its own filter and
    /// refocuses the full domain. A categorical or binned chart also
    /// clears the three dependent dimensions (time, correlation,
    /// distance) but never the originating season/decade selection.
    pub fn reset_chart(&mut self, dataset: &AnalogDataset, chart: ChartId) {
        match chart {
            ChartId::Time => {
                self.filters.clear_dimension(DimensionId::Time);
                self.picker_start = dataset.min_date;
                self.picker_end = dataset.max_date;
                self.granularity = granularity_for_span(dataset.full_range_days as f64);
                self.axis_domain = Self::full_domain(dataset);
                self.axis_dirty = true;
                self.date_reset_visible = false;
            }
            _ => {
                self.filters.clear_dimension(DimensionId::Time);
                self.filters.clear_dimension(DimensionId::Correlation);
                self.filters.clear_dimension(DimensionId::Distance);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is opened).
    pub dataset: Option<AnalogDataset>,

    /// Run configuration shown in the side panel.
    pub config: Option<RunConfig>,

    /// Interaction state of the filter coordinator.
    pub dash: DashboardState,

    /// Chart aggregates for the current filter state (cached).
    pub aggregates: Option<Aggregates>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Live brush drag on the time chart, in plot coordinates.
    pub brush_drag: Option<(f64, f64)>,
}

impl AppState {
    /// Ingest a newly loaded dataset and initialise the coordinator.
    pub fn set_dataset(&mut self, dataset: AnalogDataset) {
        self.dash = DashboardState::on_load(&dataset);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.brush_drag = None;
        self.refresh();
    }

    pub fn set_config(&mut self, config: RunConfig) {
        self.config = Some(config);
    }

    /// Rebuild all chart aggregates from the shared filter state. Every
    /// interaction handler ends here.
    pub fn refresh(&mut self) {
        if let Some(ds) = &self.dataset {
            self.aggregates = Some(aggregate(ds, &self.dash.filters, self.dash.granularity));
        }
    }

    pub fn manual_dates(&mut self, start: NaiveDate, end: NaiveDate) {
        if let Some(ds) = &self.dataset {
            self.dash.set_manual_dates(ds, start, end);
        }
        self.refresh();
    }

    pub fn brush(&mut self, lo: NaiveDateTime, hi: NaiveDateTime) {
        self.dash.set_brush(lo, hi);
        self.refresh();
    }

    pub fn zoom(&mut self, bounds: (f64, f64)) {
        if let Some(ds) = &self.dataset {
            self.dash.set_zoom(ds, bounds);
        }
        self.refresh();
    }

    pub fn toggle_season(&mut self, season: Season) {
        self.dash.toggle_season(season);
        self.refresh();
    }

    pub fn toggle_decade(&mut self, decade: DecadeBucket) {
        self.dash.toggle_decade(decade);
        self.refresh();
    }

    pub fn toggle_corr_bin(&mut self, bin: i64) {
        self.dash.toggle_corr_bin(bin);
        self.refresh();
    }

    pub fn toggle_dis_bin(&mut self, bin: i64) {
        self.dash.toggle_dis_bin(bin);
        self.refresh();
    }

    pub fn reset_all(&mut self) {
        if let Some(ds) = &self.dataset {
            self.dash.reset_all(ds);
        }
        self.refresh();
    }

    pub fn reset_chart(&mut self, chart: ChartId) {
        if let Some(ds) = &self.dataset {
            self.dash.reset_chart(ds, chart);
        }
        self.refresh();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
