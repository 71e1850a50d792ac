use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};

use super::model::{
    bin_index, month_start, AnalogDataset, AnalogRecord, DecadeBucket, Season, CORR_BIN_WIDTH,
    DIS_BIN_WIDTH,
};

// ---------------------------------------------------------------------------
// Dimensions and time granularity
// ---------------------------------------------------------------------------

/// The five filterable dimensions of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionId {
    Time,
    Season,
    Decade,
    Correlation,
    Distance,
}

/// Which time grouping currently backs the time chart. Exactly one is
/// active at a time; the coordinator switches it from the filtered span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    /// Grouping key of a reference date under this granularity.
    pub fn key_for(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Month => month_start(date),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSet – the shared filter state of all five dimensions
// ---------------------------------------------------------------------------

/// Active filters per dimension. An empty selection set (or `None` for the
/// time range) means "no constraint" on that dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    /// Closed time range; both edges inclusive.
    pub time: Option<(NaiveDateTime, NaiveDateTime)>,
    pub seasons: BTreeSet<Season>,
    pub decades: BTreeSet<DecadeBucket>,
    pub corr_bins: BTreeSet<i64>,
    pub dis_bins: BTreeSet<i64>,
}

impl FilterSet {
    pub fn any_active(&self) -> bool {
        self.time.is_some()
            || !self.seasons.is_empty()
            || !self.decades.is_empty()
            || !self.corr_bins.is_empty()
            || !self.dis_bins.is_empty()
    }

    pub fn clear(&mut self) {
        *self = FilterSet::default();
    }

    pub fn clear_dimension(&mut self, dim: DimensionId) {
        match dim {
            DimensionId::Time => self.time = None,
            DimensionId::Season => self.seasons.clear(),
            DimensionId::Decade => self.decades.clear(),
            DimensionId::Correlation => self.corr_bins.clear(),
            DimensionId::Distance => self.dis_bins.clear(),
        }
    }

    pub fn toggle_season(&mut self, season: Season) {
        if !self.seasons.remove(&season) {
            self.seasons.insert(season);
        }
    }

    pub fn toggle_decade(&mut self, decade: DecadeBucket) {
        if !self.decades.remove(&decade) {
            self.decades.insert(decade);
        }
    }

    pub fn toggle_corr_bin(&mut self, bin: i64) {
        if !self.corr_bins.remove(&bin) {
            self.corr_bins.insert(bin);
        }
    }

    pub fn toggle_dis_bin(&mut self, bin: i64) {
        if !self.dis_bins.remove(&bin) {
            self.dis_bins.insert(bin);
        }
    }

    /// Whether a record passes every active filter, optionally excluding
    /// one dimension. Excluding a chart's own dimension gives the linked
    /// display semantics: each chart shows what passes every filter
    /// except its own.
    pub fn passes(&self, record: &AnalogRecord, skip: Option<DimensionId>) -> bool {
        if skip != Some(DimensionId::Time) {
            if let Some((lo, hi)) = self.time {
                let ts = record.instant();
                if ts < lo || ts > hi {
                    return false;
                }
            }
        }
        if skip != Some(DimensionId::Season)
            && !self.seasons.is_empty()
            && !self.seasons.contains(&record.season)
        {
            return false;
        }
        if skip != Some(DimensionId::Decade) && !self.decades.is_empty() {
            // Records whose analogue year fell outside the bucket table can
            // never match a decade selection.
            match record.decade {
                Some(decade) if self.decades.contains(&decade) => {}
                _ => return false,
            }
        }
        if skip != Some(DimensionId::Correlation)
            && !self.corr_bins.is_empty()
            && !self.corr_bins.contains(&record.corr_bin)
        {
            return false;
        }
        if skip != Some(DimensionId::Distance)
            && !self.dis_bins.is_empty()
            && !self.dis_bins.contains(&record.dis_bin)
        {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Aggregates – per-chart (key → count) groupings
// ---------------------------------------------------------------------------

/// All chart aggregates for one filter state. Rebuilt in full after every
/// filter mutation; no incremental maintenance.
#[derive(Debug, Clone)]
pub struct Aggregates {
    /// Time chart: key is the day or the month start, per the granularity.
    pub time: BTreeMap<NaiveDate, usize>,
    /// Season pie: all four slices, in season order.
    pub seasons: Vec<(Season, usize)>,
    /// Decade rows: all eight buckets, in chronological order.
    pub decades: Vec<(DecadeBucket, usize)>,
    /// Correlation bars: every bin across the full static axis domain.
    pub corr: Vec<(i64, usize)>,
    /// Distance bars: every bin across the full static axis domain.
    pub dis: Vec<(i64, usize)>,
    /// Records passing all filters (the summary count).
    pub selected: usize,
    pub total: usize,
}

/// Rebuild every grouping for the given filter state.
pub fn aggregate(
    dataset: &AnalogDataset,
    filters: &FilterSet,
    granularity: Granularity,
) -> Aggregates {
    let mut time: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut seasons: BTreeMap<Season, usize> = Season::ALL.iter().map(|&s| (s, 0)).collect();
    let mut decades: BTreeMap<DecadeBucket, usize> =
        DecadeBucket::ALL.iter().map(|&d| (d, 0)).collect();

    // Bins span the full unfiltered score ranges so the axes stay put.
    let corr_bins = bin_span(dataset.corr_range, CORR_BIN_WIDTH);
    let dis_bins = bin_span(dataset.dis_range, DIS_BIN_WIDTH);
    let mut corr: BTreeMap<i64, usize> = corr_bins.map(|b| (b, 0)).collect();
    let mut dis: BTreeMap<i64, usize> = dis_bins.map(|b| (b, 0)).collect();

    let mut selected = 0usize;

    for record in &dataset.records {
        if filters.passes(record, Some(DimensionId::Time)) {
            *time
                .entry(granularity.key_for(record.date_ref))
                .or_insert(0) += 1;
        }
        if filters.passes(record, Some(DimensionId::Season)) {
            if let Some(count) = seasons.get_mut(&record.season) {
                *count += 1;
            }
        }
        if filters.passes(record, Some(DimensionId::Decade)) {
            if let Some(count) = record.decade.and_then(|d| decades.get_mut(&d)) {
                *count += 1;
            }
        }
        if filters.passes(record, Some(DimensionId::Correlation)) {
            *corr.entry(record.corr_bin).or_insert(0) += 1;
        }
        if filters.passes(record, Some(DimensionId::Distance)) {
            *dis.entry(record.dis_bin).or_insert(0) += 1;
        }
        if filters.passes(record, None) {
            selected += 1;
        }
    }

    Aggregates {
        time,
        seasons: seasons.into_iter().collect(),
        decades: decades.into_iter().collect(),
        corr: corr.into_iter().collect(),
        dis: dis.into_iter().collect(),
        selected,
        total: dataset.len(),
    }
}

fn bin_span(range: (f64, f64), width: f64) -> impl Iterator<Item = i64> {
    bin_index(range.0, width)..=bin_index(range.1, width)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{noon, AnalogInput};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two winter records in 1990, two summer records in 2016, with
    /// distinct score bins per season.
    fn dataset() -> AnalogDataset {
        let inputs = vec![
            AnalogInput {
                date_ref: date(2003, 1, 10),
                analog_year: 1990,
                distance: 100.0,
                correlation: 0.2,
            },
            AnalogInput {
                date_ref: date(2003, 1, 11),
                analog_year: 1991,
                distance: 100.0,
                correlation: 0.2,
            },
            AnalogInput {
                date_ref: date(2003, 7, 10),
                analog_year: 2016,
                distance: 300.0,
                correlation: 0.8,
            },
            AnalogInput {
                date_ref: date(2003, 7, 11),
                analog_year: 2016,
                distance: 300.0,
                correlation: 0.8,
            },
        ];
        AnalogDataset::from_inputs(&inputs).unwrap()
    }

    fn count_for<K: PartialEq + Copy>(rows: &[(K, usize)], key: K) -> usize {
        rows.iter().find(|(k, _)| *k == key).map(|(_, n)| *n).unwrap_or(0)
    }

    #[test]
    fn no_filters_shows_everything() {
        let ds = dataset();
        let agg = aggregate(&ds, &FilterSet::default(), Granularity::Day);
        assert_eq!(agg.selected, 4);
        assert_eq!(agg.total, 4);
        assert_eq!(count_for(&agg.seasons, Season::Djf), 2);
        assert_eq!(count_for(&agg.seasons, Season::Jja), 2);
        assert_eq!(count_for(&agg.decades, DecadeBucket::Y2016), 2);
        assert_eq!(agg.time.len(), 4);
    }

    #[test]
    fn a_dimension_filter_narrows_every_other_grouping_but_not_its_own() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.toggle_season(Season::Djf);

        let agg = aggregate(&ds, &filters, Granularity::Day);

        // Other charts only count the winter records.
        assert_eq!(count_for(&agg.decades, DecadeBucket::Y1986To1995), 2);
        assert_eq!(count_for(&agg.decades, DecadeBucket::Y2016), 0);
        assert_eq!(count_for(&agg.corr, 2), 2);
        assert_eq!(count_for(&agg.corr, 8), 0);
        assert_eq!(agg.time.len(), 2);

        // The season chart still shows its own unfiltered totals.
        assert_eq!(count_for(&agg.seasons, Season::Djf), 2);
        assert_eq!(count_for(&agg.seasons, Season::Jja), 2);

        // The summary count applies every filter.
        assert_eq!(agg.selected, 2);
    }

    #[test]
    fn filters_compose_across_dimensions() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.toggle_season(Season::Djf);
        filters.toggle_corr_bin(8);

        let agg = aggregate(&ds, &filters, Granularity::Day);

        // Season chart sees the corr filter, corr chart sees the season
        // filter, and nothing passes both.
        assert_eq!(count_for(&agg.seasons, Season::Djf), 0);
        assert_eq!(count_for(&agg.seasons, Season::Jja), 2);
        assert_eq!(count_for(&agg.corr, 2), 2);
        assert_eq!(agg.selected, 0);
    }

    #[test]
    fn toggling_a_key_off_empties_back_to_no_filter() {
        let mut filters = FilterSet::default();
        filters.toggle_decade(DecadeBucket::Y2016);
        assert!(filters.any_active());
        filters.toggle_decade(DecadeBucket::Y2016);
        assert!(!filters.any_active());
    }

    #[test]
    fn time_range_edges_are_inclusive() {
        let ds = dataset();
        let mut filters = FilterSet::default();
        filters.time = Some((
            NaiveDateTime::new(date(2003, 1, 10), noon()),
            NaiveDateTime::new(date(2003, 1, 11), noon()),
        ));
        let agg = aggregate(&ds, &filters, Granularity::Day);
        assert_eq!(agg.selected, 2);
    }

    #[test]
    fn month_granularity_buckets_by_month_start() {
        let ds = dataset();
        let agg = aggregate(&ds, &FilterSet::default(), Granularity::Month);
        assert_eq!(agg.time.len(), 2);
        assert_eq!(agg.time.get(&date(2003, 1, 1)), Some(&2));
        assert_eq!(agg.time.get(&date(2003, 7, 1)), Some(&2));
    }

    #[test]
    fn score_bins_cover_the_full_static_domain() {
        let ds = dataset();
        let agg = aggregate(&ds, &FilterSet::default(), Granularity::Day);
        // corr_range is (0, 1): bins 0.0, 0.1, … 1.0.
        assert_eq!(agg.corr.len(), 11);
        // dis_range is (100, 300): bins 100, 200, 300.
        assert_eq!(agg.dis.len(), 3);
        assert_eq!(count_for(&agg.dis, 1), 2);
        assert_eq!(count_for(&agg.dis, 3), 2);
    }

    #[test]
    fn out_of_table_years_never_match_a_decade_selection() {
        let inputs = vec![
            AnalogInput {
                date_ref: date(2003, 1, 10),
                analog_year: 1947,
                distance: 50.0,
                correlation: 0.1,
            },
            AnalogInput {
                date_ref: date(2003, 1, 11),
                analog_year: 1990,
                distance: 50.0,
                correlation: 0.1,
            },
        ];
        let ds = AnalogDataset::from_inputs(&inputs).unwrap();
        let mut filters = FilterSet::default();
        filters.toggle_decade(DecadeBucket::Y1986To1995);
        let agg = aggregate(&ds, &filters, Granularity::Day);
        assert_eq!(agg.selected, 1);
    }
}
