use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Bin width for the correlation score.
pub const CORR_BIN_WIDTH: f64 = 0.1;
/// Bin width for the distance score.
pub const DIS_BIN_WIDTH: f64 = 100.0;

/// Snap a raw score to its bin index: `round(raw / width)`.
///
/// The same index is used as the grouping key and, multiplied back by the
/// width, as the bar position on the score axes. Keeping the key integral
/// avoids float keys in the groupings.
pub fn bin_index(raw: f64, width: f64) -> i64 {
    (raw / width).round() as i64
}

/// The representative value of a bin: `width * index`.
pub fn bin_value(index: i64, width: f64) -> f64 {
    index as f64 * width
}

// ---------------------------------------------------------------------------
// Time axis
// ---------------------------------------------------------------------------

/// All records are stamped at a fixed noon time-of-day so comparisons and
/// brush-edge recovery work at day granularity.
pub fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Plot x-coordinate of a calendar date: whole days since the Unix epoch.
/// A record stamped at noon lands at `day_number(d) + 0.5`.
pub fn day_number(date: NaiveDate) -> f64 {
    (date - unix_epoch()).num_days() as f64
}

/// Plot x-coordinate of an instant, with the time-of-day as the fraction.
pub fn instant_to_x(ts: NaiveDateTime) -> f64 {
    day_number(ts.date()) + ts.num_seconds_from_midnight() as f64 / 86_400.0
}

/// Inverse of [`instant_to_x`]; seconds are rounded to the nearest whole.
pub fn x_to_instant(x: f64) -> NaiveDateTime {
    let days = x.floor() as i64;
    let secs = ((x - x.floor()) * 86_400.0).round().min(86_399.0) as u32;
    let date = unix_epoch() + chrono::Duration::days(days);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or_default();
    NaiveDateTime::new(date, time)
}

/// First day of the month containing `date` (the month-grouping key).
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

// ---------------------------------------------------------------------------
// Season – categorical code derived from the reference month
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    /// December, January, February.
    Djf,
    /// March, April, May.
    Mam,
    /// June, July, August.
    Jja,
    /// September, October, November.
    Son,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Djf, Season::Mam, Season::Jja, Season::Son];

    /// Season of a calendar month (1–12).
    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Djf,
            3..=5 => Season::Mam,
            6..=8 => Season::Jja,
            _ => Season::Son,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DecadeBucket – low-cardinality grouping of the analogue date
// ---------------------------------------------------------------------------

/// Fixed 10-year spans covering the reanalysis archive, plus a literal
/// single-year bucket for the partial decade. Years outside the table get
/// no bucket at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecadeBucket {
    Y1948To1955,
    Y1956To1965,
    Y1966To1975,
    Y1976To1985,
    Y1986To1995,
    Y1996To2005,
    Y2006To2015,
    Y2016,
}

impl DecadeBucket {
    pub const ALL: [DecadeBucket; 8] = [
        DecadeBucket::Y1948To1955,
        DecadeBucket::Y1956To1965,
        DecadeBucket::Y1966To1975,
        DecadeBucket::Y1976To1985,
        DecadeBucket::Y1986To1995,
        DecadeBucket::Y1996To2005,
        DecadeBucket::Y2006To2015,
        DecadeBucket::Y2016,
    ];

    pub fn from_year(year: i32) -> Option<DecadeBucket> {
        match year {
            1948..=1955 => Some(DecadeBucket::Y1948To1955),
            1956..=1965 => Some(DecadeBucket::Y1956To1965),
            1966..=1975 => Some(DecadeBucket::Y1966To1975),
            1976..=1985 => Some(DecadeBucket::Y1976To1985),
            1986..=1995 => Some(DecadeBucket::Y1986To1995),
            1996..=2005 => Some(DecadeBucket::Y1996To2005),
            2006..=2015 => Some(DecadeBucket::Y2006To2015),
            2016 => Some(DecadeBucket::Y2016),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DecadeBucket::Y1948To1955 => "1948-1955",
            DecadeBucket::Y1956To1965 => "1956-1965",
            DecadeBucket::Y1966To1975 => "1966-1975",
            DecadeBucket::Y1976To1985 => "1976-1985",
            DecadeBucket::Y1986To1995 => "1986-1995",
            DecadeBucket::Y1996To2005 => "1996-2005",
            DecadeBucket::Y2006To2015 => "2006-2015",
            DecadeBucket::Y2016 => "2016",
        }
    }
}

impl std::fmt::Display for DecadeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AnalogRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A parsed data row before derivation: reference date, analogue year and
/// the two raw similarity scores.
#[derive(Debug, Clone, Copy)]
pub struct AnalogInput {
    pub date_ref: NaiveDate,
    pub analog_year: i32,
    pub distance: f64,
    pub correlation: f64,
}

/// One analogue pairing with all derived fields computed. Immutable after
/// construction.
#[derive(Debug, Clone, Copy)]
pub struct AnalogRecord {
    /// Reference date, day resolution (stamped at noon on the time axis).
    pub date_ref: NaiveDate,
    /// Decade bucket of the analogue date; `None` for out-of-table years.
    pub decade: Option<DecadeBucket>,
    /// Correlation bin index (width [`CORR_BIN_WIDTH`]).
    pub corr_bin: i64,
    /// Distance bin index (width [`DIS_BIN_WIDTH`]).
    pub dis_bin: i64,
    pub season: Season,
}

impl AnalogRecord {
    pub fn derive(input: AnalogInput) -> AnalogRecord {
        AnalogRecord {
            date_ref: input.date_ref,
            decade: DecadeBucket::from_year(input.analog_year),
            corr_bin: bin_index(input.correlation, CORR_BIN_WIDTH),
            dis_bin: bin_index(input.distance, DIS_BIN_WIDTH),
            season: Season::from_month(input.date_ref.month()),
        }
    }

    /// The noon-stamped instant used on the time axis.
    pub fn instant(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date_ref, noon())
    }

    pub fn correlation(&self) -> f64 {
        bin_value(self.corr_bin, CORR_BIN_WIDTH)
    }

    pub fn distance(&self) -> f64 {
        bin_value(self.dis_bin, DIS_BIN_WIDTH)
    }
}

// ---------------------------------------------------------------------------
// AnalogDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full record store with the normalization constants computed once
/// from the unfiltered set. Axis domains are always taken from here, never
/// from a filtered subset.
#[derive(Debug, Clone)]
pub struct AnalogDataset {
    pub records: Vec<AnalogRecord>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Span of the reference dates in days.
    pub full_range_days: i64,
    /// Correlation axis domain, floor/ceil of the raw scores.
    pub corr_range: (f64, f64),
    /// Distance axis domain, floor/ceil of the raw scores to 100-boundaries.
    pub dis_range: (f64, f64),
}

impl AnalogDataset {
    /// Derive all records and the normalization constants. Returns `None`
    /// for an empty input (the loader reports that as a proper error).
    pub fn from_inputs(inputs: &[AnalogInput]) -> Option<AnalogDataset> {
        let first = inputs.first()?;

        let mut min_date = first.date_ref;
        let mut max_date = first.date_ref;
        let mut corr_min = first.correlation;
        let mut corr_max = first.correlation;
        let mut dis_min = first.distance;
        let mut dis_max = first.distance;

        for input in inputs {
            min_date = min_date.min(input.date_ref);
            max_date = max_date.max(input.date_ref);
            corr_min = corr_min.min(input.correlation);
            corr_max = corr_max.max(input.correlation);
            dis_min = dis_min.min(input.distance);
            dis_max = dis_max.max(input.distance);
        }

        let records = inputs.iter().copied().map(AnalogRecord::derive).collect();

        Some(AnalogDataset {
            records,
            min_date,
            max_date,
            full_range_days: (max_date - min_date).num_days(),
            corr_range: (corr_min.floor(), corr_max.ceil()),
            dis_range: (
                (dis_min / DIS_BIN_WIDTH).floor() * DIS_BIN_WIDTH,
                (dis_max / DIS_BIN_WIDTH).ceil() * DIS_BIN_WIDTH,
            ),
        })
    }

    /// Initial visible window: one year from the first date, capped at the
    /// last date of the dataset.
    pub fn initial_range(&self) -> (NaiveDate, NaiveDate) {
        let one_year = self
            .min_date
            .checked_add_days(Days::new(364))
            .unwrap_or(self.max_date);
        (self.min_date, one_year.min(self.max_date))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(date_ref: NaiveDate, analog_year: i32, dis: f64, corr: f64) -> AnalogInput {
        AnalogInput {
            date_ref,
            analog_year,
            distance: dis,
            correlation: corr,
        }
    }

    #[test]
    fn binning_matches_the_grouping_key() {
        for &raw in &[0.0, 0.04, 0.05, 0.14, 0.96, -0.26, 1.0] {
            let idx = bin_index(raw, CORR_BIN_WIDTH);
            let snapped = CORR_BIN_WIDTH * (raw / CORR_BIN_WIDTH).round();
            assert!(
                (bin_value(idx, CORR_BIN_WIDTH) - snapped).abs() < 1e-9,
                "raw {raw}"
            );
        }
        for &raw in &[0.0, 49.0, 50.0, 149.9, 3120.0] {
            let idx = bin_index(raw, DIS_BIN_WIDTH);
            let snapped = DIS_BIN_WIDTH * (raw / DIS_BIN_WIDTH).round();
            assert!(
                (bin_value(idx, DIS_BIN_WIDTH) - snapped).abs() < 1e-9,
                "raw {raw}"
            );
        }
    }

    #[test]
    fn every_month_has_a_season() {
        let expected = [
            Season::Djf,
            Season::Djf,
            Season::Mam,
            Season::Mam,
            Season::Mam,
            Season::Jja,
            Season::Jja,
            Season::Jja,
            Season::Son,
            Season::Son,
            Season::Son,
            Season::Djf,
        ];
        for month in 1..=12u32 {
            assert_eq!(Season::from_month(month), expected[(month - 1) as usize]);
        }
    }

    #[test]
    fn decade_bucket_table() {
        assert_eq!(DecadeBucket::from_year(1990), Some(DecadeBucket::Y1986To1995));
        assert_eq!(DecadeBucket::from_year(2016), Some(DecadeBucket::Y2016));
        assert_eq!(DecadeBucket::from_year(1947), None);
        assert_eq!(DecadeBucket::from_year(2017), None);
        assert_eq!(DecadeBucket::from_year(1948), Some(DecadeBucket::Y1948To1955));
        assert_eq!(DecadeBucket::from_year(1955), Some(DecadeBucket::Y1948To1955));
        assert_eq!(DecadeBucket::from_year(1956), Some(DecadeBucket::Y1956To1965));
        assert_eq!(DecadeBucket::from_year(2015), Some(DecadeBucket::Y2006To2015));
    }

    #[test]
    fn derive_computes_all_fields() {
        let rec = AnalogRecord::derive(input(date(2003, 1, 15), 1990, 149.0, 0.34));
        assert_eq!(rec.season, Season::Djf);
        assert_eq!(rec.decade, Some(DecadeBucket::Y1986To1995));
        assert_eq!(rec.corr_bin, 3);
        assert_eq!(rec.dis_bin, 1);
        assert!((rec.correlation() - 0.3).abs() < 1e-9);
        assert!((rec.distance() - 100.0).abs() < 1e-9);
        assert_eq!(rec.instant().time(), noon());
    }

    #[test]
    fn ranges_come_from_raw_scores() {
        let inputs = vec![
            input(date(2000, 1, 1), 1950, 180.0, 0.96),
            input(date(2000, 1, 2), 1960, 420.0, -0.42),
        ];
        let ds = AnalogDataset::from_inputs(&inputs).unwrap();
        // Floor/ceil of the raw scores, not of the binned values.
        assert_eq!(ds.corr_range, (-1.0, 1.0));
        assert_eq!(ds.dis_range, (100.0, 500.0));
        assert_eq!(ds.full_range_days, 1);
    }

    #[test]
    fn initial_range_is_capped_by_the_last_date() {
        let short: Vec<AnalogInput> = (0..10)
            .map(|i| input(date(2000, 1, 1) + chrono::Duration::days(i * 3), 1990, 10.0, 0.5))
            .collect();
        let ds = AnalogDataset::from_inputs(&short).unwrap();
        assert_eq!(ds.full_range_days, 27);
        assert_eq!(ds.initial_range(), (date(2000, 1, 1), date(2000, 1, 28)));

        let long: Vec<AnalogInput> = (0..800)
            .map(|i| input(date(2000, 1, 1) + chrono::Duration::days(i), 1990, 10.0, 0.5))
            .collect();
        let ds = AnalogDataset::from_inputs(&long).unwrap();
        assert_eq!(ds.initial_range(), (date(2000, 1, 1), date(2000, 12, 30)));
    }

    #[test]
    fn empty_input_yields_no_dataset() {
        assert!(AnalogDataset::from_inputs(&[]).is_none());
    }

    #[test]
    fn day_number_round_trip() {
        let d = date(2003, 6, 1);
        let ts = NaiveDateTime::new(d, noon());
        let x = instant_to_x(ts);
        assert!((x - (day_number(d) + 0.5)).abs() < 1e-9);
        assert_eq!(x_to_instant(x), ts);
    }

    #[test]
    fn month_start_keys() {
        assert_eq!(month_start(date(2003, 6, 17)), date(2003, 6, 1));
        assert_eq!(month_start(date(2003, 6, 1)), date(2003, 6, 1));
    }
}
