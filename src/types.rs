use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Ordered mapping from calendar date to a cumulative count.
///
/// Dates are strictly increasing and unique by construction; gaps are
/// allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: BTreeMap<NaiveDate, f64>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, value: f64) {
        self.points.insert(date, value);
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.points.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().map(|(d, v)| (*d, *v))
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.keys().copied().collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.keys().next_back().copied()
    }

    /// The subsequence from `start` (inclusive) through the end.
    pub fn suffix_from(&self, start: NaiveDate) -> TimeSeries {
        TimeSeries {
            points: self.points.range(start..).map(|(d, v)| (*d, *v)).collect(),
        }
    }
}

impl FromIterator<(NaiveDate, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        TimeSeries {
            points: iter.into_iter().collect(),
        }
    }
}

/// Parameters of the logistic growth model `a * e^(-b * e^(-c*x))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Asymptotic maximum
    pub a: f64,
    /// Displacement along the x axis
    pub b: f64,
    /// Growth rate
    pub c: f64,
}

impl FitParams {
    /// Evaluate the model at position `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.a * (-self.b * (-self.c * x).exp()).exp()
    }
}

/// One region's observed series as loaded from the input table.
#[derive(Debug, Clone)]
pub struct RegionSeries {
    pub key: String,
    pub name: Option<String>,
    pub series: TimeSeries,
}

/// One row of the combined forecast table, keyed by (region key, date).
#[derive(Debug, Clone)]
pub struct RegionRecord {
    pub forecast_date: NaiveDate,
    pub date: NaiveDate,
    pub key: String,
    pub name: Option<String>,
    pub estimated: f64,
    /// Observed value; absent for future-only dates
    pub confirmed: Option<f64>,
    /// Chart path relative to the output root; absent when rendering failed
    pub chart: Option<String>,
}
