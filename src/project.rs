use crate::types::{FitParams, TimeSeries};
use chrono::NaiveDate;

/// Evaluate the fitted model over a combined date index.
///
/// Positions are `0..dates.len()`, so the result carries model estimates for
/// every historically observed date as well as the extended future dates,
/// letting downstream consumers compare model vs. actual on known data.
pub fn project(params: &FitParams, dates: &[NaiveDate]) -> TimeSeries {
    dates
        .iter()
        .enumerate()
        .map(|(x, date)| (*date, params.eval(x as f64)))
        .collect()
}
