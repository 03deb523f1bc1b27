use crate::types::TimeSeries;

/// Restrict a series to the outbreak period.
///
/// Returns the contiguous suffix starting at the first date whose value is
/// strictly greater than `threshold`. An empty result means no outbreak was
/// found; callers skip the region, it is not an error.
pub fn select_window(series: &TimeSeries, threshold: f64) -> TimeSeries {
    match series
        .iter()
        .find(|(_, value)| *value > threshold)
        .map(|(date, _)| date)
    {
        Some(start) => series.suffix_from(start),
        None => TimeSeries::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(pairs: &[(&str, f64)]) -> TimeSeries {
        pairs
            .iter()
            .map(|(d, v)| (d.parse::<NaiveDate>().unwrap(), *v))
            .collect()
    }

    #[test]
    fn all_below_threshold_yields_empty_window() {
        let input = series(&[
            ("2020-02-01", 0.0),
            ("2020-02-02", 3.0),
            ("2020-02-03", 9.0),
            ("2020-02-04", 10.0),
        ]);
        assert!(select_window(&input, 10.0).is_empty());
    }

    #[test]
    fn threshold_is_strictly_exceeded() {
        let input = series(&[("2020-02-01", 10.0), ("2020-02-02", 11.0)]);
        let window = select_window(&input, 10.0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.first_date(), Some("2020-02-02".parse().unwrap()));
    }

    #[test]
    fn window_is_a_contiguous_suffix() {
        // The dip back below the threshold stays in the window: selection
        // keys off the first crossing only.
        let input = series(&[
            ("2020-02-01", 2.0),
            ("2020-02-02", 15.0),
            ("2020-02-03", 4.0),
            ("2020-02-04", 30.0),
        ]);
        let window = select_window(&input, 10.0);
        assert_eq!(
            window.dates(),
            vec![
                "2020-02-02".parse::<NaiveDate>().unwrap(),
                "2020-02-03".parse().unwrap(),
                "2020-02-04".parse().unwrap(),
            ]
        );
    }

    #[test]
    fn empty_series_yields_empty_window() {
        assert!(select_window(&TimeSeries::new(), 10.0).is_empty());
    }
}
