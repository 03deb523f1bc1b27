use chrono::NaiveDate;

/// Append `window` consecutive calendar days after the last date.
///
/// The original prefix is returned unchanged. An empty input has no anchor
/// to extend from and comes back empty.
pub fn extend(dates: &[NaiveDate], window: usize) -> Vec<NaiveDate> {
    let mut extended = dates.to_vec();
    if let Some(&last) = dates.last() {
        let mut current = last;
        for _ in 0..window {
            current = current.succ_opt().expect("date out of range");
            extended.push(current);
        }
    }
    extended
}
