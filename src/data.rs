use crate::config::AppConfig;
use crate::types::{RegionSeries, TimeSeries};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use tracing::warn;

/// Load the input table and group it into one series per region.
///
/// Column names come from the configuration, so the same loader handles
/// country-level and sub-national tables. Rows with an unparseable date or
/// value are skipped with a warning; an unreadable file is fatal.
pub fn load_regions(config: &AppConfig) -> Result<Vec<RegionSeries>> {
    let input = &config.input;
    let file = File::open(&input.data_csv)
        .with_context(|| format!("Failed to open CSV file: {:?}", input.data_csv))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let date_idx = column_index(&headers, &input.date_column)?;
    let region_idx = column_index(&headers, &input.region_column)?;
    let value_idx = column_index(&headers, &input.value_column)?;
    let name_idx = match &input.name_column {
        Some(column) => Some(column_index(&headers, column)?),
        None => None,
    };

    let mut regions: BTreeMap<String, RegionSeries> = BTreeMap::new();

    for result in rdr.records() {
        let record = result?;
        let key = record.get(region_idx).unwrap_or("").to_string();
        if key.is_empty() {
            continue;
        }

        let date_field = record.get(date_idx).unwrap_or("");
        let date: NaiveDate = match date_field.parse() {
            Ok(date) => date,
            Err(_) => {
                warn!(region = %key, date = %date_field, "skipping row with unparseable date");
                continue;
            }
        };

        let value_field = record.get(value_idx).unwrap_or("");
        let value: f64 = match value_field.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(region = %key, value = %value_field, "skipping row with unparseable value");
                continue;
            }
        };

        let entry = regions.entry(key.clone()).or_insert_with(|| RegionSeries {
            key,
            name: None,
            series: TimeSeries::new(),
        });
        if entry.name.is_none() {
            if let Some(idx) = name_idx {
                let name = record.get(idx).unwrap_or("");
                if !name.is_empty() {
                    entry.name = Some(name.to_string());
                }
            }
        }
        // Duplicate (region, date) rows: last one wins
        entry.series.insert(date, value);
    }

    Ok(regions.into_values().collect())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("Column '{}' not found in CSV", name))
}
