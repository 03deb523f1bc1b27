use crate::config::AppConfig;
use crate::pipeline::CombinedTable;
use crate::types::RegionRecord;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write the combined forecast table as CSV and JSON datasets under the
/// output root.
///
/// Rows are sorted by (ForecastDate, region key); `Estimated` carries three
/// decimal places and `Confirmed` is an integer column that stays empty for
/// future-only rows.
pub fn write_outputs(records: &CombinedTable, config: &AppConfig) -> Result<(PathBuf, PathBuf)> {
    let mut rows: Vec<&RegionRecord> = records.values().collect();
    rows.sort_by(|a, b| {
        (a.forecast_date, &a.key, a.date).cmp(&(b.forecast_date, &b.key, b.date))
    });

    let csv_path = config.output.root.join(format!("{}.csv", config.output.name));
    let json_path = config.output.root.join(format!("{}.json", config.output.name));

    write_csv(&rows, &csv_path, config)?;
    write_json(&rows, &json_path, config)?;

    info!(rows = rows.len(), csv = %csv_path.display(), json = %json_path.display(), "combined datasets written");
    Ok((csv_path, json_path))
}

fn write_csv(rows: &[&RegionRecord], path: &Path, config: &AppConfig) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["ForecastDate".to_string(), "Date".to_string()];
    header.push(config.input.region_column.clone());
    if let Some(name_column) = &config.input.name_column {
        header.push(name_column.clone());
    }
    header.extend([
        "Estimated".to_string(),
        "Confirmed".to_string(),
        "ForecastChart".to_string(),
    ]);
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.forecast_date.to_string(),
            row.date.to_string(),
            row.key.clone(),
        ];
        if config.input.name_column.is_some() {
            record.push(row.name.clone().unwrap_or_default());
        }
        record.push(format!("{:.3}", row.estimated));
        record.push(
            row.confirmed
                .map(|v| format!("{}", v as i64))
                .unwrap_or_default(),
        );
        record.push(row.chart.clone().unwrap_or_default());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_json(rows: &[&RegionRecord], path: &Path, config: &AppConfig) -> Result<()> {
    let records: Vec<Value> = rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            object.insert("ForecastDate".to_string(), json!(row.forecast_date.to_string()));
            object.insert("Date".to_string(), json!(row.date.to_string()));
            object.insert(config.input.region_column.clone(), json!(row.key));
            if let Some(name_column) = &config.input.name_column {
                object.insert(name_column.clone(), json!(row.name));
            }
            object.insert(
                "Estimated".to_string(),
                json!((row.estimated * 1000.0).round() / 1000.0),
            );
            object.insert(
                "Confirmed".to_string(),
                row.confirmed.map(|v| json!(v as i64)).unwrap_or(Value::Null),
            );
            object.insert(
                "ForecastChart".to_string(),
                row.chart.clone().map(|c| json!(c)).unwrap_or(Value::Null),
            );
            Value::Object(object)
        })
        .collect();

    let file =
        File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer(file, &records)
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn record(key: &str, day: &str, confirmed: Option<f64>) -> RegionRecord {
        RegionRecord {
            forecast_date: date("2020-03-15"),
            date: date(day),
            key: key.to_string(),
            name: Some("Italy".to_string()),
            estimated: 123.4567,
            confirmed,
            chart: Some(format!("charts/2020-03-15_{}.svg", key)),
        }
    }

    fn test_config(root: &Path) -> AppConfig {
        toml::from_str(&format!(
            r#"
            [input]
            data_csv = "unused.csv"
            name_column = "CountryName"

            [output]
            root = "{}"
            name = "world"
            "#,
            root.display()
        ))
        .unwrap()
    }

    #[test]
    fn writes_csv_and_json_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut records = CombinedTable::new();
        for (day, confirmed) in [
            ("2020-03-14", Some(300.0)),
            ("2020-03-15", Some(400.0)),
            ("2020-03-16", None),
        ] {
            let row = record("IT", day, confirmed);
            records.insert((row.key.clone(), row.date), row);
        }

        let (csv_path, json_path) = write_outputs(&records, &config).unwrap();

        let csv_content = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv_content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ForecastDate,Date,CountryCode,CountryName,Estimated,Confirmed,ForecastChart"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2020-03-15,2020-03-14,IT,Italy,123.457,300,charts/2020-03-15_IT.svg"
        );
        // Future-only row has an empty Confirmed column
        assert!(csv_content
            .lines()
            .any(|l| l.contains("2020-03-16,IT,Italy,123.457,,")));

        let json_content = std::fs::read_to_string(&json_path).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_content).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0]["Confirmed"], json!(300));
        assert_eq!(parsed[2]["Confirmed"], Value::Null);
        assert_eq!(parsed[0]["Estimated"], json!(123.457));
    }

    #[test]
    fn rows_sort_by_forecast_date_then_region() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut records = CombinedTable::new();
        let mut early = record("ZZ", "2020-03-10", Some(50.0));
        early.forecast_date = date("2020-03-10");
        records.insert((early.key.clone(), early.date), early);
        let late = record("AA", "2020-03-15", Some(60.0));
        records.insert((late.key.clone(), late.date), late);

        let (csv_path, _) = write_outputs(&records, &config).unwrap();
        let csv_content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv_content.lines().collect();
        // Earlier forecast date first even though its key sorts later
        assert!(lines[1].starts_with("2020-03-10,2020-03-10,ZZ"));
        assert!(lines[2].starts_with("2020-03-15,2020-03-15,AA"));
    }
}
