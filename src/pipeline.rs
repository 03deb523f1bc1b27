use crate::chart;
use crate::config::{AppConfig, OutputConfig};
use crate::dates;
use crate::error::{ForecastError, Result};
use crate::fit::{self, FitOptions};
use crate::outbreak;
use crate::project;
use crate::types::{RegionRecord, RegionSeries};
use anyhow::Context;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const CHARTS_SUBDIR: &str = "charts";

/// Combined forecast table keyed by (region key, date).
pub type CombinedTable = BTreeMap<(String, NaiveDate), RegionRecord>;

/// One region's completed forecast.
#[derive(Debug, Clone)]
pub struct RegionForecast {
    pub records: Vec<RegionRecord>,
    /// Relative chart path; absent when rendering failed
    pub chart: Option<String>,
}

/// Region-by-region tally reported at the end of a run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub processed: usize,
    pub no_outbreak: usize,
    pub insufficient_data: usize,
    pub fit_failures: usize,
    pub chart_failures: usize,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.no_outbreak + self.insufficient_data + self.fit_failures
    }
}

pub struct BatchResult {
    pub records: CombinedTable,
    pub summary: RunSummary,
}

/// Forecast every region and merge the results into one combined table.
///
/// Regions are independent units of work; with `parallel` enabled they fan
/// out over rayon and the merge happens sequentially afterwards, so the
/// combined table is never written to concurrently. One region's failure
/// never aborts the batch.
pub fn run_batch(regions: &[RegionSeries], config: &AppConfig) -> anyhow::Result<BatchResult> {
    let charts_dir = config.output.root.join(CHARTS_SUBDIR);
    std::fs::create_dir_all(&charts_dir)
        .with_context(|| format!("Failed to create charts directory: {:?}", charts_dir))?;

    info!(regions = regions.len(), "starting forecast batch");

    let outcomes: Vec<(String, Result<RegionForecast>)> = if config.forecast.parallel {
        regions
            .par_iter()
            .map(|region| (region.key.clone(), run_region(region, config, &charts_dir)))
            .collect()
    } else {
        regions
            .iter()
            .map(|region| (region.key.clone(), run_region(region, config, &charts_dir)))
            .collect()
    };

    let mut records = CombinedTable::new();
    let mut summary = RunSummary::default();

    for (key, outcome) in outcomes {
        match outcome {
            Ok(forecast) => {
                summary.processed += 1;
                if forecast.chart.is_none() {
                    summary.chart_failures += 1;
                }
                for record in forecast.records {
                    records.insert((record.key.clone(), record.date), record);
                }
            }
            Err(err) => {
                match &err {
                    ForecastError::NoOutbreak => summary.no_outbreak += 1,
                    ForecastError::InsufficientData { .. } => summary.insufficient_data += 1,
                    ForecastError::FitDiverged { .. } => summary.fit_failures += 1,
                    ForecastError::Render(_) => summary.chart_failures += 1,
                }
                warn!(region = %key, error = %err, "skipping region");
            }
        }
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped(),
        "forecast batch complete"
    );

    Ok(BatchResult { records, summary })
}

/// Forecast a single region: window, fit, project, render, record.
pub fn run_region(
    region: &RegionSeries,
    config: &AppConfig,
    charts_dir: &Path,
) -> Result<RegionForecast> {
    let settings = &config.forecast;

    let windowed = outbreak::select_window(&region.series, settings.threshold);
    let Some(forecast_date) = windowed.last_date() else {
        return Err(ForecastError::NoOutbreak);
    };
    if windowed.len() < settings.min_points {
        return Err(ForecastError::InsufficientData {
            required: settings.min_points,
            actual: windowed.len(),
        });
    }

    let params = fit::fit_logistic(
        &windowed.values(),
        &FitOptions {
            max_evaluations: settings.max_evaluations,
        },
    )?;

    let combined = dates::extend(&windowed.dates(), settings.window);
    let projected = project::project(&params, &combined);

    let chart_name = chart_file_name(forecast_date, region, &config.output);
    let chart_path = charts_dir.join(&chart_name);
    let chart_ref =
        match chart::render_forecast(&chart_path, &windowed, &projected, config.output.chart_format)
        {
            Ok(()) => Some(format!("{}/{}", CHARTS_SUBDIR, chart_name)),
            Err(err) => {
                warn!(region = %region.key, error = %err, "chart rendering failed, records keep no chart reference");
                None
            }
        };

    let records = projected
        .iter()
        .map(|(date, estimated)| RegionRecord {
            forecast_date,
            date,
            key: region.key.clone(),
            name: region.name.clone(),
            estimated,
            confirmed: windowed.get(date),
            chart: chart_ref.clone(),
        })
        .collect();

    info!(region = %region.key, points = windowed.len(), "region forecast complete");

    Ok(RegionForecast {
        records,
        chart: chart_ref,
    })
}

/// Chart filenames embed the forecast date and region key, plus the dataset
/// tag when configured, so runs over different datasets with colliding
/// region codes write distinct artifacts.
fn chart_file_name(forecast_date: NaiveDate, region: &RegionSeries, output: &OutputConfig) -> String {
    let ext = output.chart_format.extension();
    match &output.dataset_tag {
        Some(tag) => format!("{}_{}_{}.{}", forecast_date, tag, region.key, ext),
        None => format!("{}_{}.{}", forecast_date, region.key, ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FitParams, TimeSeries};

    fn test_config(root: &Path) -> AppConfig {
        toml::from_str(&format!(
            r#"
            [input]
            data_csv = "unused.csv"

            [output]
            root = "{}"
            name = "world"
            "#,
            root.display()
        ))
        .unwrap()
    }

    fn region_from(values: &[f64], start: &str) -> RegionSeries {
        let start: NaiveDate = start.parse().unwrap();
        let series: TimeSeries = values
            .iter()
            .enumerate()
            .map(|(x, v)| (start + chrono::Duration::days(x as i64), *v))
            .collect();
        RegionSeries {
            key: "IT".to_string(),
            name: Some("Italy".to_string()),
            series,
        }
    }

    fn logistic_values(n: usize) -> Vec<f64> {
        let params = FitParams {
            a: 450.0,
            b: 3.0,
            c: 0.25,
        };
        (0..n).map(|x| params.eval(x as f64)).collect()
    }

    #[test]
    fn below_minimum_points_skips_without_fitting() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let region = region_from(&[20.0, 30.0, 45.0, 70.0, 100.0], "2020-03-01");

        let result = run_region(&region, &config, dir.path());
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData {
                required: 10,
                actual: 5
            })
        ));
        // The skip happens before the fitter, so no chart was attempted
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn below_threshold_skips_as_no_outbreak() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let values: Vec<f64> = (0..15).map(|x| 1.0 + x as f64 * 0.5).collect();
        let region = region_from(&values, "2020-03-01");

        let result = run_region(&region, &config, dir.path());
        assert!(matches!(result, Err(ForecastError::NoOutbreak)));
    }

    #[test]
    fn completed_region_produces_merged_records_and_chart() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let region = region_from(&logistic_values(15), "2020-03-01");

        let forecast = run_region(&region, &config, dir.path()).unwrap();
        assert_eq!(forecast.records.len(), 18);
        assert_eq!(
            forecast
                .records
                .iter()
                .filter(|r| r.confirmed.is_some())
                .count(),
            15
        );
        let chart = forecast.chart.as_deref().unwrap();
        assert!(chart.contains("2020-03-15_IT"), "chart = {}", chart);

        for record in &forecast.records {
            assert_eq!(record.forecast_date, "2020-03-15".parse().unwrap());
        }
    }

    #[test]
    fn dataset_tag_namespaces_chart_names() {
        let region = region_from(&logistic_values(15), "2020-03-01");
        let output: OutputConfig = toml::from_str(
            r#"
            root = "output"
            name = "usa"
            dataset_tag = "US"
            "#,
        )
        .unwrap();
        let name = chart_file_name("2020-03-15".parse().unwrap(), &region, &output);
        assert_eq!(name, "2020-03-15_US_IT.svg");
    }

    #[test]
    fn batch_merges_and_tallies_skips() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let fitted = region_from(&logistic_values(15), "2020-03-01");
        let mut short = region_from(&[20.0, 30.0, 45.0], "2020-03-01");
        short.key = "XS".to_string();
        let mut quiet = region_from(&[1.0, 2.0, 3.0], "2020-03-01");
        quiet.key = "LOW".to_string();

        let result = run_batch(&[fitted, short, quiet], &config).unwrap();
        assert_eq!(result.summary.processed, 1);
        assert_eq!(result.summary.insufficient_data, 1);
        assert_eq!(result.summary.no_outbreak, 1);
        assert_eq!(result.records.len(), 18);
        assert!(result
            .records
            .keys()
            .all(|(key, _)| key == "IT"));
    }
}
