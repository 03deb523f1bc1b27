use crate::config::ChartFormat;
use crate::error::{ForecastError, Result};
use crate::types::TimeSeries;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::panic;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1280, 640);
const OBSERVED_COLOR: RGBColor = RGBColor(70, 130, 180);
const PROJECTED_COLOR: RGBColor = RGBColor(255, 165, 0);
const ESTIMATE_COLOR: RGBColor = RGBColor(200, 30, 30);

/// Render the actual-vs-projected chart for one region.
///
/// Observed values are drawn as bars over the combined date range, zero at
/// projection-only dates; projected bars fill the future-only slots; the
/// fitted curve is overlaid as a line across the whole range. Each call owns
/// its drawing area and presents it before returning, so no drawing state
/// survives the call on any exit path. Backend panics are contained and
/// surface as a `Render` error.
pub fn render_forecast(
    path: &Path,
    observed: &TimeSeries,
    projected: &TimeSeries,
    format: ChartFormat,
) -> Result<()> {
    let render = || match format {
        ChartFormat::Svg => {
            let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
            draw_forecast(root, observed, projected)
        }
        ChartFormat::Png => {
            let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
            draw_forecast(root, observed, projected)
        }
    };

    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| ForecastError::Render("drawing backend panicked".to_string()))?
}

fn draw_forecast<DB>(
    root: DrawingArea<DB, Shift>,
    observed: &TimeSeries,
    projected: &TimeSeries,
) -> Result<()>
where
    DB: DrawingBackend,
{
    // The projection covers the observed dates plus the forecast window, so
    // its index is the combined range.
    let dates = projected.dates();
    let n = dates.len();
    if n == 0 {
        return Ok(());
    }

    let observed_bars: Vec<f64> = dates
        .iter()
        .map(|d| observed.get(*d).unwrap_or(0.0))
        .collect();
    let projected_bars: Vec<f64> = dates
        .iter()
        .map(|d| {
            if observed.contains(*d) {
                0.0
            } else {
                projected.get(*d).unwrap_or(0.0)
            }
        })
        .collect();
    let estimate: Vec<f64> = dates.iter().map(|d| projected.get(*d).unwrap_or(0.0)).collect();

    let y_max = observed_bars
        .iter()
        .chain(projected_bars.iter())
        .chain(estimate.iter())
        .copied()
        .fold(1.0_f64, f64::max);

    root.fill(&WHITE).map_err(to_render_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(0.0..n as f64, 0.0..y_max * 1.1)
        .map_err(to_render_error)?;

    chart
        .configure_mesh()
        .x_labels(n.min(12))
        .x_label_formatter(&|v| {
            let idx = v.floor() as usize;
            dates.get(idx).map(|d| d.to_string()).unwrap_or_default()
        })
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()
        .map_err(to_render_error)?;

    chart
        .draw_series(
            observed_bars
                .iter()
                .enumerate()
                .filter(|(_, v)| **v > 0.0)
                .map(|(i, v)| {
                    Rectangle::new(
                        [(i as f64 + 0.08, 0.0), (i as f64 + 0.48, *v)],
                        OBSERVED_COLOR.filled(),
                    )
                }),
        )
        .map_err(to_render_error)?
        .label("Confirmed")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], OBSERVED_COLOR.filled()));

    chart
        .draw_series(
            projected_bars
                .iter()
                .enumerate()
                .filter(|(_, v)| **v > 0.0)
                .map(|(i, v)| {
                    Rectangle::new(
                        [(i as f64 + 0.52, 0.0), (i as f64 + 0.92, *v)],
                        PROJECTED_COLOR.filled(),
                    )
                }),
        )
        .map_err(to_render_error)?
        .label("Projected")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], PROJECTED_COLOR.filled()));

    chart
        .draw_series(LineSeries::new(
            estimate
                .iter()
                .enumerate()
                .map(|(i, v)| (i as f64 + 0.5, *v)),
            ESTIMATE_COLOR.stroke_width(2),
        ))
        .map_err(to_render_error)?
        .label("Estimate")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ESTIMATE_COLOR.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.7))
        .border_style(BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()
        .map_err(to_render_error)?;

    root.present().map_err(to_render_error)?;
    Ok(())
}

fn to_render_error<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::Render(err.to_string())
}
