use thiserror::Error;

/// Errors raised while forecasting a single region.
///
/// All of these are caught at the pipeline boundary and turned into a skip
/// for that region; none of them aborts the batch.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// No data point exceeds the outbreak threshold
    #[error("no data point exceeds the outbreak threshold")]
    NoOutbreak,

    /// Too few data points after windowing to attempt a fit
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The curve fit did not converge within the evaluation budget
    #[error("curve fit failed to converge after {evaluations} evaluations")]
    FitDiverged { evaluations: usize },

    /// Writing the chart artifact failed
    #[error("chart rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
