//! Per-region logistic growth forecasting over cumulative case counts.
//!
//! The pipeline filters each region's series to its outbreak window, fits
//! `a * e^(-b * e^(-c*x))` by non-linear least squares, projects the model
//! over the observed dates plus a forecast window, renders an
//! actual-vs-projected chart, and merges everything into one combined table
//! written as CSV and JSON.

pub mod chart;
pub mod config;
pub mod data;
pub mod dates;
pub mod error;
pub mod fit;
pub mod outbreak;
pub mod output;
pub mod pipeline;
pub mod project;
pub mod server;
pub mod types;
