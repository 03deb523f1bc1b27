use clap::{Parser, Subcommand};
use outbreak_forecast::{config, data, output, pipeline, server};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the per-region forecast and write charts and combined datasets
    Forecast {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the generated charts and datasets
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Forecast { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let regions = data::load_regions(&app_config)?;
            let result = pipeline::run_batch(&regions, &app_config)?;
            output::write_outputs(&result.records, &app_config)?;

            let summary = &result.summary;
            info!(
                processed = summary.processed,
                no_outbreak = summary.no_outbreak,
                insufficient_data = summary.insufficient_data,
                fit_failures = summary.fit_failures,
                chart_failures = summary.chart_failures,
                "forecast complete"
            );
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
