use anyhow::Result;
use clap::Parser;
use sensorflow_core::{cli, config, lake, pipeline, report};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();
    match args.command {
        cli::Command::Etl { input, output } => {
            pipeline::EtlPipeline::new(input, output).run()?;
        }
        cli::Command::Report {
            data,
            cost_per_minute,
            top_n,
            lookback_window,
        } => {
            let mut config = config::AppConfig::load();
            if let Some(rate) = cost_per_minute {
                config.cost_per_minute = rate;
            }
            if let Some(window) = lookback_window {
                config.lookback_window = window;
            }

            let enriched = lake::read_enriched(&data)?;
            let report = report::build_report(&enriched, &config, top_n)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
