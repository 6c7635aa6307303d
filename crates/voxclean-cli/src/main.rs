//! voxclean binary.

use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};

use voxclean_cli::{filter_config_schema, init_tracing, run, Args, CliConfig};

/// Install an in-process Prometheus recorder when a run summary is requested.
fn init_metrics_summary() -> Option<PrometheusHandle> {
    let enabled = std::env::var("VOXCLEAN_METRICS_SUMMARY")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if !enabled {
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if args.print_schema {
        match filter_config_schema() {
            Ok(schema) => {
                println!("{}", schema);
                return;
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }

    init_tracing();

    let config = CliConfig::from_env();
    info!("CLI config: {:?}", config);

    let metrics = init_metrics_summary();

    let result = run(&args, &config).await;

    if let Some(handle) = metrics {
        info!("Metrics summary:\n{}", handle.render());
    }

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
