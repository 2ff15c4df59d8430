//! MIM-7 Compliance Checker CLI

use clap::{Parser, Subcommand};
use mim_core::{
    ArtifactVerifier, ComplianceResult, ComplianceStatus, Dispatcher, GeospatialCheckResult,
    ProbeConfig, RequestContext,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mim-check")]
#[command(about = "MIM-7 standards compliance checks for web services and GeoPackages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe a web service URL for WFS / OGC API Features compliance
    Probe {
        /// Service URL
        #[arg(short, long)]
        url: String,

        /// Per-request timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a GeoPackage for geospatial data and identifier invariants
    Gpkg {
        /// Path to the GeoPackage file (e.g. ./example.gpkg)
        #[arg(short, long)]
        file: PathBuf,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set subscriber: {}", e);
    }

    match cli.command {
        Commands::Probe { url, timeout, json } => cmd_probe(url, timeout, json).await,
        Commands::Gpkg { file, json } => cmd_gpkg(file, json),
    }
}

async fn cmd_probe(url: String, timeout_secs: u64, json: bool) -> ExitCode {
    let config = ProbeConfig {
        timeout_secs,
        ..Default::default()
    };

    let dispatcher = match Dispatcher::with_config(&config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = RequestContext::new();
    info!(request_id = %ctx.request_id, "Probing {}", url);
    let result = dispatcher
        .verify_service(&url, &ctx)
        .await
        .into_compliance_result();

    if json {
        print_json(&result);
    } else {
        println!("{}", render_probe_report(&result));
    }

    match result.status {
        ComplianceStatus::Compliant => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn cmd_gpkg(file: PathBuf, json: bool) -> ExitCode {
    if !file.is_file() {
        error!("File not found: {}", file.display());
        eprintln!("File not found: {}", file.display());
        return ExitCode::from(2);
    }

    let payload = match std::fs::read(&file) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to read {}: {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = ArtifactVerifier::default().verify(&payload);

    if json {
        print_json(&result);
    } else {
        println!("{}", render_gpkg_report(&result));
    }

    if result.contains_geospatial_data {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Failed to serialize verdict: {}", e),
    }
}

fn render_probe_report(result: &ComplianceResult) -> String {
    format!(
        "Service: {}\nStatus: {}\nDetails: {}",
        result.target, result.status, result.details
    )
}

fn render_gpkg_report(result: &GeospatialCheckResult) -> String {
    let mut lines = Vec::new();

    if result.contains_geospatial_data {
        lines.push(format!(
            "The layer \"{}\" contains geospatial data.",
            result.layer_name
        ));
        lines.push(if result.identifiers_unique {
            "The identifiers are unique.".to_string()
        } else {
            "The identifiers are not unique.".to_string()
        });
        lines.push(if result.identifiers_persistent {
            "The identifiers are persistent.".to_string()
        } else {
            "The identifiers are not persistent.".to_string()
        });
    } else if let Some(message) = &result.message {
        lines.push(message.clone());
    }

    lines.push("GeoPackage processing completed.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpkg_report_for_found_layer() {
        let report = render_gpkg_report(&GeospatialCheckResult::found("point1", true, false));
        assert_eq!(
            report,
            "The layer \"point1\" contains geospatial data.\n\
             The identifiers are unique.\n\
             The identifiers are not persistent.\n\
             GeoPackage processing completed."
        );
    }

    #[test]
    fn test_gpkg_report_without_geometry() {
        let report = render_gpkg_report(&GeospatialCheckResult::not_found());
        assert_eq!(
            report,
            "No geospatial data found in any layer\nGeoPackage processing completed."
        );
    }

    #[test]
    fn test_probe_report() {
        let report = render_probe_report(&ComplianceResult::unreachable(
            "http://localhost:1",
            "The service could not be contacted: connection failed",
        ));
        assert!(report.contains("Status: error"));
        assert!(report.starts_with("Service: http://localhost:1"));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["mim-check", "gpkg", "--file", "example.gpkg"]).unwrap();
        assert!(matches!(cli.command, Commands::Gpkg { json: false, .. }));

        let cli = Cli::try_parse_from([
            "mim-check", "-v", "probe", "--url", "https://example.com", "--timeout", "3",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Probe { timeout: 3, .. }));
    }
}
