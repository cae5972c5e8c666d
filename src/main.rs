//! disksnap - Main entry point
//!
//! Parses the flag surface, resolves settings, wires the gcloud backend to
//! the orchestrator, and maps every failure class to its exit code.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use disksnap::cli::Cli;
use disksnap::config::Settings;
use disksnap::error::SnapError;
use disksnap::gcloud::GcloudCli;
use disksnap::orchestrator::Orchestrator;
use disksnap::report::RunReport;

/// Initialize tracing with RUST_LOG override support.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse_args();
    let request = match cli.to_run_request() {
        Ok(request) => request,
        Err(err) => fail(err),
    };
    let settings = match Settings::resolve(&cli) {
        Ok(settings) => settings,
        Err(err) => fail(err),
    };
    let backend = match GcloudCli::new() {
        Ok(backend) => backend,
        Err(err) => fail(err),
    };

    let orchestrator = Orchestrator::new(&backend, &backend, &settings);
    match orchestrator.run(&request) {
        Ok(report) => finish(report),
        Err(err) => fail(err),
    }
}

/// Print the per-disk summary and exit with the report's code.
fn finish(report: RunReport) -> ! {
    for err in report.errors() {
        error!("{err}");
        eprintln!("✗ {err}");
    }
    info!(
        created = report.snapshots_created(),
        deleted = report.snapshots_deleted(),
        "run complete"
    );
    println!(
        "✓ {} snapshot(s) created, {} expired snapshot(s) deleted",
        report.snapshots_created(),
        report.snapshots_deleted()
    );
    std::process::exit(report.exit_code());
}

/// Print a diagnostic for a fatal error and exit with its code.
fn fail(err: SnapError) -> ! {
    error!("{err}");
    eprintln!("✗ {err}");
    std::process::exit(err.exit_code());
}
