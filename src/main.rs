use std::{env, fs, path::PathBuf, process};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use morphgate::{AssetSnapshot, Severity, StageConfig, StageGate};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Static configuration must verify before any asset is touched.
    let gate = match StageGate::standard() {
        Ok(gate) => gate,
        Err(err) => {
            eprintln!("configuration error: {err}");
            process::exit(2);
        }
    };

    match run(&gate) {
        Ok(passed) => process::exit(if passed { 0 } else { 1 }),
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    }
}

fn run(gate: &StageGate) -> Result<bool> {
    let mut snapshot_path = None;
    let mut container_path = None;
    let mut report_path = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--report" => {
                report_path = Some(PathBuf::from(args.next().unwrap_or_else(|| usage())));
            }
            _ if snapshot_path.is_none() => snapshot_path = Some(PathBuf::from(arg)),
            _ if container_path.is_none() => container_path = Some(PathBuf::from(arg)),
            _ => usage(),
        }
    }
    let Some(snapshot_path) = snapshot_path else {
        usage()
    };

    let snapshot_json = fs::read(&snapshot_path)
        .with_context(|| format!("failed to read snapshot file: {}", snapshot_path.display()))?;
    let mut snapshot: AssetSnapshot = serde_json::from_slice(&snapshot_json)
        .with_context(|| format!("failed to parse snapshot JSON: {}", snapshot_path.display()))?;

    let check_binary = container_path.is_some();
    if let Some(container_path) = &container_path {
        let bytes = fs::read(container_path).with_context(|| {
            format!("failed to read container file: {}", container_path.display())
        })?;
        snapshot.container_bytes = Some(bytes);
    }

    let stage = if check_binary { "package" } else { "ingest" };
    let config = StageConfig::full_surface(stage);
    let report = gate.validate(&snapshot, &config, check_binary);

    println!("Stage: {}", report.stage);
    println!(
        "Mapped parameters: {}/{}",
        report.mapped.len(),
        morphgate::spec::TOTAL_PARAMETERS
    );
    println!(
        "Issues: {} errors, {} warnings",
        report.error_count(),
        report.warning_count()
    );
    for issue in &report.issues {
        let tag = match issue.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        println!("  [{tag}] {}: {}", issue.code, issue.message);
    }
    println!("Verdict: {}", if report.passed { "PASS" } else { "FAIL" });

    if let Some(report_path) = report_path {
        let json = serde_json::to_vec_pretty(&report).context("failed to serialize report")?;
        fs::write(&report_path, json)
            .with_context(|| format!("failed to write report: {}", report_path.display()))?;
    }

    Ok(report.passed)
}

fn usage() -> ! {
    eprintln!("Usage: morphgate <snapshot.json> [scene.glb] [--report <report.json>]");
    process::exit(2);
}
