use crate::error::CliError;
use engine_config::report::finding::Finding;
use model::{execution::report::RunReport, operation::catalog::Catalog};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CatalogListing<'a> {
    catalog: &'a Catalog,
    findings: &'a [Finding],
}

fn generate_report_json(report: &RunReport) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

pub async fn write_report(report: &RunReport, path: &Path) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

pub fn print_report(report: &RunReport, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", generate_report_json(report)?);
    } else {
        print!("{}", render_table(report));
    }
    Ok(())
}

pub fn print_catalog(catalog: &Catalog, findings: &[Finding]) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&CatalogListing { catalog, findings })?;
    println!("{json}");
    Ok(())
}

fn render_table(report: &RunReport) -> String {
    let width = report
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("Operation".len());

    let mut out = format!(
        "Run {} of catalog '{}':\n{:<3} {:<width$} {:<13} {:<6} {:>8}  Result\n{}\n",
        report.run_id,
        report.catalog,
        "#",
        "Operation",
        "Kind",
        "Status",
        "Time",
        "-".repeat(width + 45)
    );
    for (idx, result) in report.iter().enumerate() {
        let status = if result.is_ok() { "ok" } else { "FAILED" };
        out.push_str(&format!(
            "{:<3} {:<width$} {:<13} {:<6} {:>6}ms  {}\n",
            idx + 1,
            result.name,
            result.kind.to_string(),
            status,
            result.elapsed_ms,
            result.summary()
        ));
    }
    out.push_str(&format!(
        "{} ok, {} failed\n",
        report.succeeded(),
        report.failed()
    ));
    for warning in &report.warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }
    out
}
