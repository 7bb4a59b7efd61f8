//! Report rendering and exit-code policy

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tabled::{Table, Tabled};

use hostkeeper_core::domain::{MaintenanceReport, ReportItem, ReportStatus};

/// Exit code when any report failed outright
pub const EXIT_ERROR: u8 = 1;
/// Exit code when `--fail-on` was reached
pub const EXIT_POLICY: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Warning,
    Critical,
}

impl FailOn {
    fn status(self) -> ReportStatus {
        match self {
            FailOn::Warning => ReportStatus::Warning,
            FailOn::Critical => ReportStatus::Critical,
        }
    }
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Item")]
    name: String,
    #[tabled(rename = "Action")]
    action: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&ReportItem> for ItemRow {
    fn from(item: &ReportItem) -> Self {
        let (action, detail) = match item {
            ReportItem::Archived {
                size_mb,
                file_count,
                ..
            } => ("archived", format!("{} files, {:.2} MB", file_count, size_mb)),
            ReportItem::Compressed {
                original_mb,
                compressed_mb,
                freed_mb,
                ..
            } => (
                "compressed",
                format!(
                    "{:.2} MB → {:.2} MB (freed {:.2} MB)",
                    original_mb, compressed_mb, freed_mb
                ),
            ),
            ReportItem::Deleted {
                size_mb, age_days, ..
            } => ("deleted", format!("{:.2} MB, {} days old", size_mb, age_days)),
            ReportItem::Alert {
                severity, message, ..
            } => ("alert", format!("[{}] {}", severity, message)),
        };

        Self {
            name: item.name(),
            action,
            detail,
        }
    }
}

fn status_label(status: ReportStatus) -> colored::ColoredString {
    match status {
        ReportStatus::Success => "✓ success".green().bold(),
        ReportStatus::Warning => "! warning".yellow().bold(),
        ReportStatus::Critical => "✗ critical".red().bold(),
        ReportStatus::Error => "✗ error".red().bold(),
    }
}

/// Print a report to stdout as pretty JSON or a colored summary plus table
pub fn render(report: &MaintenanceReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json_pretty()?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        status_label(report.status),
        report.job.to_string().cyan().bold(),
        report.run_id.dimmed()
    );
    println!("  {}", report.summary());

    if !report.items.is_empty() {
        let rows: Vec<ItemRow> = report.items.iter().map(ItemRow::from).collect();
        println!();
        println!("{}", Table::new(rows));
    }

    if let Some(gpus) = report.metrics.as_ref().and_then(|m| m.gpus.as_ref()) {
        for gpu in gpus {
            println!(
                "  {} GPU {} {}: {:.1}% util, {:.1}% memory",
                "•".bold(),
                gpu.index,
                gpu.name,
                gpu.utilization_percent,
                gpu.memory_percent()
            );
        }
    }

    for error in &report.errors {
        println!(
            "  {} {} ({:?}): {}",
            "✗".red(),
            error.item,
            error.kind,
            error.message
        );
    }
    println!();

    Ok(())
}

/// Append each report as one JSON line
pub fn append_report_file(path: &Path, reports: &[MaintenanceReport]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open report file {}", path.display()))?;

    for report in reports {
        writeln!(file, "{}", report.to_json()?)?;
    }

    Ok(())
}

/// 0 = ok, 1 = a job failed, 2 = `--fail-on` threshold reached
pub fn exit_code(reports: &[MaintenanceReport], fail_on: Option<FailOn>) -> u8 {
    let worst = reports
        .iter()
        .map(|r| r.status)
        .max()
        .unwrap_or(ReportStatus::Success);

    if worst == ReportStatus::Error {
        return EXIT_ERROR;
    }
    match fail_on {
        Some(policy) if worst >= policy.status() => EXIT_POLICY,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hostkeeper_core::domain::{JobKind, ReportBuilder};

    fn report(status: ReportStatus) -> MaintenanceReport {
        let mut builder = ReportBuilder::new("run-1", JobKind::Health, Utc::now());
        if status == ReportStatus::Error {
            return builder.fail("host", "probe unavailable");
        }
        builder.escalate(status);
        builder.finish()
    }

    #[test]
    fn test_exit_code_policy() {
        let ok = report(ReportStatus::Success);
        let warn = report(ReportStatus::Warning);
        let crit = report(ReportStatus::Critical);
        let err = report(ReportStatus::Error);

        assert_eq!(exit_code(&[ok.clone()], None), 0);
        assert_eq!(exit_code(&[warn.clone()], None), 0);
        assert_eq!(exit_code(&[warn.clone()], Some(FailOn::Critical)), 0);
        assert_eq!(exit_code(&[warn.clone()], Some(FailOn::Warning)), EXIT_POLICY);
        assert_eq!(exit_code(&[ok, crit], Some(FailOn::Warning)), EXIT_POLICY);
        assert_eq!(exit_code(&[warn, err], Some(FailOn::Warning)), EXIT_ERROR);
        assert_eq!(exit_code(&[], Some(FailOn::Warning)), 0);
    }

    #[test]
    fn test_append_report_file_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/hostkeeper.jsonl");

        append_report_file(&path, &[report(ReportStatus::Success)]).unwrap();
        append_report_file(&path, &[report(ReportStatus::Warning)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"], "warning");
        assert_eq!(second["job"], "health");
        assert!(second["summary"].is_string());
    }

    #[test]
    fn test_item_row_detail() {
        let row = ItemRow::from(&ReportItem::Deleted {
            name: "backup-20240101_000000.tar.gz".to_string(),
            size_mb: 1.5,
            age_days: 10,
        });

        assert_eq!(row.action, "deleted");
        assert_eq!(row.detail, "1.50 MB, 10 days old");
    }
}
