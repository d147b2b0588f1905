//! Report generation.
//!
//! This module renders a [`Report`] as plain text, Markdown or JSON.

use crate::analysis::ranked;
use crate::models::{
    AnalyticsReport, GroupedAverages, PruneReport, Report, ReportMetadata, ValidationReport,
};
use anyhow::Result;
use std::fmt::Write as _;

/// Generate the plain-text analytics report.
pub fn generate_text_report(report: &Report, decimals: usize) -> String {
    let mut output = String::new();
    let analytics = &report.outcome.analytics;

    output.push_str("--- FINAL ANALYTICS REPORT ---\n");
    output.push_str(&format!("Source: {}\n", report.metadata.source));
    output.push_str(&format!(
        "Valid score range: {}..={}\n\n",
        report.metadata.min_score, report.metadata.max_score
    ));

    output.push_str(&text_cleaning_summary(
        &report.outcome.validation,
        &report.outcome.pruning,
    ));

    output.push_str("Average Score by Country:\n");
    output.push_str(&text_grouped(&analytics.average_score_by_country, decimals));

    output.push_str(&format!(
        "Best Performing Department: {} | Average Score: {:.*}\n",
        analytics.best_department.name, decimals, analytics.best_department.average
    ));
    output.push_str(&format!(
        "Total Students Processed: {}\n",
        analytics.total_rows
    ));

    for grouping in &analytics.extra_groupings {
        output.push_str(&format!("\nAverage Score by {}:\n", grouping.group_by));
        output.push_str(&text_grouped(grouping, decimals));
    }

    output
}

fn text_cleaning_summary(validation: &ValidationReport, pruning: &PruneReport) -> String {
    let mut section = String::new();

    let _ = writeln!(
        section,
        "Students examined: {} | retained: {} | removed: {}",
        validation.examined,
        validation.retained,
        validation.rejected.len()
    );
    for rejected in &validation.rejected {
        let _ = writeln!(section, "  - removed {}: {}", rejected.path, rejected.reason);
    }

    let _ = writeln!(section, "Empty containers pruned: {}", pruning.removed.len());
    for container in &pruning.removed {
        let _ = writeln!(section, "  - {} {}", container.level, container.path);
    }
    section.push('\n');

    section
}

fn text_grouped(grouped: &GroupedAverages, decimals: usize) -> String {
    let mut section = String::new();

    if grouped.is_empty() {
        section.push_str("  (no rows)\n");
        return section;
    }

    for group in &grouped.groups {
        let _ = writeln!(
            section,
            "  {}: {:.*} ({} student{})",
            group.key,
            decimals,
            group.mean,
            group.count,
            if group.count == 1 { "" } else { "s" }
        );
    }

    section
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, decimals: usize) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Hierclean Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Cleaning
    output.push_str(&generate_validation_section(&report.outcome.validation));
    output.push_str(&generate_pruning_section(&report.outcome.pruning));

    // Analytics
    output.push_str(&generate_analytics_section(&report.outcome.analytics, decimals));

    // Footer
    output.push_str("---\n\n");
    output.push_str("*Report generated by hierclean*\n");

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Valid Score Range:** {} to {}\n",
        metadata.min_score, metadata.max_score
    ));
    section.push_str(&format!(
        "- **Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_validation_section(validation: &ValidationReport) -> String {
    let mut section = String::new();

    section.push_str("## Validation\n\n");
    section.push_str("| Examined | Retained | Removed |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        validation.examined,
        validation.retained,
        validation.rejected.len()
    ));

    if !validation.rejected.is_empty() {
        section.push_str("| Student | Name | Reason |\n");
        section.push_str("|:---|:---|:---|\n");
        for rejected in &validation.rejected {
            section.push_str(&format!(
                "| `{}` | {} | {} |\n",
                rejected.path,
                rejected.name.as_deref().unwrap_or("*(none)*"),
                rejected.reason
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_pruning_section(pruning: &PruneReport) -> String {
    let mut section = String::new();

    section.push_str("## Pruning\n\n");

    if pruning.is_empty() {
        section.push_str("No empty containers were found.\n\n");
        return section;
    }

    section.push_str("| Level | Path |\n");
    section.push_str("|:---|:---|\n");
    for container in &pruning.removed {
        section.push_str(&format!("| {} | `{}` |\n", container.level, container.path));
    }
    section.push('\n');

    section
}

fn generate_analytics_section(analytics: &AnalyticsReport, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Analytics\n\n");
    section.push_str(&format!(
        "- **Total Students Processed:** {}\n",
        analytics.total_rows
    ));
    section.push_str(&format!(
        "- **Best Performing Department:** {} ({:.*})\n\n",
        analytics.best_department.name, decimals, analytics.best_department.average
    ));

    section.push_str(&generate_grouped_table(
        &analytics.average_score_by_country,
        decimals,
    ));
    for grouping in &analytics.extra_groupings {
        section.push_str(&generate_grouped_table(grouping, decimals));
    }

    section
}

fn generate_grouped_table(grouped: &GroupedAverages, decimals: usize) -> String {
    let mut table = String::new();

    table.push_str(&format!("### Average Score by {}\n\n", grouped.group_by));
    table.push_str(&format!("| {} | Average | Students |\n", grouped.group_by));
    table.push_str("|:---|:---:|:---:|\n");

    for group in ranked(grouped) {
        table.push_str(&format!(
            "| {} | {:.*} | {} |\n",
            group.key, decimals, group.mean, group.count
        ));
    }
    table.push('\n');

    table
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
