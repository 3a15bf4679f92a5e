use std::fmt::Write;

use clap::ValueEnum;

use crate::error::Result;
use crate::report::{CohortInterval, RetentionReport, RetentionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
}

pub fn render(report: &RetentionReport, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::Markdown => Ok(build_markdown(report)),
    }
}

fn build_markdown(report: &RetentionReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Cohort Retention Report");
    let _ = writeln!(
        output,
        "Generated for {} by {} ({}) at {}",
        report.source,
        report.config.group_by,
        report.config.describe_window(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        output,
        "Records: {} total, {} bucketed, {} dropped, {} outside window",
        report.total_records,
        report.bucketed_records,
        report.dropped_records,
        report.filtered_records
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Retention by Interval");

    if report.intervals.is_empty() {
        let _ = writeln!(output, "No attendance recorded for this window.");
    } else {
        let _ = writeln!(output, "| Interval | Participants | Retained | Retention | Growth |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for interval in &report.intervals {
            write_interval_row(&mut output, interval);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    match &report.summary {
        Some(summary) => write_summary(&mut output, summary),
        None => {
            let _ = writeln!(
                output,
                "Not enough intervals to compare retention (at least two are needed)."
            );
        }
    }

    output
}

fn write_interval_row(output: &mut String, interval: &CohortInterval) {
    let retained = if interval.retention_rate.is_some() {
        format!(
            "{} of {}",
            interval.retained_participants.len(),
            interval.previous_participants.len()
        )
    } else {
        "-".to_string()
    };

    let _ = writeln!(
        output,
        "| {} | {} | {} | {} | {} |",
        interval.interval_key,
        interval.participants.len(),
        retained,
        format_rate(interval.retention_rate),
        interval
            .growth
            .map_or_else(|| "-".to_string(), |growth| format!("{growth:+}"))
    );
}

fn write_summary(output: &mut String, summary: &RetentionSummary) {
    let _ = writeln!(
        output,
        "- Average retention: {} across {} comparisons",
        format_rate(summary.average_retention_rate),
        summary.intervals_compared
    );

    if let Some(highest) = &summary.highest_retention {
        let _ = writeln!(
            output,
            "- Highest retention: {} in {}",
            format_rate(Some(highest.rate)),
            highest.interval_key
        );
    }
    if let Some(lowest) = &summary.lowest_retention {
        let _ = writeln!(
            output,
            "- Lowest retention: {} in {}",
            format_rate(Some(lowest.rate)),
            lowest.interval_key
        );
    }

    match &summary.highest_growth {
        Some(growth) => {
            let _ = writeln!(
                output,
                "- Highest growth: {:+} participants in {}",
                growth.growth, growth.interval_key
            );
        }
        None => {
            let _ = writeln!(output, "- Highest growth: no interval grew");
        }
    }

    let _ = writeln!(
        output,
        "- Participants: {} across all intervals ({} unique)",
        summary.total_participants, summary.unique_participants
    );
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |rate| format!("{:.1}%", rate * 100.0))
}
