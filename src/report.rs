//! Report rendering.

use std::fmt;

use clap::ValueEnum;

use seedsweep_analyze::ClassificationReport;

const RULE_WIDTH: usize = 70;
const NAME_WIDTH: usize = 48;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Human-readable rendering of a [`ClassificationReport`].
pub struct TextReport<'a> {
    report: &'a ClassificationReport,
    tag: &'a str,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a ClassificationReport, tag: &'a str) -> Self {
        Self { report, tag }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let summary = report.summary();
        let stats = &report.index_stats;
        let rule = "─".repeat(RULE_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(f, " Cross-seed cleanup report")?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            " {} torrents classified, {} excluded by filter",
            report.verdicts.len(),
            summary.excluded
        )?;
        writeln!(f, "   {:<12}{:>8}", "kept", summary.kept)?;
        writeln!(f, "   {:<12}{:>8}", "removable", summary.removable)?;
        writeln!(f, "   {:<12}{:>8}", "skipped", summary.skipped)?;
        writeln!(
            f,
            " {} files scanned, {} inaccessible, {} unique inodes",
            stats.total_files, stats.inaccessible_files, report.unique_identities
        )?;
        if summary.anomalies > 0 {
            writeln!(
                f,
                " {} file(s) with fewer hardlinks than referencing torrents",
                summary.anomalies
            )?;
        }
        writeln!(f)?;

        let removable = report.removable_by_size();
        if removable.is_empty() {
            return writeln!(f, " Nothing to tag.");
        }

        writeln!(
            f,
            " Removable torrents (tag '{}'), {} reclaimable:",
            self.tag,
            format_size(report.reclaimable_bytes())
        )?;
        for verdict in removable {
            let category = if verdict.category.is_empty() {
                "-"
            } else {
                verdict.category.as_str()
            };
            writeln!(
                f,
                "   {:>10}  {:<12} {}",
                format_size(verdict.size),
                truncate(category, 12),
                truncate(&verdict.name, NAME_WIDTH)
            )?;
        }
        Ok(())
    }
}

/// Format size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
