//! Apply report display

use std::fmt::Write as _;

use crate::batch::{ApplyOutcome, ApplyReport};
use crate::error::CliResult;
use crate::plan::OutputFormat;

const ERROR_WIDTH: usize = 72;

/// Truncate a string for table display, handling Unicode safely.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

fn marker(outcome: ApplyOutcome, use_color: bool) -> String {
    let (symbol, code) = match outcome {
        ApplyOutcome::Created => ("+", "\x1b[32m"),
        ApplyOutcome::Updated => ("~", "\x1b[33m"),
        ApplyOutcome::Deleted => ("-", "\x1b[31m"),
        ApplyOutcome::Unchanged => ("=", ""),
        ApplyOutcome::Skipped => ("!", "\x1b[33m"),
        ApplyOutcome::Failed => ("✗", "\x1b[31m"),
    };
    if use_color && !code.is_empty() {
        format!("{code}{symbol}\x1b[0m")
    } else {
        symbol.to_string()
    }
}

pub fn render_report(report: &ApplyReport, format: OutputFormat, use_color: bool) -> CliResult<String> {
    match format {
        OutputFormat::Json => return Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Yaml => return Ok(serde_yaml::to_string(report)?),
        OutputFormat::Table => {}
    }

    let mut out = String::new();
    for item in &report.items {
        let _ = write!(
            out,
            "  {} {} '{}' {}",
            marker(item.outcome, use_color),
            item.kind,
            item.name,
            item.outcome
        );
        if let Some(error) = &item.error {
            let _ = write!(out, ": {}", truncate(error, ERROR_WIDTH));
        }
        out.push('\n');
    }
    for message in &report.unattributed {
        let _ = writeln!(
            out,
            "  {} {}",
            marker(ApplyOutcome::Failed, use_color),
            truncate(message, ERROR_WIDTH)
        );
    }
    if !report.items.is_empty() || !report.unattributed.is_empty() {
        out.push('\n');
    }

    let _ = write!(
        out,
        "Applied: {} changed, {} unchanged",
        report.changed_count(),
        report.success_count - report.changed_count()
    );
    if report.skipped_count > 0 {
        let _ = write!(out, ", {} skipped", report.skipped_count);
    }
    if report.failure_count > 0 {
        let _ = write!(out, ", {} failed", report.failure_count);
    }
    let _ = writeln!(out, " ({} ms)", report.duration_ms);
    Ok(out)
}

pub fn print_report(report: &ApplyReport, format: OutputFormat, use_color: bool) -> CliResult<()> {
    print!("{}", render_report(report, format, use_color)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ApplyItem;
    use crate::models::AssetKind;

    fn report() -> ApplyReport {
        let mut report = ApplyReport::new();
        report.record(ApplyItem::new(AssetKind::Service, "hello", ApplyOutcome::Created));
        report.record(ApplyItem::new(AssetKind::Role, "ops", ApplyOutcome::Unchanged));
        report.record(ApplyItem::failed(AssetKind::Collection, "weather", "Conflict: column exists"));
        report.set_duration(42);
        report
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("short", 10), "short");
        let result = truncate("héllo wörld café au lait", 10);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 10);
    }

    #[test]
    fn test_table_lists_items_and_summary() {
        let text = render_report(&report(), OutputFormat::Table, false).unwrap();
        assert!(text.contains("  + service 'hello' created"));
        assert!(text.contains("  ✗ collection 'weather' failed: Conflict: column exists"));
        assert!(text.contains("Applied: 1 changed, 1 unchanged, 1 failed (42 ms)"));
    }

    #[test]
    fn test_table_lists_unattributed_failures() {
        let mut report = report();
        report.record_unattributed("gadgets 'x': rejected");
        let text = render_report(&report, OutputFormat::Table, false).unwrap();
        assert!(text.contains("  ✗ gadgets 'x': rejected"));
        assert!(text.contains("2 failed"));
    }

    #[test]
    fn test_json_report() {
        let text = render_report(&report(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["failure_count"], 1);
        assert_eq!(value["items"][0]["outcome"], "created");
    }
}
