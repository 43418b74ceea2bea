//! Shared output formatting for lint reports.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;
use twig_cs_core::{Finding, Report, Severity, Summary};

use crate::OutputFormat;

/// Print a report in the specified format.
pub fn print(report: &Report, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(report, true),
        OutputFormat::Json => render_json(report)?,
        OutputFormat::Compact => render_compact(report),
    };
    print!("{rendered}");
    Ok(())
}

/// A table per file, findings in report order, then the summary line.
pub fn render_text(report: &Report, color: bool) -> String {
    // Pads before coloring so escape codes do not break alignment
    let paint = |code: &str, text: &str, width: usize| {
        let padded = format!("{text:<width$}");
        if color {
            format!("\x1b[{code}m{padded}\x1b[0m")
        } else {
            padded
        }
    };

    let mut out = String::new();
    for (unit, findings) in report.grouped_by_unit() {
        let _ = writeln!(out, "{unit}");
        let _ = writeln!(
            out,
            "  {:<7}  {:>5}  {:>8}  {:<7} {}",
            "LEVEL", "LINE", "POSITION", "CODE", "SNIFF"
        );
        for finding in findings {
            let level = match finding.severity {
                Severity::Error => paint("31", "error", 7),
                Severity::Warning => paint("33", "warning", 7),
                Severity::Notice => paint("34", "notice", 7),
            };
            let column = finding
                .location
                .column
                .map_or_else(|| "-".to_string(), |c| c.to_string());
            let _ = writeln!(
                out,
                "  {level}  {:>5}  {:>8}  {:<7} {}",
                finding.location.line, column, finding.code, finding.sniff
            );
            let _ = writeln!(out, "  >> {}", finding.message);
        }
        out.push('\n');
    }

    let summary = report.summary();
    let color_code = if summary.errors > 0 {
        "31"
    } else if summary.warnings > 0 {
        "33"
    } else {
        "32"
    };
    let _ = writeln!(out, "{}", paint(color_code, &report.format_summary(), 0));
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    findings: &'a [Finding],
}

fn render_json(report: &Report) -> Result<String> {
    let json = serde_json::to_string_pretty(&JsonReport {
        summary: report.summary(),
        findings: report.findings(),
    })?;
    Ok(format!("{json}\n"))
}

fn render_compact(report: &Report) -> String {
    report
        .findings()
        .iter()
        .map(|finding| format!("{finding}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use twig_cs_core::Location;

    fn report() -> Report {
        let mut report = Report::new();
        report.add_unit(vec![
            Finding::new(
                "TCS003",
                "blank-line-at-eof",
                Severity::Warning,
                Location::new("a.twig", 3, None),
                "File must end with a newline",
            ),
            Finding::new(
                "TCS101",
                "no-dump",
                Severity::Error,
                Location::new("a.twig", 1, Some(4)),
                "Call to debug function dump() must be removed",
            ),
        ]);
        report.add_unit(Vec::new());
        report
    }

    #[test]
    fn text_output() {
        assert_eq!(
            render_text(&report(), false),
            "a.twig\n\
             \x20 LEVEL     LINE  POSITION  CODE    SNIFF\n\
             \x20 warning      3         -  TCS003  blank-line-at-eof\n\
             \x20 >> File must end with a newline\n\
             \x20 error        1         4  TCS101  no-dump\n\
             \x20 >> Call to debug function dump() must be removed\n\
             \n\
             Files linted: 2, notices: 0, warnings: 1, errors: 1\n"
        );
    }

    #[test]
    fn compact_output() {
        assert_eq!(
            render_compact(&report()),
            "a.twig:3: warning [TCS003] File must end with a newline\n\
             a.twig:1:4: error [TCS101] Call to debug function dump() must be removed\n"
        );
    }

    #[test]
    fn json_output_has_summary_and_findings() {
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&report()).unwrap()).unwrap();
        assert_eq!(value["summary"]["files"], 2);
        assert_eq!(value["summary"]["errors"], 1);
        assert_eq!(value["findings"][1]["severity"], "error");
        assert_eq!(value["findings"][0]["location"]["column"], serde_json::Value::Null);
    }
}
