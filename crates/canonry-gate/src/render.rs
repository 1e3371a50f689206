use crate::report::GateReport;

/// Render the completeness report as Markdown.
pub fn render_markdown(report: &GateReport) -> String {
    let mut lines: Vec<String> = vec![
        "# Gates & contracts completeness report".into(),
        String::new(),
        format!("**Generated:** {}", report.timestamp_utc),
        format!(
            "**Overall:** {}",
            if report.overall_pass { "PASS" } else { "FAIL" }
        ),
        String::new(),
        "## Summary".into(),
        String::new(),
        "| Check | Status |".into(),
        "|-------|--------|".into(),
        format!("| registration | {} |", report.summary.registration),
        format!(
            "| lifecycle guard allowed | {} |",
            GateReport::status_word(report.summary.lifecycle_guard_allowed)
        ),
        format!(
            "| canon layout complete | {} |",
            GateReport::status_word(report.summary.canon_layout_complete)
        ),
        String::new(),
        "## Registration".into(),
        String::new(),
    ];

    if let Some(summary) = &report.registration.summary {
        lines.push(format!("- **artifacts:** {}", summary.artifact_count));
        lines.push(format!(
            "- **new decision ids:** {}",
            summary.new_decision_ids.len()
        ));
        for id in &summary.new_decision_ids {
            lines.push(format!("  - `{id}`"));
        }
        if !summary.skipped.is_empty() {
            lines.push(String::new());
            lines.push("### Skipped artifacts".into());
            lines.push(String::new());
            for skip in &summary.skipped {
                lines.push(format!("- `{}`: {}", skip.path, skip.reason));
            }
        }
    }
    if let Some(error) = &report.registration.error {
        lines.push(format!("- **error:** {error}"));
    }

    lines.push(String::new());
    lines.push("## Lifecycle guard".into());
    lines.push(String::new());
    lines.push(format!(
        "- **allowed:** {}",
        report.lifecycle_guard.allowed
    ));

    if let Some(verdict) = &report.lifecycle_guard.verdict {
        lines.push(format!("- **lifecycle_id:** {}", verdict.lifecycle_id));
        lines.push(String::new());
        lines.push("### Per-check".into());
        lines.push(String::new());
        for (name, ok) in &verdict.checks {
            lines.push(format!("- `{name}`: {}", GateReport::status_word(*ok)));
        }
        push_list(&mut lines, "Abort reasons", &verdict.reasons);
        push_list(&mut lines, "UNSET violations", &verdict.unset_violations);
        push_list(
            &mut lines,
            "Supported-claim violations",
            &verdict.supported_claim_violations,
        );
        push_list(
            &mut lines,
            "Evidence hash violations",
            &verdict.evidence_hash_violations,
        );
    }
    if let Some(error) = &report.lifecycle_guard.error {
        lines.push(format!("- **error:** {error}"));
    }

    lines.push(String::new());
    lines.push("## Canon layout".into());
    lines.push(String::new());
    lines.push(format!("**Complete:** {}", report.canon_layout.ok));
    lines.push(String::new());
    if !report.canon_layout.missing.is_empty() {
        lines.push("Missing:".into());
        for rel in &report.canon_layout.missing {
            lines.push(format!("- {rel}"));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn push_list(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("### {title}"));
    lines.push(String::new());
    for item in items {
        lines.push(format!("- {item}"));
    }
}

/// Render the compact fixed-format status block for orchestration
/// tooling: commit reference, report path, overall verdict, timestamp.
pub fn render_block(report: &GateReport, commit: &str, report_path: &str) -> String {
    format!(
        "--- canonry_eval ---\ncommit: {commit}\nreport: {report_path}\noverall: {}\nat: {}\n---",
        GateReport::status_word(report.overall_pass),
        report.timestamp_utc
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{GateSummary, GuardSection, LayoutSection, RegistrationSection};

    fn minimal_report(pass: bool) -> GateReport {
        GateReport {
            timestamp_utc: "2026-01-01T00:00:00+00:00".into(),
            overall_pass: pass,
            summary: GateSummary {
                registration: "pass".into(),
                lifecycle_guard_allowed: pass,
                canon_layout_complete: true,
            },
            registration: RegistrationSection {
                ok: true,
                error: None,
                summary: None,
            },
            lifecycle_guard: GuardSection {
                allowed: pass,
                error: if pass { None } else { Some("boom".into()) },
                verdict: None,
            },
            canon_layout: LayoutSection {
                ok: true,
                missing: Vec::new(),
            },
        }
    }

    #[test]
    fn markdown_carries_overall_verdict() {
        let md = render_markdown(&minimal_report(true));
        assert!(md.contains("**Overall:** PASS"));
        assert!(md.contains("| registration | pass |"));

        let md = render_markdown(&minimal_report(false));
        assert!(md.contains("**Overall:** FAIL"));
        assert!(md.contains("- **error:** boom"));
    }

    #[test]
    fn block_is_fixed_format() {
        let block = render_block(&minimal_report(true), "abc123", ".meta/reports/r.md");
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "--- canonry_eval ---");
        assert_eq!(lines[1], "commit: abc123");
        assert_eq!(lines[2], "report: .meta/reports/r.md");
        assert_eq!(lines[3], "overall: pass");
        assert_eq!(lines[5], "---");
    }
}
