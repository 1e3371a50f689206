use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use canonry_guard::evaluate_resume_gates;
use canonry_registry::run_registration;
use canonry_types::WorkspaceLayout;

use crate::render::render_markdown;
use crate::report::{
    GateReport, GateSummary, GuardSection, LayoutSection, RegistrationSection,
};

/// Orchestrator inputs.
#[derive(Clone, Debug, Default)]
pub struct GateOptions {
    /// Override for the registration config path.
    pub config_path: Option<PathBuf>,
    /// Lifecycle id the caller expects the workspace to be on.
    pub expected_lifecycle_id: Option<String>,
}

/// Run the full gate battery: registration pass, lifecycle guard, canon
/// layout completeness. Always returns a report — failures land inside
/// it, never as an early exit.
pub fn run_gates(layout: &WorkspaceLayout, options: &GateOptions) -> GateReport {
    let registration = match run_registration(layout, options.config_path.as_deref(), false) {
        Ok(summary) => RegistrationSection {
            ok: true,
            error: None,
            summary: Some(summary),
        },
        Err(e) => {
            warn!(error = %e, "registration step failed");
            RegistrationSection {
                ok: false,
                error: Some(e.to_string()),
                summary: None,
            }
        }
    };

    let lifecycle_guard =
        match evaluate_resume_gates(layout, options.expected_lifecycle_id.as_deref()) {
            Ok(verdict) => GuardSection {
                allowed: verdict.allowed,
                error: None,
                verdict: Some(verdict),
            },
            Err(e) => {
                warn!(error = %e, "lifecycle guard could not run");
                GuardSection {
                    allowed: false,
                    error: Some(e.to_string()),
                    verdict: None,
                }
            }
        };

    let missing: Vec<String> = layout
        .required_canon_paths()
        .into_iter()
        .filter(|rel| !layout.root().join(rel).exists())
        .collect();
    let canon_layout = LayoutSection {
        ok: missing.is_empty(),
        missing,
    };

    let overall_pass = registration.ok && lifecycle_guard.allowed && canon_layout.ok;
    info!(overall_pass, "gate evaluation complete");
    GateReport {
        timestamp_utc: Utc::now().to_rfc3339(),
        overall_pass,
        summary: GateSummary {
            registration: GateReport::status_word(registration.ok).to_string(),
            lifecycle_guard_allowed: lifecycle_guard.allowed,
            canon_layout_complete: canon_layout.ok,
        },
        registration,
        lifecycle_guard,
        canon_layout,
    }
}

/// Fixed exit-code mapping so calling automation can branch without
/// parsing text.
pub fn exit_code(report: &GateReport) -> i32 {
    if !report.registration.ok {
        return 1;
    }
    if !report.lifecycle_guard.allowed {
        return 2;
    }
    if !report.canon_layout.ok {
        return 3;
    }
    0
}

/// Write the Markdown rendering of `report` to a timestamped path under
/// the reports directory, returning the path.
pub fn write_report(layout: &WorkspaceLayout, report: &GateReport) -> io::Result<PathBuf> {
    let dir = layout.reports_dir();
    fs::create_dir_all(&dir)?;
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("completeness_{stamp}.md"));
    fs::write(&path, render_markdown(report))?;
    Ok(path)
}

/// Relative report path for display, when the report lives inside the
/// workspace.
pub fn report_rel(layout: &WorkspaceLayout, path: &Path) -> String {
    layout
        .rel_unix(path)
        .unwrap_or_else(|| path.display().to_string())
}
