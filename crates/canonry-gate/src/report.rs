use serde::Serialize;

use canonry_guard::GuardVerdict;
use canonry_registry::RegistrationSummary;

/// The one report object the orchestrator emits: overall verdict,
/// per-subsystem summary, and the detailed check/violation lists.
#[derive(Clone, Debug, Serialize)]
pub struct GateReport {
    pub timestamp_utc: String,
    pub overall_pass: bool,
    pub summary: GateSummary,
    pub registration: RegistrationSection,
    pub lifecycle_guard: GuardSection,
    pub canon_layout: LayoutSection,
}

#[derive(Clone, Debug, Serialize)]
pub struct GateSummary {
    pub registration: String,
    pub lifecycle_guard_allowed: bool,
    pub canon_layout_complete: bool,
}

/// Registration outcome. `ok` is false only for environment/schema
/// failures — per-artifact skips are carried inside the summary and do
/// not fail the subsystem.
#[derive(Clone, Debug, Serialize)]
pub struct RegistrationSection {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RegistrationSummary>,
}

/// Guard outcome. When the battery could not run at all (missing canon
/// file, broken schema) the verdict is absent and `error` explains why;
/// `allowed` is false either way.
#[derive(Clone, Debug, Serialize)]
pub struct GuardSection {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<GuardVerdict>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LayoutSection {
    pub ok: bool,
    pub missing: Vec<String>,
}

impl GateReport {
    pub fn status_word(pass: bool) -> &'static str {
        if pass {
            "pass"
        } else {
            "fail"
        }
    }
}
