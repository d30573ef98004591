use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// App metadata
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "d_name")]
    pub name: String,
    #[serde(default = "d_version")]
    pub version: String,
    /// Upper bound on the recent-documents list kept by the popup.
    #[serde(default = "d_max_recent_items")]
    pub max_recent_items: usize,
    /// Title given to a newly created account plan.
    #[serde(default = "d_default_document_title")]
    pub default_document_title: String,
    /// Sections of a new account plan, in sheet order.
    #[serde(default = "d_template_sections")]
    pub template_sections: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: d_name(),
            version: d_version(),
            max_recent_items: d_max_recent_items(),
            default_document_title: d_default_document_title(),
            template_sections: d_template_sections(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_name() -> String {
    "Account Planner".into()
}
fn d_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn d_max_recent_items() -> usize {
    10
}
fn d_default_document_title() -> String {
    "Account Plan".into()
}
fn d_template_sections() -> Vec<String> {
    [
        "Account Overview",
        "Key Stakeholders",
        "Business Objectives",
        "Opportunities",
        "Competitive Landscape",
        "Action Plan",
        "Success Metrics",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
