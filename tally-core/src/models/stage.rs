use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named bucket in the sales pipeline. Stages are reference data and are
/// totally ordered by `position`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineStage {
    pub id: Uuid,
    /// Internal key, e.g. `lead` or `onboarding`.
    pub name: String,
    pub display_name: String,
    pub color: String,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStageInput {
    pub name: String,
    pub display_name: String,
    pub color: String,
    pub position: i64,
}

impl CreateStageInput {
    pub fn new(name: &str, display_name: &str, color: &str, position: i64) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            color: color.to_string(),
            position,
        }
    }
}

/// The stage set installed on a fresh database.
pub fn default_stages() -> Vec<CreateStageInput> {
    vec![
        CreateStageInput::new("lead", "Lead", "#94a3b8", 1),
        CreateStageInput::new("contacted", "Contacted", "#60a5fa", 2),
        CreateStageInput::new("proposal", "Proposal Sent", "#a78bfa", 3),
        CreateStageInput::new("negotiation", "Negotiation", "#f59e0b", 4),
        CreateStageInput::new("onboarding", "Onboarding", "#34d399", 5),
        CreateStageInput::new("active", "Active Client", "#10b981", 6),
        CreateStageInput::new("renewal", "Renewal", "#14b8a6", 7),
        CreateStageInput::new("archive", "Archive", "#6b7280", 8),
    ]
}
