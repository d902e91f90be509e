use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    /// Only meaningful for `type = task`.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Call,
    Email,
    Whatsapp,
    Meeting,
    Note,
    Task,
    Other,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
            Self::Meeting => "meeting",
            Self::Note => "note",
            Self::Task => "task",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "call" => Some(Self::Call),
            "email" => Some(Self::Email),
            "whatsapp" => Some(Self::Whatsapp),
            "meeting" => Some(Self::Meeting),
            "note" => Some(Self::Note),
            "task" => Some(Self::Task),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub contact_name: Option<String>,
    pub deal_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateActivityInput {
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteActivityInput {
    pub completed: bool,
}
