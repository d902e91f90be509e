use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUp {
    pub id: Uuid,
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub due_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub follow_up_type: String,
    pub notes: Option<String>,
    pub status: FollowUpStatus,
    pub created_at: DateTime<Utc>,
}

impl FollowUp {
    /// Overdue is never stored; it is derived from status and due date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == FollowUpStatus::Pending && self.due_date < now
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpStatus {
    Pending,
    Done,
    Snoozed,
}

impl FollowUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Snoozed => "snoozed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "snoozed" => Some(Self::Snoozed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowUpView {
    #[serde(flatten)]
    pub follow_up: FollowUp,
    pub overdue: bool,
    pub contact_name: Option<String>,
    pub deal_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFollowUpInput {
    pub deal_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub follow_up_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowUpFilter {
    pub status: Option<FollowUpStatus>,
    #[serde(default)]
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnoozeInput {
    pub due_date: Option<DateTime<Utc>>,
}
