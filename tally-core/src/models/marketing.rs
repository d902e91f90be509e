use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketingChannel {
    pub id: Uuid,
    pub name: String,
    pub channel_type: Option<String>,
    pub status: ChannelStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    #[default]
    Active,
    Paused,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Channel with the totals of its logged activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSummary {
    #[serde(flatten)]
    pub channel: MarketingChannel,
    pub total_leads: i64,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInput {
    pub name: Option<String>,
    pub channel_type: Option<String>,
    pub status: Option<ChannelStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelActivity {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub leads_generated: i64,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateChannelActivityInput {
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub leads_generated: Option<i64>,
    pub cost: Option<Decimal>,
}
