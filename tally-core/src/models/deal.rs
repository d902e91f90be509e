use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: Uuid,
    pub contact_id: Option<Uuid>,
    pub stage_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub value: Decimal,
    pub notes: Option<String>,
    pub expected_close: Option<NaiveDate>,
    pub plan_type: PlanType,
    pub lead_source: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    #[default]
    Managed,
    SelfService,
    Custom,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Managed => "managed",
            Self::SelfService => "self_service",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "managed" => Some(Self::Managed),
            "self_service" => Some(Self::SelfService),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A deal joined with the display fields of its contact, stage and product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealView {
    #[serde(flatten)]
    pub deal: Deal,
    pub contact_name: Option<String>,
    pub contact_company: Option<String>,
    pub stage_name: Option<String>,
    pub stage_display_name: Option<String>,
    pub stage_color: Option<String>,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDealInput {
    pub name: Option<String>,
    pub contact_id: Option<Uuid>,
    pub stage_id: Option<Uuid>,
    /// Alternative to `stage_id`: the stage's internal key.
    pub stage_name: Option<String>,
    pub value: Option<Decimal>,
    pub product_id: Option<Uuid>,
    pub notes: Option<String>,
    pub expected_close: Option<NaiveDate>,
    pub plan_type: Option<PlanType>,
    pub lead_source: Option<String>,
}

/// Full replacement of a deal's editable fields. Omitted optional fields are
/// cleared; an omitted `stage_id` keeps the current stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDealInput {
    pub name: Option<String>,
    pub contact_id: Option<Uuid>,
    pub stage_id: Option<Uuid>,
    pub value: Option<Decimal>,
    pub product_id: Option<Uuid>,
    pub notes: Option<String>,
    pub expected_close: Option<NaiveDate>,
    pub plan_type: Option<PlanType>,
    pub lead_source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTransitionInput {
    pub stage_name: Option<String>,
    pub stage_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealFilter {
    /// Stage internal key.
    pub stage: Option<String>,
    pub contact_id: Option<Uuid>,
}
