use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub period: GoalPeriod,
    pub target_value: Decimal,
    pub current_value: Decimal,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Progress towards the target as a whole percentage, capped at 100.
    pub fn progress_pct(&self) -> Decimal {
        if self.target_value <= Decimal::ZERO || self.current_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        // A ratio too large to represent is far past the cap.
        self.current_value
            .checked_div(self.target_value)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |pct| pct.round_dp(0).min(Decimal::ONE_HUNDRED))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl GoalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress_pct: Decimal,
}

impl From<Goal> for GoalView {
    fn from(goal: Goal) -> Self {
        let progress_pct = goal.progress_pct();
        Self { goal, progress_pct }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGoalInput {
    pub title: Option<String>,
    pub period: Option<GoalPeriod>,
    pub target_value: Option<Decimal>,
    pub current_value: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgressInput {
    pub current_value: Decimal,
}
