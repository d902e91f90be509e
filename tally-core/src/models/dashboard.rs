use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ActivityView;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_contacts: i64,
    pub open_deals: i64,
    pub open_pipeline_value: Decimal,
    pub closed_this_month: ClosedTotals,
    pub overdue_follow_ups: i64,
    pub follow_ups_due_today: i64,
    pub tasks_today: TaskProgress,
    pub recent_activities: Vec<ActivityView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClosedTotals {
    pub count: i64,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskProgress {
    pub done: i64,
    pub total: i64,
}
