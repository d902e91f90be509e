use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::activities::recent_activities;
use super::convert::ts;
use super::Database;
use crate::error::CrmResult;
use crate::models::{ClosedTotals, Dashboard, DealFilter, TaskProgress};
use crate::money::add_amount;
use crate::policy::ClosedStagePolicy;

const RECENT_ACTIVITY_COUNT: u32 = 10;

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

impl Database {
    pub fn dashboard(
        &self,
        policy: &ClosedStagePolicy,
        now: DateTime<Utc>,
    ) -> CrmResult<Dashboard> {
        let today = now.date_naive();
        let month_start = start_of_day(today.with_day(1).unwrap_or(today));
        let day_start = start_of_day(today);
        let day_end = start_of_day(today.checked_add_days(Days::new(1)).unwrap_or(today));

        let mut open_deals = 0;
        let mut open_pipeline_value = Decimal::ZERO;
        let mut closed_this_month = ClosedTotals::default();
        for view in self.list_deals(&DealFilter::default())? {
            let stage = view.stage_name.as_deref().unwrap_or_default();
            let flags = policy.flags(stage);
            if !flags.closed {
                open_deals += 1;
                if !flags.excluded_from_totals {
                    open_pipeline_value = add_amount(open_pipeline_value, view.deal.value)?;
                }
            } else if view.deal.closed_at.is_some_and(|at| at >= month_start) {
                closed_this_month.count += 1;
                closed_this_month.value = add_amount(closed_this_month.value, view.deal.value)?;
            }
        }

        self.with_conn(|conn| {
            let total_contacts: i64 =
                conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
            let overdue_follow_ups: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follow_ups WHERE status = 'pending' AND due_date < ?1",
                [ts(&now)],
                |row| row.get(0),
            )?;
            let follow_ups_due_today: i64 = conn.query_row(
                "SELECT COUNT(*) FROM follow_ups
                 WHERE status != 'done' AND due_date >= ?1 AND due_date < ?2",
                [ts(&day_start), ts(&day_end)],
                |row| row.get(0),
            )?;
            let (done, total): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(completed), 0), COUNT(*) FROM daily_tasks WHERE task_date = ?1",
                [today.format("%Y-%m-%d").to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(Dashboard {
                total_contacts,
                open_deals,
                open_pipeline_value,
                closed_this_month,
                overdue_follow_ups,
                follow_ups_due_today,
                tasks_today: TaskProgress { done, total },
                recent_activities: recent_activities(conn, RECENT_ACTIVITY_COUNT)?,
            })
        })
    }
}
