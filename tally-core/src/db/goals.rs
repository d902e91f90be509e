use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::convert::{date, decimal, now, opt_date, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{CreateGoalInput, Goal, GoalPeriod};
use crate::money::checked_amount;

const GOAL_COLUMNS: &str =
    "id, title, period, target_value, current_value, due_date, created_at, updated_at";

fn goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    let period: String = row.get("period")?;
    Ok(Goal {
        id: uuid(row, "id")?,
        title: row.get("title")?,
        period: GoalPeriod::from_str(&period).unwrap_or_default(),
        target_value: decimal(row, "target_value")?,
        current_value: decimal(row, "current_value")?,
        due_date: opt_date(row, "due_date")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

fn fetch_goal(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Goal>> {
    conn.query_row(
        &format!("SELECT {} FROM goals WHERE id = ?1", GOAL_COLUMNS),
        [id.to_string()],
        goal_from_row,
    )
    .optional()
}

impl Database {
    pub fn list_goals(&self) -> CrmResult<Vec<Goal>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM goals ORDER BY due_date IS NULL, due_date ASC, created_at ASC",
                GOAL_COLUMNS
            ))?;
            let goals = stmt
                .query_map([], goal_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(goals)
        })
    }

    pub fn create_goal(&self, input: CreateGoalInput) -> CrmResult<Goal> {
        let title = match input.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => return Err(CrmError::validation("title is required")),
        };
        let target_value = input
            .target_value
            .filter(|v| *v > Decimal::ZERO)
            .ok_or_else(|| CrmError::validation("target_value must be greater than zero"))?;
        let target_value = checked_amount(target_value, "target_value")?;
        let current_value = checked_amount(
            input.current_value.unwrap_or(Decimal::ZERO),
            "current_value",
        )?;
        let now = now();
        let goal = Goal {
            id: Uuid::new_v4(),
            title,
            period: input.period.unwrap_or_default(),
            target_value,
            current_value,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO goals (id, title, period, target_value, current_value, due_date, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    goal.id.to_string(),
                    goal.title,
                    goal.period.as_str(),
                    goal.target_value.to_string(),
                    goal.current_value.to_string(),
                    goal.due_date.as_ref().map(date),
                    ts(&goal.created_at),
                    ts(&goal.updated_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(goal)
    }

    pub fn set_goal_progress(&self, id: Uuid, current_value: Decimal) -> CrmResult<Goal> {
        let current_value = checked_amount(current_value, "current_value")?;
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE goals SET current_value = ?1, updated_at = ?2 WHERE id = ?3",
                params![current_value.to_string(), ts(&now()), id.to_string()],
            )?;
            if updated == 0 {
                return Err(CrmError::not_found("goal"));
            }
            fetch_goal(conn, id)?.ok_or_else(|| CrmError::not_found("goal"))
        })
    }

    pub fn delete_goal(&self, id: Uuid) -> CrmResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM goals WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}
