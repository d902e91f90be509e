use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::{date, naive_date, now, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{CreateDailyTaskInput, DailyFocus, DailyTask};

fn task_from_row(row: &Row) -> rusqlite::Result<DailyTask> {
    Ok(DailyTask {
        id: uuid(row, "id")?,
        task_date: naive_date(row, "task_date")?,
        title: row.get("title")?,
        completed: row.get("completed")?,
        created_at: timestamp(row, "created_at")?,
    })
}

fn fetch_task(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<DailyTask>> {
    conn.query_row(
        "SELECT id, task_date, title, completed, created_at FROM daily_tasks WHERE id = ?1",
        [id.to_string()],
        task_from_row,
    )
    .optional()
}

impl Database {
    pub fn list_daily_tasks(&self, day: NaiveDate) -> CrmResult<Vec<DailyTask>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_date, title, completed, created_at FROM daily_tasks
                 WHERE task_date = ?1 ORDER BY created_at ASC",
            )?;
            let tasks = stmt
                .query_map([date(&day)], task_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    pub fn create_daily_task(&self, input: CreateDailyTaskInput, today: NaiveDate) -> CrmResult<DailyTask> {
        let title = match input.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => return Err(CrmError::validation("title is required")),
        };
        let task = DailyTask {
            id: Uuid::new_v4(),
            task_date: input.task_date.unwrap_or(today),
            title,
            completed: false,
            created_at: now(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO daily_tasks (id, task_date, title, completed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    task.id.to_string(),
                    date(&task.task_date),
                    task.title,
                    task.completed,
                    ts(&task.created_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(task)
    }

    /// Flips `completed` in a single statement.
    pub fn toggle_daily_task(&self, id: Uuid) -> CrmResult<DailyTask> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE daily_tasks SET completed = NOT completed WHERE id = ?1",
                [id.to_string()],
            )?;
            if updated == 0 {
                return Err(CrmError::not_found("task"));
            }
            fetch_task(conn, id)?.ok_or_else(|| CrmError::not_found("task"))
        })
    }

    pub fn delete_daily_task(&self, id: Uuid) -> CrmResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM daily_tasks WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    pub fn get_daily_focus(&self, day: NaiveDate) -> CrmResult<Option<DailyFocus>> {
        self.with_conn(|conn| {
            let focus = conn
                .query_row(
                    "SELECT focus_date, focus, updated_at FROM daily_focus WHERE focus_date = ?1",
                    [date(&day)],
                    |row| {
                        Ok(DailyFocus {
                            focus_date: naive_date(row, "focus_date")?,
                            focus: row.get("focus")?,
                            updated_at: timestamp(row, "updated_at")?,
                        })
                    },
                )
                .optional()?;
            Ok(focus)
        })
    }

    /// One focus per day; writing again replaces it.
    pub fn set_daily_focus(&self, day: NaiveDate, focus: &str) -> CrmResult<DailyFocus> {
        let focus = DailyFocus {
            focus_date: day,
            focus: focus.trim().to_string(),
            updated_at: now(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO daily_focus (focus_date, focus, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(focus_date) DO UPDATE SET focus = excluded.focus, updated_at = excluded.updated_at",
                params![date(&focus.focus_date), focus.focus, ts(&focus.updated_at)],
            )?;
            Ok(())
        })?;
        Ok(focus)
    }
}
