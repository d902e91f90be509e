use chrono::SubsecRound;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::{now, opt_uuid, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{Activity, ActivityFilter, ActivityType, ActivityView, CreateActivityInput};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

const ACTIVITY_SELECT: &str = "SELECT a.id AS id, a.deal_id AS deal_id, a.contact_id AS contact_id,
        a.type AS type, a.description AS description, a.occurred_at AS occurred_at,
        a.completed AS completed, a.created_at AS created_at,
        c.name AS contact_name, d.name AS deal_name
    FROM activities a
    LEFT JOIN contacts c ON c.id = a.contact_id
    LEFT JOIN deals d ON d.id = a.deal_id";

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    let kind: String = row.get("type")?;
    Ok(Activity {
        id: uuid(row, "id")?,
        deal_id: opt_uuid(row, "deal_id")?,
        contact_id: opt_uuid(row, "contact_id")?,
        activity_type: ActivityType::from_str(&kind).unwrap_or(ActivityType::Other),
        description: row.get("description")?,
        occurred_at: timestamp(row, "occurred_at")?,
        completed: row.get("completed")?,
        created_at: timestamp(row, "created_at")?,
    })
}

pub(crate) fn activity_view_from_row(row: &Row) -> rusqlite::Result<ActivityView> {
    Ok(ActivityView {
        activity: activity_from_row(row)?,
        contact_name: row.get("contact_name")?,
        deal_name: row.get("deal_name")?,
    })
}

fn fetch_activity(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Activity>> {
    conn.query_row(
        &format!("{} WHERE a.id = ?1", ACTIVITY_SELECT),
        [id.to_string()],
        activity_from_row,
    )
    .optional()
}

pub(crate) fn recent_activities(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<ActivityView>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY a.occurred_at DESC LIMIT ?1",
        ACTIVITY_SELECT
    ))?;
    let activities = stmt
        .query_map([limit], activity_view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(activities)
}

impl Database {
    /// Newest first, joined with contact and deal names.
    pub fn list_activities(&self, filter: &ActivityFilter) -> CrmResult<Vec<ActivityView>> {
        let kind = match filter.activity_type.as_deref() {
            Some(kind) => Some(
                ActivityType::from_str(kind)
                    .ok_or_else(|| CrmError::Validation(format!("unknown activity type '{}'", kind)))?,
            ),
            None => None,
        };
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE (?1 IS NULL OR a.deal_id = ?1)
                   AND (?2 IS NULL OR a.contact_id = ?2)
                   AND (?3 IS NULL OR a.type = ?3)
                 ORDER BY a.occurred_at DESC
                 LIMIT ?4",
                ACTIVITY_SELECT
            ))?;
            let activities = stmt
                .query_map(
                    params![
                        filter.deal_id.map(|id| id.to_string()),
                        filter.contact_id.map(|id| id.to_string()),
                        kind.map(|k| k.as_str()),
                        limit,
                    ],
                    activity_view_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(activities)
        })
    }

    pub fn create_activity(&self, input: CreateActivityInput) -> CrmResult<Activity> {
        let kind = input
            .activity_type
            .as_deref()
            .ok_or_else(|| CrmError::validation("type is required"))?;
        let activity_type = ActivityType::from_str(kind)
            .ok_or_else(|| CrmError::Validation(format!("unknown activity type '{}'", kind)))?;
        let description = match input.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => return Err(CrmError::validation("description is required")),
        };
        let now = now();
        let activity = Activity {
            id: Uuid::new_v4(),
            deal_id: input.deal_id,
            contact_id: input.contact_id,
            activity_type,
            description,
            occurred_at: input.occurred_at.map(|at| at.trunc_subsecs(6)).unwrap_or(now),
            completed: false,
            created_at: now,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO activities (id, deal_id, contact_id, type, description, occurred_at, completed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    activity.id.to_string(),
                    activity.deal_id.map(|id| id.to_string()),
                    activity.contact_id.map(|id| id.to_string()),
                    activity.activity_type.as_str(),
                    activity.description,
                    ts(&activity.occurred_at),
                    activity.completed,
                    ts(&activity.created_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(activity)
    }

    /// `completed` only applies to tasks; other types are rejected.
    pub fn set_activity_completed(&self, id: Uuid, completed: bool) -> CrmResult<Activity> {
        self.with_conn(|conn| {
            let activity = fetch_activity(conn, id)?.ok_or_else(|| CrmError::not_found("activity"))?;
            if activity.activity_type != ActivityType::Task {
                return Err(CrmError::validation("only task activities can be completed"));
            }
            conn.execute(
                "UPDATE activities SET completed = ?1 WHERE id = ?2",
                params![completed, id.to_string()],
            )?;
            Ok(Activity {
                completed,
                ..activity
            })
        })
    }

    pub fn delete_activity(&self, id: Uuid) -> CrmResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM activities WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }

    pub fn recent_activities(&self, limit: u32) -> CrmResult<Vec<ActivityView>> {
        self.with_conn(|conn| Ok(recent_activities(conn, limit)?))
    }
}
