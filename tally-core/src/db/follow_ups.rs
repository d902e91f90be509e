use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::{now, opt_uuid, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{CreateFollowUpInput, FollowUp, FollowUpFilter, FollowUpStatus, FollowUpView};

const FOLLOW_UP_SELECT: &str = "SELECT f.id AS id, f.deal_id AS deal_id, f.contact_id AS contact_id,
        f.due_date AS due_date, f.type AS type, f.notes AS notes, f.status AS status,
        f.created_at AS created_at, c.name AS contact_name, d.name AS deal_name
    FROM follow_ups f
    LEFT JOIN contacts c ON c.id = f.contact_id
    LEFT JOIN deals d ON d.id = f.deal_id";

fn follow_up_from_row(row: &Row) -> rusqlite::Result<FollowUp> {
    let status: String = row.get("status")?;
    Ok(FollowUp {
        id: uuid(row, "id")?,
        deal_id: opt_uuid(row, "deal_id")?,
        contact_id: opt_uuid(row, "contact_id")?,
        due_date: timestamp(row, "due_date")?,
        follow_up_type: row.get("type")?,
        notes: row.get("notes")?,
        status: FollowUpStatus::from_str(&status).unwrap_or(FollowUpStatus::Pending),
        created_at: timestamp(row, "created_at")?,
    })
}

fn fetch_follow_up(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<FollowUp>> {
    conn.query_row(
        &format!("{} WHERE f.id = ?1", FOLLOW_UP_SELECT),
        [id.to_string()],
        follow_up_from_row,
    )
    .optional()
}

impl Database {
    /// Ordered by due date. `overdue` is evaluated against `now`.
    pub fn list_follow_ups(
        &self,
        filter: &FollowUpFilter,
        now: DateTime<Utc>,
    ) -> CrmResult<Vec<FollowUpView>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE (?1 IS NULL OR f.status = ?1)
                   AND (?2 = 0 OR (f.status = 'pending' AND f.due_date < ?3))
                 ORDER BY f.due_date ASC",
                FOLLOW_UP_SELECT
            ))?;
            let follow_ups = stmt
                .query_map(
                    params![filter.status.map(|s| s.as_str()), filter.overdue, ts(&now)],
                    |row| {
                        let follow_up = follow_up_from_row(row)?;
                        Ok(FollowUpView {
                            overdue: follow_up.is_overdue(now),
                            follow_up,
                            contact_name: row.get("contact_name")?,
                            deal_name: row.get("deal_name")?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(follow_ups)
        })
    }

    pub fn create_follow_up(&self, input: CreateFollowUpInput) -> CrmResult<FollowUp> {
        let due_date = input
            .due_date
            .ok_or_else(|| CrmError::validation("due_date is required"))?;
        let follow_up = FollowUp {
            id: Uuid::new_v4(),
            deal_id: input.deal_id,
            contact_id: input.contact_id,
            due_date,
            follow_up_type: input
                .follow_up_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "call".to_string()),
            notes: input.notes,
            status: FollowUpStatus::Pending,
            created_at: now(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follow_ups (id, deal_id, contact_id, due_date, type, notes, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    follow_up.id.to_string(),
                    follow_up.deal_id.map(|id| id.to_string()),
                    follow_up.contact_id.map(|id| id.to_string()),
                    ts(&follow_up.due_date),
                    follow_up.follow_up_type,
                    follow_up.notes,
                    follow_up.status.as_str(),
                    ts(&follow_up.created_at),
                ],
            )?;
            Ok(())
        })?;
        // Round-trip through storage precision.
        self.with_conn(|conn| {
            fetch_follow_up(conn, follow_up.id)?.ok_or_else(|| CrmError::not_found("follow-up"))
        })
    }

    pub fn complete_follow_up(&self, id: Uuid) -> CrmResult<FollowUp> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE follow_ups SET status = 'done' WHERE id = ?1",
                [id.to_string()],
            )?;
            if updated == 0 {
                return Err(CrmError::not_found("follow-up"));
            }
            fetch_follow_up(conn, id)?.ok_or_else(|| CrmError::not_found("follow-up"))
        })
    }

    /// Pushes the due date out. Done follow-ups stay done.
    pub fn snooze_follow_up(&self, id: Uuid, due_date: DateTime<Utc>) -> CrmResult<FollowUp> {
        self.with_conn(|conn| {
            let current =
                fetch_follow_up(conn, id)?.ok_or_else(|| CrmError::not_found("follow-up"))?;
            if current.status == FollowUpStatus::Done {
                return Err(CrmError::validation("a completed follow-up cannot be snoozed"));
            }
            conn.execute(
                "UPDATE follow_ups SET status = 'snoozed', due_date = ?1 WHERE id = ?2",
                params![ts(&due_date), id.to_string()],
            )?;
            fetch_follow_up(conn, id)?.ok_or_else(|| CrmError::not_found("follow-up"))
        })
    }

    pub fn delete_follow_up(&self, id: Uuid) -> CrmResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM follow_ups WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use crate::error::CrmError;
    use crate::models::{CreateFollowUpInput, FollowUpFilter, FollowUpStatus};
    use chrono::{Duration, Utc};

    fn due(offset: Duration) -> CreateFollowUpInput {
        CreateFollowUpInput {
            due_date: Some(Utc::now() + offset),
            ..Default::default()
        }
    }

    #[test]
    fn overdue_is_derived_at_read_time() {
        let db = test_support::db();
        let late = db.create_follow_up(due(-Duration::days(1))).unwrap();
        db.create_follow_up(due(Duration::days(1))).unwrap();

        let now = Utc::now();
        let all = db.list_follow_ups(&FollowUpFilter::default(), now).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].overdue);
        assert!(!all[1].overdue);

        let overdue = db
            .list_follow_ups(
                &FollowUpFilter {
                    status: None,
                    overdue: true,
                },
                now,
            )
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].follow_up.id, late.id);

        db.complete_follow_up(late.id).unwrap();
        let overdue_after = db
            .list_follow_ups(
                &FollowUpFilter {
                    status: None,
                    overdue: true,
                },
                now,
            )
            .unwrap();
        assert!(overdue_after.is_empty());
    }

    #[test]
    fn due_date_is_required_and_type_defaults() {
        let db = test_support::db();
        assert!(matches!(
            db.create_follow_up(CreateFollowUpInput::default()),
            Err(CrmError::Validation(_))
        ));
        let follow_up = db.create_follow_up(due(Duration::hours(3))).unwrap();
        assert_eq!(follow_up.follow_up_type, "call");
        assert_eq!(follow_up.status, FollowUpStatus::Pending);
    }

    #[test]
    fn snooze_moves_due_date_but_not_for_done() {
        let db = test_support::db();
        let follow_up = db.create_follow_up(due(-Duration::hours(1))).unwrap();
        let later = Utc::now() + Duration::days(2);

        let snoozed = db.snooze_follow_up(follow_up.id, later).unwrap();
        assert_eq!(snoozed.status, FollowUpStatus::Snoozed);
        assert!(snoozed.due_date > Utc::now());

        let snoozed_list = db
            .list_follow_ups(
                &FollowUpFilter {
                    status: Some(FollowUpStatus::Snoozed),
                    overdue: false,
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(snoozed_list.len(), 1);

        db.complete_follow_up(follow_up.id).unwrap();
        assert!(matches!(
            db.snooze_follow_up(follow_up.id, later),
            Err(CrmError::Validation(_))
        ));
    }

    #[test]
    fn missing_follow_ups_are_not_found() {
        let db = test_support::db();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(db.complete_follow_up(id), Err(CrmError::NotFound(_))));
        assert!(!db.delete_follow_up(id).unwrap());
    }
}
