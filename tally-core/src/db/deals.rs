use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::convert::{date, decimal, opt_date, opt_ts, opt_uuid, timestamp, ts, uuid};
use super::stages::fetch_stage;
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{Deal, DealFilter, DealView, PlanType};
use crate::policy::ClosedStagePolicy;

const DEAL_COLUMNS: &str = "d.id AS id, d.contact_id AS contact_id, d.stage_id AS stage_id,
    d.product_id AS product_id, d.name AS name, d.value AS value, d.notes AS notes,
    d.expected_close AS expected_close, d.plan_type AS plan_type,
    d.lead_source AS lead_source, d.closed_at AS closed_at,
    d.created_at AS created_at, d.updated_at AS updated_at";

const VIEW_JOINS: &str = "LEFT JOIN contacts c ON c.id = d.contact_id
    LEFT JOIN pipeline_stages s ON s.id = d.stage_id
    LEFT JOIN products p ON p.id = d.product_id";

const VIEW_COLUMNS: &str = "c.name AS contact_name, c.company AS contact_company,
    s.name AS stage_name, s.display_name AS stage_display_name, s.color AS stage_color,
    p.name AS product_name";

/// Editable fields written by a full update. `stage_id: None` keeps whatever
/// stage the deal is in when the update runs.
#[derive(Debug, Clone)]
pub struct DealChanges {
    pub contact_id: Option<Uuid>,
    pub stage_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub value: Decimal,
    pub notes: Option<String>,
    pub expected_close: Option<NaiveDate>,
    pub plan_type: PlanType,
    pub lead_source: Option<String>,
}

pub(crate) fn deal_from_row(row: &Row) -> rusqlite::Result<Deal> {
    let plan_type: String = row.get("plan_type")?;
    Ok(Deal {
        id: uuid(row, "id")?,
        contact_id: opt_uuid(row, "contact_id")?,
        stage_id: uuid(row, "stage_id")?,
        product_id: opt_uuid(row, "product_id")?,
        name: row.get("name")?,
        value: decimal(row, "value")?,
        notes: row.get("notes")?,
        expected_close: opt_date(row, "expected_close")?,
        plan_type: PlanType::from_str(&plan_type).unwrap_or_default(),
        lead_source: row.get("lead_source")?,
        closed_at: opt_ts(row, "closed_at")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

pub(crate) fn deal_view_from_row(row: &Row) -> rusqlite::Result<DealView> {
    Ok(DealView {
        deal: deal_from_row(row)?,
        contact_name: row.get("contact_name")?,
        contact_company: row.get("contact_company")?,
        stage_name: row.get("stage_name")?,
        stage_display_name: row.get("stage_display_name")?,
        stage_color: row.get("stage_color")?,
        product_name: row.get("product_name")?,
    })
}

fn fetch_deal(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Deal>> {
    conn.query_row(
        &format!("SELECT {} FROM deals d WHERE d.id = ?1", DEAL_COLUMNS),
        [id.to_string()],
        deal_from_row,
    )
    .optional()
}

impl Database {
    pub fn insert_deal(&self, deal: &Deal) -> CrmResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO deals (id, contact_id, stage_id, product_id, name, value, notes,
                    expected_close, plan_type, lead_source, closed_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    deal.id.to_string(),
                    deal.contact_id.map(|id| id.to_string()),
                    deal.stage_id.to_string(),
                    deal.product_id.map(|id| id.to_string()),
                    deal.name,
                    deal.value.to_string(),
                    deal.notes,
                    deal.expected_close.as_ref().map(date),
                    deal.plan_type.as_str(),
                    deal.lead_source,
                    deal.closed_at.as_ref().map(ts),
                    ts(&deal.created_at),
                    ts(&deal.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_deal(&self, id: Uuid) -> CrmResult<Option<Deal>> {
        self.with_conn(|conn| Ok(fetch_deal(conn, id)?))
    }

    pub fn get_deal_view(&self, id: Uuid) -> CrmResult<Option<DealView>> {
        self.with_conn(|conn| {
            let deal = conn
                .query_row(
                    &format!(
                        "SELECT {}, {} FROM deals d {} WHERE d.id = ?1",
                        DEAL_COLUMNS, VIEW_COLUMNS, VIEW_JOINS
                    ),
                    [id.to_string()],
                    deal_view_from_row,
                )
                .optional()?;
            Ok(deal)
        })
    }

    /// Deals with display fields, ordered by stage position then newest first.
    pub fn list_deals(&self, filter: &DealFilter) -> CrmResult<Vec<DealView>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, {} FROM deals d {}
                 WHERE (?1 IS NULL OR s.name = ?1)
                   AND (?2 IS NULL OR d.contact_id = ?2)
                 ORDER BY s.position ASC, d.created_at DESC",
                DEAL_COLUMNS, VIEW_COLUMNS, VIEW_JOINS
            ))?;
            let deals = stmt
                .query_map(
                    params![
                        filter.stage.as_deref(),
                        filter.contact_id.map(|id| id.to_string())
                    ],
                    deal_view_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(deals)
        })
    }

    /// Replaces the editable fields. The target stage is resolved and
    /// `closed_at` recomputed under the same lock as the write, so a stage
    /// change landing between the caller's read and this update is kept.
    /// Returns `None` if the deal does not exist.
    pub fn update_deal(
        &self,
        id: Uuid,
        changes: &DealChanges,
        policy: &ClosedStagePolicy,
        now: DateTime<Utc>,
    ) -> CrmResult<Option<Deal>> {
        self.with_conn(|conn| {
            let current: Option<String> = conn
                .query_row(
                    "SELECT stage_id FROM deals WHERE id = ?1",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Ok(None);
            };

            let stage = match changes.stage_id {
                Some(stage_id) => fetch_stage(conn, stage_id)?
                    .ok_or_else(|| CrmError::Validation(format!("unknown stage id '{}'", stage_id)))?,
                None => {
                    let stage_id = Uuid::parse_str(&current)
                        .map_err(|e| CrmError::Store(e.to_string()))?;
                    fetch_stage(conn, stage_id)?.ok_or_else(|| {
                        CrmError::Store(format!("deal {} references missing stage", id))
                    })?
                }
            };
            let stage_closed = policy.is_closed(&stage.name);

            conn.execute(
                "UPDATE deals SET contact_id = ?1, stage_id = ?2, product_id = ?3, name = ?4,
                    value = ?5, notes = ?6, expected_close = ?7, plan_type = ?8,
                    lead_source = ?9,
                    closed_at = CASE WHEN ?10 THEN COALESCE(closed_at, ?11) ELSE NULL END,
                    updated_at = ?11
                 WHERE id = ?12",
                params![
                    changes.contact_id.map(|id| id.to_string()),
                    stage.id.to_string(),
                    changes.product_id.map(|id| id.to_string()),
                    changes.name,
                    changes.value.to_string(),
                    changes.notes,
                    changes.expected_close.as_ref().map(date),
                    changes.plan_type.as_str(),
                    changes.lead_source,
                    stage_closed,
                    ts(&now),
                    id.to_string(),
                ],
            )?;
            Ok(fetch_deal(conn, id)?)
        })
    }

    /// Moves a deal to `stage_id` and recomputes `closed_at` in one statement.
    /// Re-entering a closed stage keeps the original timestamp.
    pub fn set_deal_stage(
        &self,
        id: Uuid,
        stage_id: Uuid,
        stage_closed: bool,
        now: DateTime<Utc>,
    ) -> CrmResult<Option<Deal>> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE deals SET stage_id = ?1,
                    closed_at = CASE WHEN ?2 THEN COALESCE(closed_at, ?3) ELSE NULL END,
                    updated_at = ?3
                 WHERE id = ?4",
                params![stage_id.to_string(), stage_closed, ts(&now), id.to_string()],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(fetch_deal(conn, id)?)
        })
    }

    pub fn delete_deal(&self, id: Uuid) -> CrmResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM deals WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now;
    use crate::db::test_support;

    fn changes(name: &str, stage_id: Option<Uuid>) -> DealChanges {
        DealChanges {
            contact_id: None,
            stage_id,
            product_id: None,
            name: name.to_string(),
            value: Decimal::from(5),
            notes: None,
            expected_close: None,
            plan_type: PlanType::Managed,
            lead_source: None,
        }
    }

    fn insert(db: &Database, stage_id: Uuid) -> Deal {
        let at = now();
        let deal = Deal {
            id: Uuid::new_v4(),
            contact_id: None,
            stage_id,
            product_id: None,
            name: "Acme".to_string(),
            value: Decimal::ZERO,
            notes: None,
            expected_close: None,
            plan_type: PlanType::Managed,
            lead_source: None,
            closed_at: None,
            created_at: at,
            updated_at: at,
        };
        db.insert_deal(&deal).unwrap();
        deal
    }

    #[test]
    fn update_without_stage_uses_the_stage_at_write_time() {
        let db = test_support::seeded();
        let policy = ClosedStagePolicy::default();
        let lead = db.get_stage_by_name("lead").unwrap().unwrap();
        let active = db.get_stage_by_name("active").unwrap().unwrap();
        let deal = insert(&db, lead.id);

        let pending = changes("Acme Corp", None);
        let moved = db.set_deal_stage(deal.id, active.id, true, now()).unwrap().unwrap();
        let updated = db.update_deal(deal.id, &pending, &policy, now()).unwrap().unwrap();

        assert_eq!(updated.stage_id, active.id);
        assert_eq!(updated.closed_at, moved.closed_at);
        assert_eq!(updated.value, Decimal::from(5));
    }

    #[test]
    fn update_with_stage_recomputes_closed_at() {
        let db = test_support::seeded();
        let policy = ClosedStagePolicy::default();
        let lead = db.get_stage_by_name("lead").unwrap().unwrap();
        let renewal = db.get_stage_by_name("renewal").unwrap().unwrap();
        let deal = insert(&db, lead.id);

        let closed = db
            .update_deal(deal.id, &changes("Acme", Some(renewal.id)), &policy, now())
            .unwrap()
            .unwrap();
        assert!(closed.closed_at.is_some());

        let reopened = db
            .update_deal(deal.id, &changes("Acme", Some(lead.id)), &policy, now())
            .unwrap()
            .unwrap();
        assert!(reopened.closed_at.is_none());
    }

    #[test]
    fn update_reports_missing_deal_and_unknown_stage() {
        let db = test_support::seeded();
        let policy = ClosedStagePolicy::default();
        let lead = db.get_stage_by_name("lead").unwrap().unwrap();
        let deal = insert(&db, lead.id);

        let missing = db.update_deal(Uuid::new_v4(), &changes("x", None), &policy, now());
        assert!(matches!(missing, Ok(None)));

        let unknown = db.update_deal(deal.id, &changes("x", Some(Uuid::new_v4())), &policy, now());
        assert!(matches!(unknown, Err(CrmError::Validation(_))));
    }
}
