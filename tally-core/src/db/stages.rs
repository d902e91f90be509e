use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::uuid;
use super::Database;
use crate::error::CrmResult;
use crate::models::{CreateStageInput, PipelineStage};

const STAGE_COLUMNS: &str = "id, name, display_name, color, position";

fn stage_from_row(row: &Row) -> rusqlite::Result<PipelineStage> {
    Ok(PipelineStage {
        id: uuid(row, "id")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
        color: row.get("color")?,
        position: row.get("position")?,
    })
}

pub(crate) fn fetch_stage(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<PipelineStage>> {
    conn.query_row(
        &format!("SELECT {} FROM pipeline_stages WHERE id = ?1", STAGE_COLUMNS),
        [id.to_string()],
        stage_from_row,
    )
    .optional()
}

impl Database {
    pub fn list_stages(&self) -> CrmResult<Vec<PipelineStage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM pipeline_stages ORDER BY position ASC",
                STAGE_COLUMNS
            ))?;
            let stages = stmt
                .query_map([], stage_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(stages)
        })
    }

    pub fn get_stage(&self, id: Uuid) -> CrmResult<Option<PipelineStage>> {
        self.with_conn(|conn| Ok(fetch_stage(conn, id)?))
    }

    pub fn get_stage_by_name(&self, name: &str) -> CrmResult<Option<PipelineStage>> {
        self.with_conn(|conn| {
            let stage = conn
                .query_row(
                    &format!("SELECT {} FROM pipeline_stages WHERE name = ?1", STAGE_COLUMNS),
                    [name],
                    stage_from_row,
                )
                .optional()?;
            Ok(stage)
        })
    }

    /// The stage with the lowest position, where new deals land by default.
    pub fn first_stage(&self) -> CrmResult<Option<PipelineStage>> {
        self.with_conn(|conn| {
            let stage = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM pipeline_stages ORDER BY position ASC LIMIT 1",
                        STAGE_COLUMNS
                    ),
                    [],
                    stage_from_row,
                )
                .optional()?;
            Ok(stage)
        })
    }

    pub fn create_stage(&self, input: CreateStageInput) -> CrmResult<PipelineStage> {
        let stage = PipelineStage {
            id: Uuid::new_v4(),
            name: input.name,
            display_name: input.display_name,
            color: input.color,
            position: input.position,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pipeline_stages (id, name, display_name, color, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    stage.id.to_string(),
                    stage.name,
                    stage.display_name,
                    stage.color,
                    stage.position
                ],
            )?;
            Ok(())
        })?;
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;

    #[test]
    fn stages_are_listed_by_position() {
        let db = test_support::db();
        test_support::stage(&db, "won", 3);
        test_support::stage(&db, "lead", 1);
        test_support::stage(&db, "demo", 2);

        let names: Vec<String> = db.list_stages().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["lead", "demo", "won"]);
        assert_eq!(db.first_stage().unwrap().unwrap().name, "lead");
    }

    #[test]
    fn lookup_by_name_and_id() {
        let db = test_support::seeded();
        let proposal = db.get_stage_by_name("proposal").unwrap().unwrap();
        assert_eq!(proposal.display_name, "Proposal Sent");
        assert_eq!(db.get_stage(proposal.id).unwrap(), Some(proposal));
        assert!(db.get_stage_by_name("won").unwrap().is_none());
    }

    #[test]
    fn positions_are_unique() {
        let db = test_support::db();
        test_support::stage(&db, "lead", 1);
        let dup = db.create_stage(crate::models::CreateStageInput::new("other", "Other", "#fff", 1));
        assert!(dup.is_err());
    }
}
