use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::{now, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{Contact, ContactInput};

const CONTACT_COLUMNS: &str =
    "id, name, company, email, phone, source, notes, created_at, updated_at";

fn contact_from_row(row: &Row) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: uuid(row, "id")?,
        name: row.get("name")?,
        company: row.get("company")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        source: row.get("source")?,
        notes: row.get("notes")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

fn fetch_contact(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Contact>> {
    conn.query_row(
        &format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS),
        [id.to_string()],
        contact_from_row,
    )
    .optional()
}

fn contact_name(input: &ContactInput) -> CrmResult<String> {
    match input.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(CrmError::validation("name is required")),
    }
}

impl Database {
    /// Contacts ordered by name. `search` matches name, company or email,
    /// ignoring ASCII case.
    pub fn list_contacts(&self, search: Option<&str>) -> CrmResult<Vec<Contact>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM contacts
                 WHERE (?1 IS NULL OR name LIKE ?1 OR company LIKE ?1 OR email LIKE ?1)
                 ORDER BY name COLLATE NOCASE ASC",
                CONTACT_COLUMNS
            ))?;
            let contacts = stmt
                .query_map([pattern], contact_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(contacts)
        })
    }

    pub fn get_contact(&self, id: Uuid) -> CrmResult<Option<Contact>> {
        self.with_conn(|conn| Ok(fetch_contact(conn, id)?))
    }

    pub fn create_contact(&self, input: ContactInput) -> CrmResult<Contact> {
        let name = contact_name(&input)?;
        let now = now();
        let contact = Contact {
            id: Uuid::new_v4(),
            name,
            company: input.company,
            email: input.email,
            phone: input.phone,
            source: input.source,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, name, company, email, phone, source, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    contact.id.to_string(),
                    contact.name,
                    contact.company,
                    contact.email,
                    contact.phone,
                    contact.source,
                    contact.notes,
                    ts(&contact.created_at),
                    ts(&contact.updated_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(contact)
    }

    pub fn update_contact(&self, id: Uuid, input: ContactInput) -> CrmResult<Option<Contact>> {
        let name = contact_name(&input)?;
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE contacts SET name = ?1, company = ?2, email = ?3, phone = ?4,
                    source = ?5, notes = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    name,
                    input.company,
                    input.email,
                    input.phone,
                    input.source,
                    input.notes,
                    ts(&now()),
                    id.to_string(),
                ],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            Ok(fetch_contact(conn, id)?)
        })
    }

    /// Deals keep existing with their contact cleared.
    pub fn delete_contact(&self, id: Uuid) -> CrmResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM contacts WHERE id = ?1", [id.to_string()])?;
            Ok(deleted > 0)
        })
    }
}
