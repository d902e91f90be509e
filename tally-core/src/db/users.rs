use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::convert::{now, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::models::{CreateUserInput, Role, User};

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: uuid(row, "id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: Role::from_str(&role).unwrap_or(Role::Member),
        created_at: timestamp(row, "created_at")?,
    })
}

impl Database {
    pub fn find_user_by_email(&self, email: &str) -> CrmResult<Option<User>> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    "SELECT id, name, email, password_hash, role, created_at
                     FROM users WHERE email = ?1",
                    [email.trim()],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    pub fn create_user(&self, input: CreateUserInput) -> CrmResult<User> {
        let email = input.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(CrmError::validation("a valid email is required"));
        }
        if input.name.trim().is_empty() {
            return Err(CrmError::validation("name is required"));
        }
        if self.find_user_by_email(&email)?.is_some() {
            return Err(CrmError::Validation(format!("user '{}' already exists", email)));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            email,
            password_hash: input.password_hash,
            role: input.role,
            created_at: now(),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    ts(&user.created_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(user)
    }
}
