use std::collections::HashMap;

use chrono::SubsecRound;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::convert::{decimal, now, timestamp, ts, uuid};
use super::Database;
use crate::error::{CrmError, CrmResult};
use crate::money::{add_amount, checked_amount};
use crate::models::{
    ChannelActivity, ChannelInput, ChannelStatus, ChannelSummary, CreateChannelActivityInput,
    MarketingChannel,
};

const CHANNEL_COLUMNS: &str = "id, name, channel_type, status, notes, created_at, updated_at";

fn channel_from_row(row: &Row) -> rusqlite::Result<MarketingChannel> {
    let status: String = row.get("status")?;
    Ok(MarketingChannel {
        id: uuid(row, "id")?,
        name: row.get("name")?,
        channel_type: row.get("channel_type")?,
        status: ChannelStatus::from_str(&status).unwrap_or_default(),
        notes: row.get("notes")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

fn channel_activity_from_row(row: &Row) -> rusqlite::Result<ChannelActivity> {
    Ok(ChannelActivity {
        id: uuid(row, "id")?,
        channel_id: uuid(row, "channel_id")?,
        description: row.get("description")?,
        occurred_at: timestamp(row, "occurred_at")?,
        leads_generated: row.get("leads_generated")?,
        cost: decimal(row, "cost")?,
    })
}

fn fetch_channel(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<MarketingChannel>> {
    conn.query_row(
        &format!("SELECT {} FROM marketing_channels WHERE id = ?1", CHANNEL_COLUMNS),
        [id.to_string()],
        channel_from_row,
    )
    .optional()
}

fn channel_name(input: &ChannelInput) -> CrmResult<String> {
    match input.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(CrmError::validation("name is required")),
    }
}

impl Database {
    /// Channels with lead and cost totals. Costs are summed as decimals in
    /// process rather than by SQLite, which would go through floats.
    pub fn list_channels(&self) -> CrmResult<Vec<ChannelSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM marketing_channels ORDER BY name COLLATE NOCASE ASC",
                CHANNEL_COLUMNS
            ))?;
            let channels = stmt
                .query_map([], channel_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            let mut totals: HashMap<Uuid, (i64, Decimal)> = HashMap::new();
            let mut stmt = conn.prepare("SELECT channel_id, leads_generated, cost FROM channel_activities")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    uuid(row, "channel_id")?,
                    row.get::<_, i64>("leads_generated")?,
                    decimal(row, "cost")?,
                ))
            })?;
            for row in rows {
                let (channel_id, leads, cost) = row?;
                let entry = totals.entry(channel_id).or_default();
                entry.0 = entry.0.checked_add(leads).ok_or_else(|| {
                    CrmError::Store("lead total is out of range".to_string())
                })?;
                entry.1 = add_amount(entry.1, cost)?;
            }

            Ok(channels
                .into_iter()
                .map(|channel| {
                    let (total_leads, total_cost) =
                        totals.get(&channel.id).copied().unwrap_or_default();
                    ChannelSummary {
                        channel,
                        total_leads,
                        total_cost,
                    }
                })
                .collect())
        })
    }

    pub fn create_channel(&self, input: ChannelInput) -> CrmResult<MarketingChannel> {
        let name = channel_name(&input)?;
        let now = now();
        let channel = MarketingChannel {
            id: Uuid::new_v4(),
            name,
            channel_type: input.channel_type,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO marketing_channels (id, name, channel_type, status, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    channel.id.to_string(),
                    channel.name,
                    channel.channel_type,
                    channel.status.as_str(),
                    channel.notes,
                    ts(&channel.created_at),
                    ts(&channel.updated_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(channel)
    }

    pub fn update_channel(&self, id: Uuid, input: ChannelInput) -> CrmResult<MarketingChannel> {
        let name = channel_name(&input)?;
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE marketing_channels SET name = ?1, channel_type = ?2, status = ?3,
                    notes = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    name,
                    input.channel_type,
                    input.status.unwrap_or_default().as_str(),
                    input.notes,
                    ts(&now()),
                    id.to_string(),
                ],
            )?;
            if updated == 0 {
                return Err(CrmError::not_found("channel"));
            }
            fetch_channel(conn, id)?.ok_or_else(|| CrmError::not_found("channel"))
        })
    }

    pub fn list_channel_activities(&self, channel_id: Uuid) -> CrmResult<Vec<ChannelActivity>> {
        self.with_conn(|conn| {
            if fetch_channel(conn, channel_id)?.is_none() {
                return Err(CrmError::not_found("channel"));
            }
            let mut stmt = conn.prepare(
                "SELECT id, channel_id, description, occurred_at, leads_generated, cost
                 FROM channel_activities WHERE channel_id = ?1 ORDER BY occurred_at DESC",
            )?;
            let activities = stmt
                .query_map([channel_id.to_string()], channel_activity_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(activities)
        })
    }

    pub fn create_channel_activity(
        &self,
        channel_id: Uuid,
        input: CreateChannelActivityInput,
    ) -> CrmResult<ChannelActivity> {
        let description = match input.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => return Err(CrmError::validation("description is required")),
        };
        let leads_generated = input.leads_generated.unwrap_or(0);
        if leads_generated < 0 {
            return Err(CrmError::validation("leads_generated must not be negative"));
        }
        let cost = checked_amount(input.cost.unwrap_or(Decimal::ZERO), "cost")?;
        let activity = ChannelActivity {
            id: Uuid::new_v4(),
            channel_id,
            description,
            occurred_at: input
                .occurred_at
                .map(|at| at.trunc_subsecs(6))
                .unwrap_or_else(now),
            leads_generated,
            cost,
        };
        self.with_conn(|conn| {
            if fetch_channel(conn, channel_id)?.is_none() {
                return Err(CrmError::not_found("channel"));
            }
            conn.execute(
                "INSERT INTO channel_activities (id, channel_id, description, occurred_at, leads_generated, cost)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    activity.id.to_string(),
                    activity.channel_id.to_string(),
                    activity.description,
                    ts(&activity.occurred_at),
                    activity.leads_generated,
                    activity.cost.to_string(),
                ],
            )?;
            Ok(())
        })?;
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use crate::error::CrmError;
    use crate::models::{ChannelInput, ChannelStatus, CreateChannelActivityInput};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn channel(name: &str) -> ChannelInput {
        ChannelInput {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn spend(leads: i64, cost: &str) -> CreateChannelActivityInput {
        CreateChannelActivityInput {
            description: Some("campaign".into()),
            leads_generated: Some(leads),
            cost: Some(Decimal::from_str(cost).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn channel_totals_are_exact() {
        let db = test_support::db();
        let ads = db.create_channel(channel("Google Ads")).unwrap();
        let seo = db.create_channel(channel("SEO")).unwrap();
        db.create_channel_activity(ads.id, spend(3, "10.10")).unwrap();
        db.create_channel_activity(ads.id, spend(2, "20.20")).unwrap();

        let channels = db.list_channels().unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].channel.id, ads.id);
        assert_eq!(channels[0].total_leads, 5);
        assert_eq!(channels[0].total_cost, Decimal::from_str("30.30").unwrap());
        assert_eq!(channels[1].channel.id, seo.id);
        assert_eq!(channels[1].total_cost, Decimal::ZERO);

        assert_eq!(db.list_channel_activities(ads.id).unwrap().len(), 2);
    }

    #[test]
    fn update_and_missing_channel() {
        let db = test_support::db();
        let ads = db.create_channel(channel("Ads")).unwrap();
        let paused = db
            .update_channel(
                ads.id,
                ChannelInput {
                    status: Some(ChannelStatus::Paused),
                    ..channel("Paid ads")
                },
            )
            .unwrap();
        assert_eq!(paused.status, ChannelStatus::Paused);
        assert_eq!(paused.name, "Paid ads");

        let missing = uuid::Uuid::new_v4();
        assert!(matches!(
            db.create_channel_activity(missing, spend(1, "1")),
            Err(CrmError::NotFound(_))
        ));
        assert!(matches!(
            db.list_channel_activities(missing),
            Err(CrmError::NotFound(_))
        ));
    }

    #[test]
    fn channel_activity_costs_are_bounded_and_stored_at_micros() {
        let db = test_support::db();
        let channel = db
            .create_channel(ChannelInput {
                name: Some("Podcast".into()),
                ..Default::default()
            })
            .unwrap();

        let too_much = db.create_channel_activity(
            channel.id,
            CreateChannelActivityInput {
                description: Some("sponsor slot".into()),
                cost: Some(Decimal::MAX),
                ..Default::default()
            },
        );
        assert!(matches!(too_much, Err(CrmError::Validation(_))));

        let at = chrono::Utc::now();
        let created = db
            .create_channel_activity(
                channel.id,
                CreateChannelActivityInput {
                    description: Some("sponsor slot".into()),
                    occurred_at: Some(at),
                    cost: Some(Decimal::from(300)),
                    ..Default::default()
                },
            )
            .unwrap();
        let listed = db.list_channel_activities(channel.id).unwrap();
        assert_eq!(listed, vec![created]);
    }
}
