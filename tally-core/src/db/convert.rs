//! Column conversions for the TEXT encodings used by the schema.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn conversion_err<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_with<T, E>(
    row: &Row,
    col: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> rusqlite::Result<Option<T>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(col)?;
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse(&s).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn required<T>(row: &Row, col: &str, value: Option<T>) -> rusqlite::Result<T> {
    match value {
        Some(v) => Ok(v),
        None => {
            let idx = row.as_ref().column_index(col)?;
            Err(rusqlite::Error::InvalidColumnType(
                idx,
                col.to_string(),
                Type::Null,
            ))
        }
    }
}

pub(crate) fn opt_uuid(row: &Row, col: &str) -> rusqlite::Result<Option<Uuid>> {
    parse_with(row, col, Uuid::parse_str)
}

pub(crate) fn uuid(row: &Row, col: &str) -> rusqlite::Result<Uuid> {
    let value = opt_uuid(row, col)?;
    required(row, col, value)
}

pub(crate) fn opt_ts(row: &Row, col: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    parse_with(row, col, |s| {
        DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
    })
}

pub(crate) fn timestamp(row: &Row, col: &str) -> rusqlite::Result<DateTime<Utc>> {
    let value = opt_ts(row, col)?;
    required(row, col, value)
}

pub(crate) fn opt_date(row: &Row, col: &str) -> rusqlite::Result<Option<NaiveDate>> {
    parse_with(row, col, |s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
}

pub(crate) fn naive_date(row: &Row, col: &str) -> rusqlite::Result<NaiveDate> {
    let value = opt_date(row, col)?;
    required(row, col, value)
}

/// Money columns; NULL reads as zero.
pub(crate) fn decimal(row: &Row, col: &str) -> rusqlite::Result<Decimal> {
    Ok(parse_with(row, col, Decimal::from_str)?.unwrap_or_default())
}
