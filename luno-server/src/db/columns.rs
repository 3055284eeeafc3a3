//! Typed column readers shared by the repositories.

use chrono::{DateTime, Utc};
use rusqlite::{types::Type, Row};
use uuid::Uuid;

use luno_types::MediaType;

pub fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Timestamps are stored as integer milliseconds since the Unix epoch
pub fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

pub fn media_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<MediaType> {
    let raw: String = row.get(idx)?;
    MediaType::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown media type '{raw}'").into(),
        )
    })
}
