//! Activity record model
//!
//! Logged exercise sessions. Walking is the only kind the app records.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::meal::TIMESTAMP_FORMAT;
use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Walking,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Walking => "walking",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "walking" | "walk" | "걷기" => Some(ActivityKind::Walking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub timestamp: String,
    pub kind: ActivityKind,
    pub minutes: f64,
    pub steps: Option<i64>,
    pub distance_km: Option<f64>,
    pub pace_kmh: Option<f64>,
    pub calories: f64,
    pub created_at: String,
}

/// Data for appending an activity
#[derive(Debug, Clone)]
pub struct ActivityRecordCreate {
    pub timestamp: NaiveDateTime,
    pub kind: ActivityKind,
    pub minutes: f64,
    pub steps: Option<i64>,
    pub distance_km: Option<f64>,
    pub pace_kmh: Option<f64>,
    pub calories: f64,
}

impl ActivityRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind: String = row.get("kind")?;

        Ok(Self {
            id: row.get("id")?,
            timestamp: row.get("dt")?,
            kind: ActivityKind::from_str(&kind).unwrap_or(ActivityKind::Walking),
            minutes: row.get("minutes")?,
            steps: row.get("steps")?,
            distance_km: row.get("distance_km")?,
            pace_kmh: row.get("pace_kmh")?,
            calories: row.get("calories")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.date())
    }

    pub fn append(conn: &Connection, data: &ActivityRecordCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO activities (dt, kind, minutes, steps, distance_km, pace_kmh, calories)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                data.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                data.kind.as_str(),
                data.minutes,
                data.steps,
                data.distance_km,
                data.pace_kmh,
                data.calories,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::MissingAfterWrite("activity"))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let activity = conn
            .query_row("SELECT * FROM activities WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(activity)
    }

    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM activities ORDER BY dt, id")?;
        let activities = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activities)
    }

    pub fn list_by_date_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM activities WHERE date(dt) >= ?1 AND date(dt) <= ?2 ORDER BY dt, id",
        )?;
        let activities = stmt
            .query_map(params![start.to_string(), end.to_string()], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_append_keeps_optional_fields_null() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let ts = NaiveDateTime::parse_from_str("2025-10-23T18:00:00", TIMESTAMP_FORMAT).unwrap();
        let saved = ActivityRecord::append(
            &conn,
            &ActivityRecordCreate {
                timestamp: ts,
                kind: ActivityKind::Walking,
                minutes: 30.0,
                steps: None,
                distance_km: Some(2.25),
                pace_kmh: Some(4.5),
                calories: 129.675,
            },
        )
        .unwrap();

        assert_eq!(saved.kind, ActivityKind::Walking);
        assert_eq!(saved.steps, None);
        assert_eq!(saved.distance_km, Some(2.25));
        assert_eq!(saved.date(), NaiveDate::from_ymd_opt(2025, 10, 23));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!(ActivityKind::from_str("걷기"), Some(ActivityKind::Walking));
        assert_eq!(ActivityKind::from_str("running"), None);
    }
}
