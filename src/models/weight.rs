//! Weight entry model

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub created_at: String,
}

impl WeightEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("d")?,
            weight_kg: row.get("weight_kg")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn append(conn: &Connection, date: NaiveDate, weight_kg: f64) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO weights (d, weight_kg) VALUES (?1, ?2)",
            params![date, weight_kg],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::MissingAfterWrite("weight"))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let entry = conn
            .query_row("SELECT * FROM weights WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(entry)
    }

    /// All entries in recording order
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM weights ORDER BY d, id")?;
        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn list_by_date_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM weights WHERE d >= ?1 AND d <= ?2 ORDER BY d, id",
        )?;
        let entries = stmt
            .query_map(params![start, end], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// The most recent `limit` entries, newest first
    pub fn latest(conn: &Connection, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM weights ORDER BY d DESC, id DESC LIMIT ?1")?;
        let entries = stmt
            .query_map([limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_latest_is_newest_first() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        WeightEntry::append(&conn, day(20), 66.0).unwrap();
        WeightEntry::append(&conn, day(22), 65.4).unwrap();
        WeightEntry::append(&conn, day(21), 65.8).unwrap();

        let latest = WeightEntry::latest(&conn, 2).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].date, day(22));
        assert_eq!(latest[1].date, day(21));

        let all = WeightEntry::list_all(&conn).unwrap();
        assert_eq!(all.iter().map(|w| w.date).collect::<Vec<_>>(), vec![day(20), day(21), day(22)]);

        let ranged = WeightEntry::list_by_date_range(&conn, day(21), day(22)).unwrap();
        assert_eq!(ranged.len(), 2);
    }
}
