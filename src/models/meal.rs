//! Meal record model
//!
//! One row per logged meal with its stored calorie/carb totals.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Timestamp format used in the `dt` columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealLabel {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealLabel::Breakfast => "breakfast",
            MealLabel::Lunch => "lunch",
            MealLabel::Dinner => "dinner",
            MealLabel::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" | "아침" => Some(MealLabel::Breakfast),
            "lunch" | "점심" => Some(MealLabel::Lunch),
            "dinner" | "저녁" => Some(MealLabel::Dinner),
            "snack" | "간식" => Some(MealLabel::Snack),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MealLabel::Breakfast => "Breakfast",
            MealLabel::Lunch => "Lunch",
            MealLabel::Dinner => "Dinner",
            MealLabel::Snack => "Snack",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: i64,
    pub timestamp: String,
    pub label: MealLabel,
    pub items: String,
    pub calories: f64,
    pub carb_grams: f64,
    pub photo_path: Option<String>,
    pub created_at: String,
}

/// Data for appending a meal
#[derive(Debug, Clone)]
pub struct MealRecordCreate {
    pub timestamp: NaiveDateTime,
    pub label: MealLabel,
    pub items: String,
    pub calories: f64,
    pub carb_grams: f64,
    pub photo_path: Option<String>,
}

impl MealRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let label: String = row.get("label")?;

        Ok(Self {
            id: row.get("id")?,
            timestamp: row.get("dt")?,
            label: MealLabel::from_str(&label).unwrap_or(MealLabel::Snack),
            items: row.get("items")?,
            calories: row.get("calories")?,
            carb_grams: row.get("carbs_g")?,
            photo_path: row.get("photo_path")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Calendar date of the meal, if the stored timestamp parses
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|dt| dt.date())
    }

    pub fn append(conn: &Connection, data: &MealRecordCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO meals (dt, label, items, calories, carbs_g, photo_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                data.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                data.label.as_str(),
                data.items,
                data.calories,
                data.carb_grams,
                data.photo_path,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::MissingAfterWrite("meal"))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let meal = conn
            .query_row("SELECT * FROM meals WHERE id = ?1", [id], Self::from_row)
            .optional()?;
        Ok(meal)
    }

    /// Every meal, oldest first
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meals ORDER BY dt, id")?;
        let meals = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    /// Meals whose date falls within `start..=end`
    pub fn list_by_date_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE date(dt) >= ?1 AND date(dt) <= ?2 ORDER BY dt, id",
        )?;
        let meals = stmt
            .query_map(params![start.to_string(), end.to_string()], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }
}
