//! Profile model
//!
//! The single user profile. Saved explicitly, never deleted.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::energy::{ActivityLevel, EnergyEstimate, Sex};

/// Body measurements and goals entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub birth_year: i32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    /// Knee-friendly mode (ACL surgery history): walking on flat ground only
    pub knee_care_mode: bool,
}

impl Profile {
    pub fn age_in(&self, year: i32) -> i32 {
        year - self.birth_year
    }
}

/// Profile row as stored, with the targets computed when it was saved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub daily_calorie_target: i64,
    pub daily_carb_target_g: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: String = row.get("sex")?;
        let activity_level: String = row.get("activity_level")?;

        Ok(Self {
            profile: Profile {
                birth_year: row.get("birth_year")?,
                sex: Sex::from_str(&sex).unwrap_or(Sex::Female),
                height_cm: row.get("height_cm")?,
                weight_kg: row.get("weight_kg")?,
                target_weight_kg: row.get("target_weight_kg")?,
                activity_level: ActivityLevel::from_str(&activity_level),
                knee_care_mode: row.get::<_, i32>("knee_care")? != 0,
            },
            daily_calorie_target: row.get("daily_calorie_target")?,
            daily_carb_target_g: row.get("daily_carb_target_g")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The saved profile, if any
    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let profile = conn
            .query_row("SELECT * FROM profile WHERE id = 1", [], Self::from_row)
            .optional()?;
        Ok(profile)
    }

    /// Insert or replace the profile together with its computed targets
    pub fn save(conn: &Connection, profile: &Profile, estimate: &EnergyEstimate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO profile (id, birth_year, sex, height_cm, weight_kg, target_weight_kg,
                                 activity_level, daily_calorie_target, daily_carb_target_g, knee_care)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                birth_year = excluded.birth_year,
                sex = excluded.sex,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                target_weight_kg = excluded.target_weight_kg,
                activity_level = excluded.activity_level,
                daily_calorie_target = excluded.daily_calorie_target,
                daily_carb_target_g = excluded.daily_carb_target_g,
                knee_care = excluded.knee_care,
                updated_at = datetime('now')
            "#,
            params![
                profile.birth_year,
                profile.sex.as_str(),
                profile.height_cm,
                profile.weight_kg,
                profile.target_weight_kg,
                profile.activity_level.as_str(),
                estimate.daily_calorie_target,
                estimate.daily_carb_target_grams,
                profile.knee_care_mode as i32,
            ],
        )?;

        Self::get(conn)?.ok_or(DbError::MissingAfterWrite("profile"))
    }
}
