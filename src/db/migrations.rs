//! Database migrations
//!
//! Schema for the profile, meal, activity and weight tables.

use rusqlite::Connection;

use super::connection::DbResult;

const SCHEMA_VERSION: i32 = 1;

/// Bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- Single-row profile; targets are the values computed at save time
        CREATE TABLE profile (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            birth_year INTEGER NOT NULL,
            sex TEXT NOT NULL CHECK(sex IN ('female', 'male')),
            height_cm REAL NOT NULL,
            weight_kg REAL NOT NULL,
            target_weight_kg REAL NOT NULL,
            activity_level TEXT NOT NULL,
            daily_calorie_target INTEGER NOT NULL,
            daily_carb_target_g INTEGER NOT NULL,
            knee_care INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE meals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dt TEXT NOT NULL,                    -- local time, "2025-10-23T08:30:00"
            label TEXT NOT NULL CHECK(label IN ('breakfast', 'lunch', 'dinner', 'snack')),
            items TEXT NOT NULL DEFAULT '',
            calories REAL NOT NULL DEFAULT 0,
            carbs_g REAL NOT NULL DEFAULT 0,
            photo_path TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_meals_dt ON meals(dt);

        CREATE TABLE activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dt TEXT NOT NULL,
            kind TEXT NOT NULL,
            minutes REAL NOT NULL,
            steps INTEGER,
            distance_km REAL,
            pace_kmh REAL,
            calories REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_activities_dt ON activities(dt);

        CREATE TABLE weights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            d TEXT NOT NULL,                     -- ISO date: "2025-10-23"
            weight_kg REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_weights_d ON weights(d);
        "#,
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_profile_is_single_row() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let insert = "INSERT INTO profile (id, birth_year, sex, height_cm, weight_kg, target_weight_kg,
                      activity_level, daily_calorie_target, daily_carb_target_g)
                      VALUES (?1, 1973, 'female', 160, 65, 60, 'moderate', 1389, 150)";
        conn.execute(insert, [1]).unwrap();
        assert!(conn.execute(insert, [2]).is_err());
    }
}
