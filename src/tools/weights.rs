//! Weight tools

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{StoredProfile, WeightEntry};

/// Most recent weight with the change since the entry before it
#[derive(Debug, Clone, Serialize)]
pub struct LatestWeight {
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub previous_kg: Option<f64>,
    pub change_kg: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LogWeightResponse {
    pub entry: WeightEntry,
    pub latest: Option<LatestWeight>,
    /// Kilograms left to the profile's target weight, when a profile exists
    pub kg_to_target: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ListWeightsResponse {
    pub weights: Vec<WeightEntry>,
    pub latest: Option<LatestWeight>,
    pub count: usize,
}

/// Build the latest-weight summary from entries ordered newest first
pub fn latest_with_change(newest_first: &[WeightEntry]) -> Option<LatestWeight> {
    let (latest, rest) = newest_first.split_first()?;
    let previous_kg = rest.first().map(|w| w.weight_kg);
    Some(LatestWeight {
        date: latest.date,
        weight_kg: latest.weight_kg,
        previous_kg,
        change_kg: previous_kg.map(|prev| latest.weight_kg - prev),
    })
}

pub fn latest_weight(db: &Database) -> Result<Option<LatestWeight>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let recent = WeightEntry::latest(&conn, 2).map_err(|e| format!("Failed to load weights: {}", e))?;
    Ok(latest_with_change(&recent))
}

pub fn log_weight(db: &Database, date: NaiveDate, weight_kg: f64) -> Result<LogWeightResponse, String> {
    if weight_kg <= 0.0 {
        return Err("weight_kg must be positive".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let entry = WeightEntry::append(&conn, date, weight_kg)
        .map_err(|e| format!("Failed to log weight: {}", e))?;
    let recent = WeightEntry::latest(&conn, 2).map_err(|e| format!("Failed to load weights: {}", e))?;
    let profile = StoredProfile::get(&conn).map_err(|e| format!("Failed to load profile: {}", e))?;

    tracing::info!("Logged weight {} kg for {}", entry.weight_kg, entry.date);

    Ok(LogWeightResponse {
        kg_to_target: profile.map(|p| entry.weight_kg - p.profile.target_weight_kg),
        latest: latest_with_change(&recent),
        entry,
    })
}

/// Weights between `start` and `end` inclusive; either bound may be open
pub fn list_weights(
    db: &Database,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<ListWeightsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let weights = match (start, end) {
        (Some(s), Some(e)) => WeightEntry::list_by_date_range(&conn, s, e),
        _ => WeightEntry::list_all(&conn).map(|all| {
            all.into_iter()
                .filter(|w| start.map_or(true, |s| w.date >= s) && end.map_or(true, |e| w.date <= e))
                .collect()
        }),
    }
    .map_err(|e| format!("Failed to list weights: {}", e))?;

    let recent = WeightEntry::latest(&conn, 2).map_err(|e| format!("Failed to load weights: {}", e))?;

    Ok(ListWeightsResponse {
        latest: latest_with_change(&recent),
        count: weights.len(),
        weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn test_latest_with_change() {
        let db = Database::in_memory().unwrap();
        assert!(latest_weight(&db).unwrap().is_none());

        log_weight(&db, day(20), 66.0).unwrap();
        let first = latest_weight(&db).unwrap().unwrap();
        assert_eq!(first.weight_kg, 66.0);
        assert!(first.change_kg.is_none());

        let logged = log_weight(&db, day(21), 65.5).unwrap();
        let latest = logged.latest.unwrap();
        assert_eq!(latest.previous_kg, Some(66.0));
        assert!((latest.change_kg.unwrap() + 0.5).abs() < 1e-9);
        assert!(logged.kg_to_target.is_none());
    }

    #[test]
    fn test_log_weight_rejects_non_positive() {
        let db = Database::in_memory().unwrap();
        assert!(log_weight(&db, day(20), 0.0).is_err());
    }

    #[test]
    fn test_list_weights_range() {
        let db = Database::in_memory().unwrap();
        for (d, kg) in [(18, 66.2), (19, 66.0), (20, 65.9)] {
            log_weight(&db, day(d), kg).unwrap();
        }
        assert_eq!(list_weights(&db, None, None).unwrap().count, 3);
        assert_eq!(list_weights(&db, Some(day(19)), None).unwrap().count, 2);
        let until = list_weights(&db, None, Some(day(18))).unwrap();
        assert_eq!(until.count, 1);
        assert_eq!(until.latest.unwrap().date, day(20));
    }
}
