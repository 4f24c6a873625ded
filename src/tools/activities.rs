//! Walking tools
//!
//! Estimate and log walks. Calories come from the walking MET table and the
//! user's weight.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::db::Database;
use crate::energy::{EnergyPolicy, WalkEstimate, WalkInput};
use crate::models::{ActivityKind, ActivityRecord, ActivityRecordCreate, StoredProfile};

/// Response for estimate_walk
#[derive(Debug, Serialize)]
pub struct WalkEstimateResponse {
    pub weight_kg: f64,
    pub weight_source: &'static str,
    pub estimate: WalkEstimate,
}

/// Input for log_walk
#[derive(Debug, Clone, Default)]
pub struct LogWalkRequest {
    pub walk: WalkInput,
    pub steps: Option<i64>,
    /// Overrides the profile weight for the calorie estimate
    pub weight_kg: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
}

/// Response for log_walk
#[derive(Debug, Serialize)]
pub struct LogWalkResponse {
    pub activity: ActivityRecord,
    pub estimate: WalkEstimate,
}

/// Response for list_activities
#[derive(Debug, Serialize)]
pub struct ListActivitiesResponse {
    pub activities: Vec<ActivityRecord>,
    pub total_minutes: f64,
    pub total_calories: f64,
    pub count: usize,
}

/// Weight used for the estimate: the explicit value, else the saved profile
fn resolve_weight(db: &Database, weight_kg: Option<f64>) -> Result<(f64, &'static str), String> {
    if let Some(kg) = weight_kg {
        if kg <= 0.0 {
            return Err("weight_kg must be positive".to_string());
        }
        return Ok((kg, "request"));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = StoredProfile::get(&conn).map_err(|e| format!("Failed to load profile: {}", e))?;
    match stored {
        Some(p) => Ok((p.profile.weight_kg, "profile")),
        None => Err("No profile saved yet; save a profile or pass weight_kg".to_string()),
    }
}

fn validate_walk(input: &WalkInput) -> Result<(), String> {
    if input.minutes < 0.0 || input.distance_km < 0.0 || input.pace_kmh < 0.0 {
        return Err("minutes, distance_km and pace_kmh cannot be negative".to_string());
    }
    Ok(())
}

fn non_zero(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

pub fn estimate_walk(
    db: &Database,
    input: WalkInput,
    weight_kg: Option<f64>,
    policy: &EnergyPolicy,
) -> Result<WalkEstimateResponse, String> {
    validate_walk(&input)?;
    let (weight_kg, weight_source) = resolve_weight(db, weight_kg)?;

    Ok(WalkEstimateResponse {
        weight_kg,
        weight_source,
        estimate: WalkEstimate::compute(input, weight_kg, policy),
    })
}

/// Estimate and store a walk. Values left at zero are stored as NULL.
pub fn log_walk(
    db: &Database,
    request: LogWalkRequest,
    policy: &EnergyPolicy,
    now: NaiveDateTime,
) -> Result<LogWalkResponse, String> {
    validate_walk(&request.walk)?;
    if request.steps.is_some_and(|s| s < 0) {
        return Err("steps cannot be negative".to_string());
    }

    let (weight_kg, _) = resolve_weight(db, request.weight_kg)?;
    let estimate = WalkEstimate::compute(request.walk, weight_kg, policy);

    let data = ActivityRecordCreate {
        timestamp: request.timestamp.unwrap_or(now),
        kind: ActivityKind::Walking,
        minutes: estimate.walk.minutes,
        steps: request.steps.filter(|&s| s > 0),
        distance_km: non_zero(estimate.walk.distance_km),
        pace_kmh: non_zero(estimate.walk.pace_kmh),
        calories: estimate.calories_burned,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let activity = ActivityRecord::append(&conn, &data)
        .map_err(|e| format!("Failed to log walk: {}", e))?;

    tracing::info!(
        "Logged walk: {} min, MET {}, {:.0} kcal (derived {})",
        activity.minutes,
        estimate.met_value,
        activity.calories,
        estimate.walk.derived.as_str()
    );

    Ok(LogWalkResponse { activity, estimate })
}

/// Activities for one day, or all when `date` is `None`
pub fn list_activities(db: &Database, date: Option<NaiveDate>) -> Result<ListActivitiesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let activities = match date {
        Some(d) => ActivityRecord::list_by_date_range(&conn, d, d),
        None => ActivityRecord::list_all(&conn),
    }
    .map_err(|e| format!("Failed to list activities: {}", e))?;

    Ok(ListActivitiesResponse {
        total_minutes: activities.iter().map(|a| a.minutes).sum(),
        total_calories: activities.iter().map(|a| a.calories).sum(),
        count: activities.len(),
        activities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::{ActivityLevel, DerivedQuantity, Sex};
    use crate::models::Profile;
    use crate::tools::profile::save_profile;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 23)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn db_with_profile() -> Database {
        let db = Database::in_memory().unwrap();
        let profile = Profile {
            birth_year: 1973,
            sex: Sex::Female,
            height_cm: 160.0,
            weight_kg: 65.0,
            target_weight_kg: 60.0,
            activity_level: ActivityLevel::Moderate,
            knee_care_mode: true,
        };
        save_profile(&db, profile, &EnergyPolicy::default(), 2025).unwrap();
        db
    }

    #[test]
    fn test_estimate_walk_uses_profile_weight() {
        let db = db_with_profile();
        let input = WalkInput { minutes: 30.0, distance_km: 0.0, pace_kmh: 4.5 };
        let resp = estimate_walk(&db, input, None, &EnergyPolicy::default()).unwrap();
        assert_eq!(resp.weight_source, "profile");
        assert_eq!(resp.estimate.met_value, 3.8);
        // 3.8 * 3.5 * 65 / 200 * 30
        assert!((resp.estimate.calories_burned - 129.675).abs() < 1e-9);
        assert!((resp.estimate.walk.distance_km - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_walk_without_weight_fails() {
        let db = Database::in_memory().unwrap();
        let input = WalkInput { minutes: 20.0, ..WalkInput::default() };
        assert!(estimate_walk(&db, input, None, &EnergyPolicy::default()).is_err());
        let resp = estimate_walk(&db, input, Some(80.0), &EnergyPolicy::default()).unwrap();
        assert_eq!(resp.weight_source, "request");
        // default pace 4.0 km/h
        assert_eq!(resp.estimate.met_value, 3.8);
        assert_eq!(resp.estimate.walk.effective_pace_kmh, 4.0);
    }

    #[test]
    fn test_log_walk_stores_nulls_for_unset_values() {
        let db = db_with_profile();
        let request = LogWalkRequest {
            walk: WalkInput { minutes: 40.0, ..WalkInput::default() },
            steps: Some(0),
            ..LogWalkRequest::default()
        };
        let logged = log_walk(&db, request, &EnergyPolicy::default(), now()).unwrap();
        assert_eq!(logged.activity.kind, ActivityKind::Walking);
        assert!(logged.activity.steps.is_none());
        assert!(logged.activity.distance_km.is_none());
        assert!(logged.activity.pace_kmh.is_none());
        assert_eq!(logged.activity.timestamp, "2025-10-23T18:30:00");
        assert_eq!(logged.estimate.walk.derived, DerivedQuantity::None);
    }

    #[test]
    fn test_log_walk_stores_derived_pace() {
        let db = db_with_profile();
        let request = LogWalkRequest {
            walk: WalkInput { minutes: 45.0, distance_km: 3.0, pace_kmh: 0.0 },
            steps: Some(4200),
            ..LogWalkRequest::default()
        };
        let logged = log_walk(&db, request, &EnergyPolicy::default(), now()).unwrap();
        assert_eq!(logged.activity.steps, Some(4200));
        assert_eq!(logged.activity.distance_km, Some(3.0));
        let pace = logged.activity.pace_kmh.unwrap();
        assert!((pace - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_walk_rejects_negative_input() {
        let db = db_with_profile();
        let request = LogWalkRequest {
            walk: WalkInput { minutes: -5.0, ..WalkInput::default() },
            ..LogWalkRequest::default()
        };
        assert!(log_walk(&db, request, &EnergyPolicy::default(), now()).is_err());
    }

    #[test]
    fn test_list_activities_totals() {
        let db = db_with_profile();
        for minutes in [20.0, 30.0] {
            let request = LogWalkRequest {
                walk: WalkInput { minutes, ..WalkInput::default() },
                ..LogWalkRequest::default()
            };
            log_walk(&db, request, &EnergyPolicy::default(), now()).unwrap();
        }
        let listed = list_activities(&db, Some(now().date())).unwrap();
        assert_eq!(listed.count, 2);
        assert_eq!(listed.total_minutes, 50.0);
        assert!(list_activities(&db, NaiveDate::from_ymd_opt(2025, 10, 1)).unwrap().activities.is_empty());
    }
}
