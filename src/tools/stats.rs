//! Statistics tools
//!
//! Per-day series of intake, burn, carbohydrates, steps and weight, plus the
//! weekly report and today's summary against the profile targets.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::db::Database;
use crate::models::{ActivityRecord, MealRecord, StoredProfile, WeightEntry};

/// Days covered by the weekly report, today included
pub const WEEK_DAYS: i64 = 7;

/// One calendar day of recorded data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub intake_kcal: f64,
    pub burn_kcal: f64,
    pub carb_grams: f64,
    /// Summed steps; `None` when no walk that day recorded steps
    pub steps: Option<i64>,
    /// Last weight entered that day
    pub weight_kg: Option<f64>,
}

impl DailyStats {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            intake_kcal: 0.0,
            burn_kcal: 0.0,
            carb_grams: 0.0,
            steps: None,
            weight_kg: None,
        }
    }

    pub fn net_kcal(&self) -> f64 {
        self.intake_kcal - self.burn_kcal
    }
}

#[derive(Debug, Serialize)]
pub struct DailyStatsResponse {
    pub days: Vec<DailyStats>,
    pub daily_calorie_target: Option<i64>,
    pub daily_carb_target_g: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WeeklyReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_intake_kcal: f64,
    pub total_burn_kcal: f64,
    pub avg_intake_per_day: f64,
    pub avg_burn_per_day: f64,
    pub net_per_day: f64,
    /// Every day of the window, including days with nothing recorded
    pub days: Vec<DailyStats>,
}

#[derive(Debug, Serialize)]
pub struct TodaySummary {
    pub today: DailyStats,
    pub daily_calorie_target: Option<i64>,
    pub daily_carb_target_g: Option<i64>,
    /// Target minus intake plus burn
    pub remaining_kcal: Option<f64>,
    pub remaining_carb_grams: Option<f64>,
}

// ============================================================================
// Aggregation
// ============================================================================

/// Group records by calendar day. Only days with at least one record appear;
/// the result is sorted by date.
pub fn build_daily_stats(
    meals: &[MealRecord],
    activities: &[ActivityRecord],
    weights: &[WeightEntry],
) -> Vec<DailyStats> {
    let mut days: BTreeMap<NaiveDate, DailyStats> = BTreeMap::new();

    for meal in meals {
        let Some(date) = meal.date() else {
            tracing::warn!("Skipping meal {} with unreadable timestamp '{}'", meal.id, meal.timestamp);
            continue;
        };
        let day = days.entry(date).or_insert_with(|| DailyStats::empty(date));
        day.intake_kcal += meal.calories;
        day.carb_grams += meal.carb_grams;
    }

    for activity in activities {
        let Some(date) = activity.date() else {
            tracing::warn!(
                "Skipping activity {} with unreadable timestamp '{}'",
                activity.id,
                activity.timestamp
            );
            continue;
        };
        let day = days.entry(date).or_insert_with(|| DailyStats::empty(date));
        day.burn_kcal += activity.calories;
        if let Some(steps) = activity.steps {
            day.steps = Some(day.steps.unwrap_or(0) + steps);
        }
    }

    // weights arrive in recording order, so the last one per day wins
    for entry in weights {
        let day = days.entry(entry.date).or_insert_with(|| DailyStats::empty(entry.date));
        day.weight_kg = Some(entry.weight_kg);
    }

    days.into_values().collect()
}

/// Dense series from `start` to `end` inclusive, zero-filled
pub fn fill_days(stats: &[DailyStats], start: NaiveDate, end: NaiveDate) -> Vec<DailyStats> {
    let by_date: BTreeMap<NaiveDate, &DailyStats> = stats.iter().map(|s| (s.date, s)).collect();
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| by_date.get(&d).map(|s| (*s).clone()).unwrap_or_else(|| DailyStats::empty(d)))
        .collect()
}

/// Weekly averages over `today - 6 ..= today`. Averages divide by seven
/// regardless of how many days have data.
pub fn weekly_report_from(stats: &[DailyStats], today: NaiveDate) -> WeeklyReport {
    let start = today - Duration::days(WEEK_DAYS - 1);
    let days = fill_days(stats, start, today);

    let total_intake_kcal: f64 = days.iter().map(|d| d.intake_kcal).sum();
    let total_burn_kcal: f64 = days.iter().map(|d| d.burn_kcal).sum();
    let avg_intake_per_day = total_intake_kcal / WEEK_DAYS as f64;
    let avg_burn_per_day = total_burn_kcal / WEEK_DAYS as f64;

    WeeklyReport {
        start,
        end: today,
        total_intake_kcal,
        total_burn_kcal,
        avg_intake_per_day,
        avg_burn_per_day,
        net_per_day: avg_intake_per_day - avg_burn_per_day,
        days,
    }
}

// ============================================================================
// Database-backed tools
// ============================================================================

fn load_range(db: &Database, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyStats>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meals = MealRecord::list_by_date_range(&conn, start, end)
        .map_err(|e| format!("Failed to load meals: {}", e))?;
    let activities = ActivityRecord::list_by_date_range(&conn, start, end)
        .map_err(|e| format!("Failed to load activities: {}", e))?;
    let weights = WeightEntry::list_by_date_range(&conn, start, end)
        .map_err(|e| format!("Failed to load weights: {}", e))?;
    Ok(build_daily_stats(&meals, &activities, &weights))
}

fn load_all(db: &Database) -> Result<Vec<DailyStats>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meals = MealRecord::list_all(&conn).map_err(|e| format!("Failed to load meals: {}", e))?;
    let activities =
        ActivityRecord::list_all(&conn).map_err(|e| format!("Failed to load activities: {}", e))?;
    let weights = WeightEntry::list_all(&conn).map_err(|e| format!("Failed to load weights: {}", e))?;
    Ok(build_daily_stats(&meals, &activities, &weights))
}

fn load_targets(db: &Database) -> Result<(Option<i64>, Option<i64>), String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let profile = StoredProfile::get(&conn).map_err(|e| format!("Failed to load profile: {}", e))?;
    Ok(match profile {
        Some(p) => (Some(p.daily_calorie_target), Some(p.daily_carb_target_g)),
        None => (None, None),
    })
}

/// Daily series for a date range, or for every recorded day when no range is
/// given
pub fn daily_stats(
    db: &Database,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DailyStatsResponse, String> {
    let days = match (start, end) {
        (Some(s), Some(e)) if s > e => return Err(format!("start {} is after end {}", s, e)),
        (Some(s), Some(e)) => load_range(db, s, e)?,
        _ => load_all(db)?
            .into_iter()
            .filter(|d| start.map_or(true, |s| d.date >= s) && end.map_or(true, |e| d.date <= e))
            .collect(),
    };
    let (daily_calorie_target, daily_carb_target_g) = load_targets(db)?;

    Ok(DailyStatsResponse {
        days,
        daily_calorie_target,
        daily_carb_target_g,
    })
}

pub fn weekly_report(db: &Database, today: NaiveDate) -> Result<WeeklyReport, String> {
    let start = today - Duration::days(WEEK_DAYS - 1);
    let stats = load_range(db, start, today)?;
    Ok(weekly_report_from(&stats, today))
}

pub fn today_summary(db: &Database, today: NaiveDate) -> Result<TodaySummary, String> {
    let stats = load_range(db, today, today)?;
    let day = stats.into_iter().next().unwrap_or_else(|| DailyStats::empty(today));
    let (daily_calorie_target, daily_carb_target_g) = load_targets(db)?;

    Ok(TodaySummary {
        remaining_kcal: daily_calorie_target.map(|t| t as f64 - day.intake_kcal + day.burn_kcal),
        remaining_carb_grams: daily_carb_target_g.map(|t| t as f64 - day.carb_grams),
        daily_calorie_target,
        daily_carb_target_g,
        today: day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityKind, MealLabel};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn meal(id: i64, ts: &str, calories: f64, carbs: f64) -> MealRecord {
        MealRecord {
            id,
            timestamp: ts.to_string(),
            label: MealLabel::Lunch,
            items: String::new(),
            calories,
            carb_grams: carbs,
            photo_path: None,
            created_at: String::new(),
        }
    }

    fn walk(id: i64, ts: &str, calories: f64, steps: Option<i64>) -> ActivityRecord {
        ActivityRecord {
            id,
            timestamp: ts.to_string(),
            kind: ActivityKind::Walking,
            minutes: 30.0,
            steps,
            distance_km: None,
            pace_kmh: None,
            calories,
            created_at: String::new(),
        }
    }

    fn weight(id: i64, date: NaiveDate, kg: f64) -> WeightEntry {
        WeightEntry {
            id,
            date,
            weight_kg: kg,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_build_daily_stats() {
        let meals = vec![
            meal(1, "2025-10-20T08:00:00", 300.0, 40.0),
            meal(2, "2025-10-20T12:30:00", 500.0, 60.0),
            meal(3, "2025-10-22T19:00:00", 450.0, 30.0),
        ];
        let walks = vec![
            walk(1, "2025-10-20T18:00:00", 120.0, None),
            walk(2, "2025-10-21T07:00:00", 100.0, Some(3000)),
            walk(3, "2025-10-21T19:00:00", 80.0, Some(2500)),
        ];
        let weights = vec![weight(1, day(22), 65.8), weight(2, day(22), 65.6)];

        let stats = build_daily_stats(&meals, &walks, &weights);
        assert_eq!(stats.len(), 3);

        assert_eq!(stats[0].date, day(20));
        assert_eq!(stats[0].intake_kcal, 800.0);
        assert_eq!(stats[0].carb_grams, 100.0);
        assert_eq!(stats[0].burn_kcal, 120.0);
        assert_eq!(stats[0].steps, None);

        assert_eq!(stats[1].intake_kcal, 0.0);
        assert_eq!(stats[1].carb_grams, 0.0);
        assert_eq!(stats[1].steps, Some(5500));

        assert_eq!(stats[2].weight_kg, Some(65.6));
        assert_eq!(stats[2].net_kcal(), 450.0);
    }

    #[test]
    fn test_unreadable_timestamp_is_skipped() {
        let stats = build_daily_stats(&[meal(1, "yesterday", 300.0, 10.0)], &[], &[]);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_weekly_report_divides_by_seven() {
        let meals = vec![
            meal(1, "2025-10-23T08:00:00", 700.0, 0.0),
            meal(2, "2025-10-17T08:00:00", 700.0, 0.0),
            // outside the window
            meal(3, "2025-10-16T08:00:00", 9999.0, 0.0),
        ];
        let walks = vec![walk(1, "2025-10-20T08:00:00", 210.0, None)];
        let stats = build_daily_stats(&meals, &walks, &[]);

        let report = weekly_report_from(&stats, day(23));
        assert_eq!(report.start, day(17));
        assert_eq!(report.days.len(), 7);
        assert_eq!(report.total_intake_kcal, 1400.0);
        assert_eq!(report.avg_intake_per_day, 200.0);
        assert_eq!(report.avg_burn_per_day, 30.0);
        assert_eq!(report.net_per_day, 170.0);
    }

    #[test]
    fn test_fill_days_zero_fills() {
        let stats = build_daily_stats(&[meal(1, "2025-10-21T08:00:00", 100.0, 5.0)], &[], &[]);
        let filled = fill_days(&stats, day(20), day(22));
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[0], DailyStats::empty(day(20)));
        assert_eq!(filled[1].intake_kcal, 100.0);
    }

    #[test]
    fn test_today_summary_without_profile() {
        let db = Database::in_memory().unwrap();
        let summary = today_summary(&db, day(23)).unwrap();
        assert_eq!(summary.today.intake_kcal, 0.0);
        assert!(summary.remaining_kcal.is_none());
    }

    #[test]
    fn test_daily_stats_rejects_inverted_range() {
        let db = Database::in_memory().unwrap();
        assert!(daily_stats(&db, Some(day(23)), Some(day(20))).is_err());
        assert!(daily_stats(&db, None, None).unwrap().days.is_empty());
    }

    #[test]
    fn test_today_summary_against_targets() {
        use crate::energy::{ActivityLevel, EnergyPolicy, Sex};
        use crate::models::{MealRecordCreate, Profile};

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
        crate::tools::profile::save_profile(&db, profile, &EnergyPolicy::default(), 2025).unwrap();

        {
            let conn = db.get_conn().unwrap();
            MealRecord::append(
                &conn,
                &MealRecordCreate {
                    timestamp: day(23).and_hms_opt(12, 0, 0).unwrap(),
                    label: MealLabel::Lunch,
                    items: "점심".to_string(),
                    calories: 500.0,
                    carb_grams: 60.0,
                    photo_path: None,
                },
            )
            .unwrap();
        }

        let summary = today_summary(&db, day(23)).unwrap();
        assert_eq!(summary.daily_calorie_target, Some(1389));
        assert_eq!(summary.remaining_kcal, Some(889.0));
        assert_eq!(summary.remaining_carb_grams, Some(90.0));

        let report = weekly_report(&db, day(23)).unwrap();
        assert_eq!(report.total_intake_kcal, 500.0);
    }
}
