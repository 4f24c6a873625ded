//! Meal tools
//!
//! Estimate meals from the food catalog, apply templates, store meal photos
//! and log meals.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::db::Database;
use crate::models::{MealLabel, MealRecord, MealRecordCreate};
use crate::nutrition::{
    aggregate, aggregator::line_totals, describe_selections, expand_template, unknown_items,
    FoodCatalog, NutritionTotals, SelectionLine,
};

/// Photo extensions accepted for meal pictures
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// One selection line with its looked-up contribution
#[derive(Debug, Serialize)]
pub struct LineDetail {
    pub food_name: String,
    pub servings: f64,
    pub in_catalog: bool,
    pub calories: f64,
    pub carb_grams: f64,
}

/// Response for estimate_meal
#[derive(Debug, Serialize)]
pub struct MealEstimateResponse {
    pub lines: Vec<LineDetail>,
    pub totals: NutritionTotals,
    pub unknown_items: Vec<String>,
}

/// Response for a template estimate
#[derive(Debug, Serialize)]
pub struct TemplateEstimateResponse {
    pub template: String,
    pub label: String,
    pub items_text: String,
    pub estimate: MealEstimateResponse,
}

/// Everything the meal form submits
#[derive(Debug, Clone, Default)]
pub struct LogMealRequest {
    pub label: Option<MealLabel>,
    pub date: Option<NaiveDate>,
    /// Typed "HH:MM"; wins over `time` when it parses
    pub time_text: Option<String>,
    /// Picker value
    pub time: Option<NaiveTime>,
    pub selections: Vec<SelectionLine>,
    pub template: Option<String>,
    pub items_text: Option<String>,
    /// Manual totals; replace the catalog estimate when given
    pub calories: Option<f64>,
    pub carb_grams: Option<f64>,
    pub photo_source: Option<PathBuf>,
}

/// Response for log_meal
#[derive(Debug, Serialize)]
pub struct LogMealResponse {
    pub meal: MealRecord,
    pub estimate: NutritionTotals,
    pub used_manual_totals: bool,
    pub unknown_items: Vec<String>,
}

/// Response for list_meals
#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub meals: Vec<MealRecord>,
    pub total_calories: f64,
    pub total_carb_grams: f64,
    pub count: usize,
}

// ============================================================================
// Estimation
// ============================================================================

/// Every selection line needs a positive serving multiplier
pub fn validate_servings(lines: &[SelectionLine]) -> Result<(), String> {
    match lines.iter().find(|l| l.servings <= 0.0) {
        Some(bad) => Err(format!("Servings must be positive for {}", bad.food_name)),
        None => Ok(()),
    }
}

/// Look up each line and total the meal. Unknown names count as zero and are
/// listed in `unknown_items`.
pub fn estimate_meal(catalog: &FoodCatalog, lines: &[SelectionLine]) -> Result<MealEstimateResponse, String> {
    validate_servings(lines)?;

    let details = lines
        .iter()
        .map(|line| {
            let totals = line_totals(catalog, line);
            LineDetail {
                food_name: line.food_name.clone(),
                servings: line.servings,
                in_catalog: catalog.contains(&line.food_name),
                calories: totals.calories,
                carb_grams: totals.carb_grams,
            }
        })
        .collect();

    Ok(MealEstimateResponse {
        lines: details,
        totals: aggregate(catalog, lines),
        unknown_items: unknown_items(catalog, lines).into_iter().map(String::from).collect(),
    })
}

/// Estimate a template at one serving per entry
pub fn estimate_template(catalog: &FoodCatalog, key: &str) -> Result<TemplateEstimateResponse, String> {
    let template = catalog
        .template(key)
        .ok_or_else(|| format!("Unknown meal template: {}", key))?;

    let lines = expand_template(template);
    Ok(TemplateEstimateResponse {
        template: template.name.clone(),
        label: template.label.as_str().to_string(),
        items_text: template.items.join(", "),
        estimate: estimate_meal(catalog, &lines)?,
    })
}

// ============================================================================
// Time and photo handling
// ============================================================================

/// Parse typed "HH:MM" text. Empty or malformed text yields `fallback`.
pub fn parse_time_of_day(text: Option<&str>, fallback: NaiveTime) -> NaiveTime {
    let Some(raw) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return fallback;
    };

    let parsed = raw.split_once(':').and_then(|(hh, mm)| {
        let hour = hh.trim().parse::<u32>().ok()?;
        let minute = mm.trim().parse::<u32>().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    });

    match parsed {
        Some(time) => time,
        None => {
            tracing::warn!("Unparsable meal time '{}', using {}", raw, fallback.format("%H:%M"));
            fallback
        }
    }
}

/// Copy a meal photo into `photo_dir` as `meal_<YYYYmmdd_HHMMSS>.<ext>`
pub fn store_meal_photo(source: &Path, photo_dir: &Path, now: NaiveDateTime) -> Result<PathBuf, String> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .filter(|e| PHOTO_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| {
            format!(
                "Unsupported photo type for {} (expected {})",
                source.display(),
                PHOTO_EXTENSIONS.join(", ")
            )
        })?;

    std::fs::create_dir_all(photo_dir)
        .map_err(|e| format!("Failed to create photo directory {}: {}", photo_dir.display(), e))?;

    let target = photo_dir.join(format!("meal_{}.{}", now.format("%Y%m%d_%H%M%S"), ext));
    std::fs::copy(source, &target)
        .map_err(|e| format!("Failed to store photo {}: {}", source.display(), e))?;

    Ok(target)
}

// ============================================================================
// Logging
// ============================================================================

/// Log a meal. Template entries are appended to the selections at one serving
/// each; the items text combines the selections with any free text.
pub fn log_meal(
    db: &Database,
    catalog: &FoodCatalog,
    photo_dir: &Path,
    request: LogMealRequest,
    now: NaiveDateTime,
) -> Result<LogMealResponse, String> {
    let mut lines = request.selections;
    let mut label = request.label;

    if let Some(key) = request.template.as_deref() {
        let template = catalog
            .template(key)
            .ok_or_else(|| format!("Unknown meal template: {}", key))?;
        lines.extend(expand_template(template));
        label = label.or(Some(template.label));
    }

    let label = label.ok_or("Meal label is required (breakfast, lunch, dinner or snack)")?;

    validate_servings(&lines)?;

    let estimate = aggregate(catalog, &lines);
    let unknown: Vec<String> = unknown_items(catalog, &lines).into_iter().map(String::from).collect();

    let used_manual_totals = request.calories.is_some() || request.carb_grams.is_some();
    let calories = request.calories.unwrap_or(estimate.calories);
    let carb_grams = request.carb_grams.unwrap_or(estimate.carb_grams);
    if calories < 0.0 || carb_grams < 0.0 {
        return Err("Calories and carbohydrates cannot be negative".to_string());
    }

    let time = parse_time_of_day(request.time_text.as_deref(), request.time.unwrap_or(now.time()));
    let timestamp = request.date.unwrap_or(now.date()).and_time(time);

    let photo_path = match request.photo_source.as_deref() {
        Some(source) => Some(store_meal_photo(source, photo_dir, now)?),
        None => None,
    };

    let data = MealRecordCreate {
        timestamp,
        label,
        items: describe_selections(&lines, request.items_text.as_deref()),
        calories,
        carb_grams,
        photo_path: photo_path.map(|p| p.display().to_string()),
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meal = MealRecord::append(&conn, &data).map_err(|e| format!("Failed to log meal: {}", e))?;

    tracing::info!(
        "Logged {} at {}: {:.0} kcal, {:.1} g carbs",
        meal.label.display_name(),
        meal.timestamp,
        meal.calories,
        meal.carb_grams
    );

    Ok(LogMealResponse {
        meal,
        estimate,
        used_manual_totals,
        unknown_items: unknown,
    })
}

/// Meals for one day, or all meals when `date` is `None`
pub fn list_meals(db: &Database, date: Option<NaiveDate>) -> Result<ListMealsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let meals = match date {
        Some(d) => MealRecord::list_by_date_range(&conn, d, d),
        None => MealRecord::list_all(&conn),
    }
    .map_err(|e| format!("Failed to list meals: {}", e))?;

    Ok(ListMealsResponse {
        total_calories: meals.iter().map(|m| m.calories).sum(),
        total_carb_grams: meals.iter().map(|m| m.carb_grams).sum(),
        count: meals.len(),
        meals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 23).unwrap().and_time(noon())
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day(Some("07:45"), noon()),
            NaiveTime::from_hms_opt(7, 45, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day(Some(" 8 : 05 "), noon()),
            NaiveTime::from_hms_opt(8, 5, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_time_of_day_fallbacks() {
        assert_eq!(parse_time_of_day(None, noon()), noon());
        assert_eq!(parse_time_of_day(Some(""), noon()), noon());
        assert_eq!(parse_time_of_day(Some("7시 30분"), noon()), noon());
        assert_eq!(parse_time_of_day(Some("25:00"), noon()), noon());
        assert_eq!(parse_time_of_day(Some("0730"), noon()), noon());
    }

    #[test]
    fn test_estimate_meal_reports_unknown() {
        let catalog = FoodCatalog::builtin();
        let est = estimate_meal(
            &catalog,
            &[
                SelectionLine::new("현미밥 1/2공기(100g)", 1.0),
                SelectionLine::new("계란 1개", 2.0),
                SelectionLine::new("떡볶이", 1.0),
            ],
        )
        .unwrap();
        assert!((est.totals.calories - 290.0).abs() < 1e-9);
        assert!((est.totals.carb_grams - 34.2).abs() < 1e-9);
        assert_eq!(est.unknown_items, vec!["떡볶이".to_string()]);
        assert!(!est.lines[2].in_catalog);
        assert_eq!(est.lines[1].calories, 140.0);
    }

    #[test]
    fn test_estimate_meal_rejects_non_positive_servings() {
        let catalog = FoodCatalog::builtin();
        let err = estimate_meal(
            &catalog,
            &[SelectionLine::new("계란 1개", 1.0), SelectionLine::new("현미밥 1/2공기(100g)", -1.0)],
        )
        .unwrap_err();
        assert!(err.contains("현미밥"));
        assert!(estimate_meal(&catalog, &[SelectionLine::new("계란 1개", 0.0)]).is_err());
    }

    #[test]
    fn test_estimate_template() {
        let catalog = FoodCatalog::builtin();
        let est = estimate_template(&catalog, "snack").unwrap();
        assert_eq!(est.template, "간식(예시)");
        assert_eq!(est.items_text, "플레인 요거트 150g, 아몬드 25g");
        assert!((est.estimate.totals.calories - 240.0).abs() < 1e-9);
        assert!(estimate_template(&catalog, "midnight").is_err());
    }

    #[test]
    fn test_log_meal_from_selections() {
        let db = Database::in_memory().unwrap();
        let catalog = FoodCatalog::builtin();
        let dir = tempfile::tempdir().unwrap();

        let request = LogMealRequest {
            label: Some(MealLabel::Breakfast),
            time_text: Some("07:30".to_string()),
            selections: vec![SelectionLine::new("계란 1개", 2.0)],
            items_text: Some("김치 조금".to_string()),
            ..LogMealRequest::default()
        };
        let logged = log_meal(&db, &catalog, dir.path(), request, now()).unwrap();

        assert_eq!(logged.meal.timestamp, "2025-10-23T07:30:00");
        assert_eq!(logged.meal.items, "계란 1개 x2, 김치 조금");
        assert!((logged.meal.calories - 140.0).abs() < 1e-9);
        assert!(!logged.used_manual_totals);
        assert!(logged.meal.photo_path.is_none());
    }

    #[test]
    fn test_log_meal_manual_totals_win() {
        let db = Database::in_memory().unwrap();
        let catalog = FoodCatalog::builtin();
        let dir = tempfile::tempdir().unwrap();

        let request = LogMealRequest {
            label: Some(MealLabel::Dinner),
            selections: vec![SelectionLine::new("연어 120g", 1.0)],
            calories: Some(500.0),
            ..LogMealRequest::default()
        };
        let logged = log_meal(&db, &catalog, dir.path(), request, now()).unwrap();
        assert!(logged.used_manual_totals);
        assert_eq!(logged.meal.calories, 500.0);
        // carbs not given manually, so the catalog value is kept
        assert_eq!(logged.meal.carb_grams, 0.0);
        assert_eq!(logged.meal.timestamp, "2025-10-23T12:00:00");
    }

    #[test]
    fn test_log_meal_template_supplies_label() {
        let db = Database::in_memory().unwrap();
        let catalog = FoodCatalog::builtin();
        let dir = tempfile::tempdir().unwrap();

        let request = LogMealRequest {
            template: Some("점심(예시)".to_string()),
            ..LogMealRequest::default()
        };
        let logged = log_meal(&db, &catalog, dir.path(), request, now()).unwrap();
        assert_eq!(logged.meal.label, MealLabel::Lunch);
        // 25 + 165 + 60 + 40
        assert!((logged.meal.calories - 290.0).abs() < 1e-9);
        assert!(logged.meal.items.starts_with("곤약면 1인분 x1"));
    }

    #[test]
    fn test_log_meal_requires_label() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = log_meal(&db, &FoodCatalog::builtin(), dir.path(), LogMealRequest::default(), now());
        assert!(result.is_err());
    }

    #[test]
    fn test_log_meal_rejects_non_positive_servings() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let request = LogMealRequest {
            label: Some(MealLabel::Snack),
            selections: vec![SelectionLine::new("사과 1/2개", 0.0)],
            ..LogMealRequest::default()
        };
        assert!(log_meal(&db, &FoodCatalog::builtin(), dir.path(), request, now()).is_err());
    }

    #[test]
    fn test_log_meal_with_photo() {
        let db = Database::in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("lunch.JPG");
        std::fs::write(&source, b"not really a jpeg").unwrap();
        let photo_dir = dir.path().join("meal_photos");

        let request = LogMealRequest {
            label: Some(MealLabel::Lunch),
            photo_source: Some(source),
            calories: Some(450.0),
            carb_grams: Some(60.0),
            ..LogMealRequest::default()
        };
        let logged = log_meal(&db, &FoodCatalog::builtin(), &photo_dir, request, now()).unwrap();

        let stored = PathBuf::from(logged.meal.photo_path.unwrap());
        assert_eq!(stored, photo_dir.join("meal_20251023_120000.jpg"));
        assert_eq!(std::fs::read(stored).unwrap(), b"not really a jpeg");
    }

    #[test]
    fn test_store_photo_rejects_other_types() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"x").unwrap();
        assert!(store_meal_photo(&source, dir.path(), now()).is_err());
    }

    #[test]
    fn test_list_meals_by_day() {
        let db = Database::in_memory().unwrap();
        let catalog = FoodCatalog::builtin();
        let dir = tempfile::tempdir().unwrap();

        for (day, kcal) in [(22, 300.0), (23, 200.0), (23, 150.0)] {
            let request = LogMealRequest {
                label: Some(MealLabel::Snack),
                date: NaiveDate::from_ymd_opt(2025, 10, day),
                calories: Some(kcal),
                carb_grams: Some(10.0),
                ..LogMealRequest::default()
            };
            log_meal(&db, &catalog, dir.path(), request, now()).unwrap();
        }

        let today = list_meals(&db, NaiveDate::from_ymd_opt(2025, 10, 23)).unwrap();
        assert_eq!(today.count, 2);
        assert_eq!(today.total_calories, 350.0);
        assert_eq!(today.total_carb_grams, 20.0);
        assert_eq!(list_meals(&db, None).unwrap().count, 3);
    }
}
