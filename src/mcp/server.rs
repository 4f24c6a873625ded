//! PrediCare MCP Server Implementation
//!
//! Exposes the profile, meal, walking, weight and statistics tools over MCP.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::db::Database;
use crate::energy::{ActivityLevel, Sex, WalkInput};
use crate::models::{MealLabel, Profile};
use crate::nutrition::{FoodCatalog, FoodCategory, FoodSort, SelectionLine};
use crate::tools::activities::{self, LogWalkRequest};
use crate::tools::meals::{self, LogMealRequest};
use crate::tools::status::{self, StatusTracker};
use crate::tools::{charts, export, profile, stats, weights};

/// PrediCare MCP Service
#[derive(Clone)]
pub struct PredicareService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    catalog: Arc<FoodCatalog>,
    config: Arc<AppConfig>,
    tool_router: ToolRouter<PredicareService>,
}

impl PredicareService {
    pub fn new(config: AppConfig, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(&config))),
            database,
            catalog: Arc::new(FoodCatalog::builtin()),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Parameter Helpers
// ============================================================================

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, McpError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d").map(Some).map_err(|_| {
            McpError::invalid_params(format!("{} must be YYYY-MM-DD, got '{}'", field, v), None)
        }),
    }
}

fn parse_sex(value: &str) -> Result<Sex, McpError> {
    Sex::from_str(value).ok_or_else(|| {
        McpError::invalid_params(format!("Unknown sex '{}'. Use 'female' or 'male'", value), None)
    })
}

fn parse_label(value: &str) -> Result<MealLabel, McpError> {
    MealLabel::from_str(value).ok_or_else(|| {
        McpError::invalid_params(
            format!("Unknown meal label '{}'. Use breakfast, lunch, dinner or snack", value),
            None,
        )
    })
}

// ============================================================================
// Profile Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProfileParams {
    /// Year of birth, e.g. 1973
    pub birth_year: i32,
    /// "female" or "male"
    pub sex: String,
    pub height_cm: f64,
    /// Current weight in kg
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    /// low, moderate, active or very_active (default moderate)
    #[serde(default = "default_activity_level")]
    pub activity_level: String,
    /// Knee care mode: prefer low-impact walking guidance (default true)
    #[serde(default = "default_true")]
    pub knee_care_mode: bool,
}

fn default_activity_level() -> String { "moderate".to_string() }
fn default_true() -> bool { true }

impl ProfileParams {
    fn into_profile(self) -> Result<Profile, McpError> {
        Ok(Profile {
            birth_year: self.birth_year,
            sex: parse_sex(&self.sex)?,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            target_weight_kg: self.target_weight_kg,
            activity_level: ActivityLevel::from_str(&self.activity_level),
            knee_care_mode: self.knee_care_mode,
        })
    }
}

// ============================================================================
// Catalog / Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    /// Substring to search for in food names
    pub query: Option<String>,
    /// grains, protein, vegetables, noodle_alternatives, snacks_and_dairy, fruit, fats
    pub category: Option<String>,
    /// name, calories_asc or calories_desc (default name)
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectionParam {
    /// Exact food name from list_foods
    pub food_name: String,
    /// Serving multiplier (default 1.0)
    #[serde(default = "default_servings")]
    pub servings: f64,
}

fn default_servings() -> f64 { 1.0 }

fn to_lines(items: Vec<SelectionParam>) -> Vec<SelectionLine> {
    items
        .into_iter()
        .map(|p| SelectionLine::new(p.food_name, p.servings))
        .collect()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EstimateMealParams {
    #[serde(default)]
    pub items: Vec<SelectionParam>,
    /// Template name or meal label; estimates the template instead of items
    pub template: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    /// breakfast, lunch, dinner or snack (optional when a template is given)
    pub label: Option<String>,
    /// YYYY-MM-DD (default today)
    pub date: Option<String>,
    /// HH:MM (default now)
    pub time: Option<String>,
    #[serde(default)]
    pub items: Vec<SelectionParam>,
    /// Template whose foods are added at one serving each
    pub template: Option<String>,
    /// Free-text items not in the food table
    pub items_text: Option<String>,
    /// Manual calorie total; replaces the estimate
    pub calories: Option<f64>,
    /// Manual carbohydrate total in grams; replaces the estimate
    pub carb_grams: Option<f64>,
    /// Path to a jpg/png meal photo to copy into the photo directory
    pub photo_path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// YYYY-MM-DD; omit for all records
    pub date: Option<String>,
}

// ============================================================================
// Walking / Weight / Stats Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WalkParams {
    pub minutes: f64,
    /// Distance in km (0 or omitted = unknown)
    #[serde(default)]
    pub distance_km: f64,
    /// Average pace in km/h (0 or omitted = unknown)
    #[serde(default)]
    pub pace_kmh: f64,
    /// Overrides the profile weight
    pub weight_kg: Option<f64>,
}

impl WalkParams {
    fn input(&self) -> WalkInput {
        WalkInput {
            minutes: self.minutes,
            distance_km: self.distance_km,
            pace_kmh: self.pace_kmh,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogWalkParams {
    #[serde(flatten)]
    pub walk: WalkParams,
    pub steps: Option<i64>,
    /// YYYY-MM-DD (default today)
    pub date: Option<String>,
    /// HH:MM (default now)
    pub time: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogWeightParams {
    pub weight_kg: f64,
    /// YYYY-MM-DD (default today)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    /// YYYY-MM-DD, inclusive
    pub start_date: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WeeklyReportParams {
    /// Last day of the 7-day window (default today)
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct TemplateListing<'a> {
    name: &'a str,
    label: &'a str,
    items: &'a [String],
    calories: f64,
    carb_grams: f64,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl PredicareService {
    // --- Status ---

    #[tool(description = "Get the current status of the PrediCare service including build info, storage paths, target policy and process information")]
    async fn predicare_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status())
    }

    #[tool(description = "Get the usage guide: how targets are computed and how to log meals, walks and weights. Call this when starting a session.")]
    fn usage_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(status::usage_instructions(
            &self.config.policy,
        ))]))
    }

    // --- Profile ---

    #[tool(description = "Get the saved profile with BMR, TDEE and daily calorie/carbohydrate targets")]
    fn get_profile(&self) -> Result<CallToolResult, McpError> {
        let result = profile::get_profile(&self.database, &self.config.policy, now().year())
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(detail) => json_result(&detail),
            None => Ok(CallToolResult::success(vec![Content::text(
                "No profile saved yet. Use save_profile first.",
            )])),
        }
    }

    #[tool(description = "Save the profile (single row) and compute the daily calorie and carbohydrate targets")]
    fn save_profile(&self, Parameters(p): Parameters<ProfileParams>) -> Result<CallToolResult, McpError> {
        let year = now().year();
        let data = p.into_profile()?;
        profile::validate_profile(&data, year).map_err(|e| McpError::invalid_params(e, None))?;
        let result = profile::store_profile(&self.database, data, &self.config.policy, year)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Compute BMR, TDEE and daily targets for the given body data without saving")]
    fn estimate_energy(&self, Parameters(p): Parameters<ProfileParams>) -> Result<CallToolResult, McpError> {
        let data = p.into_profile()?;
        let result = profile::estimate_energy(&data, &self.config.policy, now().year())
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    // --- Catalog ---

    #[tool(description = "List the built-in food table (kcal and carbohydrate grams per serving), with optional search, category filter and sort")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        let category = match p.category.as_deref() {
            Some(c) => Some(FoodCategory::from_str(c).ok_or_else(|| {
                McpError::invalid_params(format!("Unknown food category '{}'", c), None)
            })?),
            None => None,
        };
        let sort = p.sort.as_deref().map(FoodSort::from_str).unwrap_or(FoodSort::Name);
        let foods = self.catalog.search(p.query.as_deref(), category, sort);
        json_result(&foods)
    }

    #[tool(description = "List the example meal templates with their foods and totals")]
    fn list_meal_templates(&self) -> Result<CallToolResult, McpError> {
        let listing: Vec<TemplateListing> = self
            .catalog
            .templates()
            .iter()
            .map(|t| {
                let totals = crate::nutrition::aggregate_template(&self.catalog, t);
                TemplateListing {
                    name: &t.name,
                    label: t.label.as_str(),
                    items: &t.items,
                    calories: totals.calories,
                    carb_grams: totals.carb_grams,
                }
            })
            .collect();
        json_result(&listing)
    }

    // --- Meals ---

    #[tool(description = "Estimate calories and carbohydrates for selected foods and servings, or for a template. Unknown foods count as zero.")]
    fn estimate_meal(&self, Parameters(p): Parameters<EstimateMealParams>) -> Result<CallToolResult, McpError> {
        match p.template.as_deref() {
            Some(key) => {
                let result = meals::estimate_template(&self.catalog, key)
                    .map_err(|e| McpError::invalid_params(e, None))?;
                json_result(&result)
            }
            None => {
                let result = meals::estimate_meal(&self.catalog, &to_lines(p.items))
                    .map_err(|e| McpError::invalid_params(e, None))?;
                json_result(&result)
            }
        }
    }

    #[tool(description = "Log a meal from selected foods, a template and/or free text. Manual calories/carb_grams override the estimate. Optional photo_path copies a jpg/png photo.")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let request = LogMealRequest {
            label: p.label.as_deref().map(parse_label).transpose()?,
            date: parse_date("date", p.date.as_deref())?,
            time_text: p.time,
            time: None,
            selections: to_lines(p.items),
            template: p.template,
            items_text: p.items_text,
            calories: p.calories,
            carb_grams: p.carb_grams,
            photo_source: p.photo_path.map(PathBuf::from),
        };
        let result = meals::log_meal(&self.database, &self.catalog, &self.config.photo_dir, request, now())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List logged meals for a date (or all meals) with calorie and carbohydrate totals")]
    fn list_meals(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date("date", p.date.as_deref())?;
        let result = meals::list_meals(&self.database, date).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Walking ---

    #[tool(description = "Estimate MET and calories for a walk. Missing distance or pace is derived from the other; 4.0 km/h is assumed when pace is unknown.")]
    fn estimate_walk(&self, Parameters(p): Parameters<WalkParams>) -> Result<CallToolResult, McpError> {
        let result = activities::estimate_walk(&self.database, p.input(), p.weight_kg, &self.config.policy)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Log a walk. Calories are computed from the pace MET and the profile weight (or weight_kg).")]
    fn log_walk(&self, Parameters(p): Parameters<LogWalkParams>) -> Result<CallToolResult, McpError> {
        let current = now();
        let date = parse_date("date", p.date.as_deref())?.unwrap_or(current.date());
        let time = meals::parse_time_of_day(p.time.as_deref(), current.time());
        let request = LogWalkRequest {
            walk: p.walk.input(),
            steps: p.steps,
            weight_kg: p.walk.weight_kg,
            timestamp: Some(date.and_time(time)),
        };
        let result = activities::log_walk(&self.database, request, &self.config.policy, current)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List logged walks for a date (or all) with minute and calorie totals")]
    fn list_activities(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date("date", p.date.as_deref())?;
        let result = activities::list_activities(&self.database, date)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Weight ---

    #[tool(description = "Record body weight for a date (default today); returns the change from the previous entry")]
    fn log_weight(&self, Parameters(p): Parameters<LogWeightParams>) -> Result<CallToolResult, McpError> {
        let date = parse_date("date", p.date.as_deref())?.unwrap_or(now().date());
        let result = weights::log_weight(&self.database, date, p.weight_kg)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "List weight entries in an optional date range, plus the latest weight and its change")]
    fn list_weights(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let start = parse_date("start_date", p.start_date.as_deref())?;
        let end = parse_date("end_date", p.end_date.as_deref())?;
        let result = weights::list_weights(&self.database, start, end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Statistics ---

    #[tool(description = "Per-day intake kcal, burn kcal, carbohydrates, steps and weight for an optional date range, with the profile targets")]
    fn get_daily_stats(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let start = parse_date("start_date", p.start_date.as_deref())?;
        let end = parse_date("end_date", p.end_date.as_deref())?;
        let result = stats::daily_stats(&self.database, start, end)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Today's intake, burn and carbohydrates against the daily targets, with what remains")]
    fn get_today_summary(&self) -> Result<CallToolResult, McpError> {
        let result = stats::today_summary(&self.database, now().date())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Weekly report over the last 7 days: average intake and burn per day (total / 7) and net calories")]
    fn get_weekly_report(&self, Parameters(p): Parameters<WeeklyReportParams>) -> Result<CallToolResult, McpError> {
        let end = parse_date("end_date", p.end_date.as_deref())?.unwrap_or(now().date());
        let result = stats::weekly_report(&self.database, end).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Render weight trend, calorie in/out and carbohydrate PNG charts into the export directory")]
    fn render_charts(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let start = parse_date("start_date", p.start_date.as_deref())?;
        let end = parse_date("end_date", p.end_date.as_deref())?;
        let out_dir = self.config.export_dir.join("charts");
        let result = charts::render_charts(&self.database, &out_dir, start, end, now())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Export ---

    #[tool(description = "Export meals, activities and weights as CSV files in a zip archive")]
    fn export_records(&self) -> Result<CallToolResult, McpError> {
        let result = export::export_records(&self.database, &self.config.export_dir)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

#[tool_handler]
impl ServerHandler for PredicareService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "predicare".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("PrediCare".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "PrediCare - meal, walking and weight tracking for prediabetes during menopause. \
                 IMPORTANT: Call usage_instructions first. Save a profile before logging walks. \
                 Profile: get_profile, save_profile, estimate_energy. \
                 Foods: list_foods, list_meal_templates, estimate_meal. \
                 Meals: log_meal, list_meals. \
                 Walking: estimate_walk, log_walk, list_activities. \
                 Weight: log_weight, list_weights. \
                 Statistics: get_daily_stats, get_today_summary, get_weekly_report, render_charts. \
                 Export: export_records."
                    .into(),
            ),
        }
    }
}
