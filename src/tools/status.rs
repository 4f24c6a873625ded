//! PrediCare Status Tool
//!
//! Runtime status of the service and the usage guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::config::AppConfig;
use crate::energy::EnergyPolicy;

/// Usage guide for AI assistants; `{placeholders}` come from the active policy
const USAGE_TEMPLATE: &str = r#"
# PrediCare Usage Guide

PrediCare tracks meals, walks and body weight for a person managing
prediabetes during menopause. Targets are derived from the saved profile.

## 1. Profile first

Call `save_profile` once with birth_year, sex (female/male), height_cm,
weight_kg, target_weight_kg and activity_level (low, moderate, active,
very_active). The response includes:
- BMR (Mifflin-St Jeor)
- TDEE (BMR x activity factor: 1.2 / 1.375 / 1.55 / 1.725)
- daily calorie target = max({calorie_floor}, TDEE - {calorie_deficit})
- daily carbohydrate target ({carb_target} g)

`estimate_energy` computes the same figures without saving.

## 2. Meals

- `list_foods` shows the built-in food table (kcal and carbs per serving).
- `list_meal_templates` shows the example breakfast/lunch/dinner/snack.
- `estimate_meal` totals a selection such as
  `[{"food_name": "계란 1개", "servings": 2}]`. Unknown names count as zero
  and are listed under `unknown_items`.
- `log_meal` stores the meal. Pass `time` as "HH:MM"; malformed text falls
  back to the current time. Pass `calories`/`carb_grams` to override the
  estimate (for foods not in the table). `photo_path` copies a jpg/png into
  the photo directory.

## 3. Walking (knee friendly)

`estimate_walk` / `log_walk` take minutes plus distance_km and/or pace_kmh.
If one of distance or pace is missing it is derived from the other. Without a
pace, {default_pace} km/h is assumed. Calories = MET x 3.5 x weight / 200 x minutes with
MET from pace: <=3.5: 3.0, <=4.5: 3.8, <=5.5: 4.8, <=6.4: 6.0, faster: 6.5.

Guidance: 5 days a week, 30-45 minutes of brisk flat walking at 4.0-5.0 km/h,
keep pain at or below 3/10, avoid slopes, stairs and running.

## 4. Weight and statistics

- `log_weight` records a weight for a date (today by default).
- `get_daily_stats` returns per-day intake, burn, carbs, steps and weight.
- `get_weekly_report` averages the last 7 days (total / 7) and reports net
  calories per day.
- `render_charts` writes weight, calorie and carbohydrate PNG charts.
- `export_records` writes meals.csv, activities.csv and weights.csv to a zip.

## Notes

- Dates are ISO `YYYY-MM-DD`; times are `HH:MM`.
- Food names must match the table exactly, including spacing.
- Blood sugar and weight responses vary between people; symptoms should be
  discussed with a physician.
"#;

/// Usage guide with the configured targets filled in
pub fn usage_instructions(policy: &EnergyPolicy) -> String {
    USAGE_TEMPLATE
        .replace("{calorie_floor}", &policy.calorie_floor.to_string())
        .replace("{calorie_deficit}", &policy.calorie_deficit.to_string())
        .replace("{carb_target}", &policy.carb_target_grams.to_string())
        .replace("{default_pace}", &format!("{:.1}", policy.default_pace_kmh))
}

/// Runtime status of the PrediCare service
#[derive(Debug, Clone, Serialize)]
pub struct PredicareStatus {
    /// Build information
    pub version: &'static str,
    pub build_number: Option<u64>,
    pub build_timestamp: Option<&'static str>,

    /// Storage locations
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub photo_dir: String,
    pub export_dir: String,

    /// Active target policy
    pub policy: EnergyPolicy,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    photo_dir: PathBuf,
    export_dir: PathBuf,
    policy: EnergyPolicy,
}

impl StatusTracker {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            start_time: Instant::now(),
            database_path: config.database_path.clone(),
            photo_dir: config.photo_dir.clone(),
            export_dir: config.export_dir.clone(),
            policy: config.policy.clone(),
        }
    }

    pub fn get_status(&self) -> PredicareStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        PredicareStatus {
            version: build_info.version,
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            photo_dir: self.photo_dir.display().to_string(),
            export_dir: self.export_dir.display().to_string(),
            policy: self.policy.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_status_reports_config() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PREDICARE_DATABASE_PATH", "/nonexistent/predicare/health.db"),
            ("PREDICARE_CARB_TARGET_G", "130"),
        ]);
        let config = AppConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        let status = StatusTracker::new(&config).get_status();

        assert_eq!(status.database_path, "/nonexistent/predicare/health.db");
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.photo_dir, "/nonexistent/predicare/meal_photos");
        assert_eq!(status.policy.carb_target_grams, 130);
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_usage_mentions_every_logging_tool() {
        let text = usage_instructions(&EnergyPolicy::default());
        for tool in ["save_profile", "log_meal", "log_walk", "log_weight", "export_records"] {
            assert!(text.contains(tool), "{} missing", tool);
        }
        assert!(text.contains("max(1200, TDEE - 300)"));
        assert!(text.contains("(150 g)"));
        assert!(text.contains("4.0 km/h is assumed"));
    }

    #[test]
    fn test_usage_follows_configured_policy() {
        let policy = EnergyPolicy {
            calorie_deficit: 500.0,
            calorie_floor: 1400.0,
            carb_target_grams: 130,
            default_pace_kmh: 4.5,
        };
        let text = usage_instructions(&policy);
        assert!(text.contains("max(1400, TDEE - 500)"));
        assert!(text.contains("(130 g)"));
        assert!(text.contains("4.5 km/h is assumed"));
        assert!(!text.contains("{calorie"));
    }
}
