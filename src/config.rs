//! Runtime configuration
//!
//! Paths and target policy, read from `PREDICARE_*` environment variables.

use std::path::{Path, PathBuf};

use crate::energy::EnergyPolicy;

pub const ENV_DATABASE_PATH: &str = "PREDICARE_DATABASE_PATH";
pub const ENV_PHOTO_DIR: &str = "PREDICARE_PHOTO_DIR";
pub const ENV_EXPORT_DIR: &str = "PREDICARE_EXPORT_DIR";
pub const ENV_CALORIE_DEFICIT: &str = "PREDICARE_CALORIE_DEFICIT";
pub const ENV_CALORIE_FLOOR: &str = "PREDICARE_CALORIE_FLOOR";
pub const ENV_CARB_TARGET_G: &str = "PREDICARE_CARB_TARGET_G";
pub const ENV_DEFAULT_PACE_KMH: &str = "PREDICARE_DEFAULT_PACE_KMH";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub photo_dir: PathBuf,
    pub export_dir: PathBuf,
    pub policy: EnergyPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(ENV_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_data_dir().join("health.db"));

        let data_dir = database_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let photo_dir = lookup(ENV_PHOTO_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("meal_photos"));
        let export_dir = lookup(ENV_EXPORT_DIR)
            .map(PathBuf::from)
            .unwrap_or(data_dir);

        let mut policy = EnergyPolicy::default();
        if let Some(v) = parse_number::<f64, _>(&lookup, ENV_CALORIE_DEFICIT) {
            policy.calorie_deficit = v;
        }
        if let Some(v) = parse_number::<f64, _>(&lookup, ENV_CALORIE_FLOOR) {
            policy.calorie_floor = v;
        }
        if let Some(v) = parse_number::<i64, _>(&lookup, ENV_CARB_TARGET_G) {
            policy.carb_target_grams = v;
        }
        if let Some(v) = parse_number::<f64, _>(&lookup, ENV_DEFAULT_PACE_KMH).filter(|p| *p > 0.0) {
            policy.default_pace_kmh = v;
        }

        Self {
            database_path,
            photo_dir,
            export_dir,
            policy,
        }
    }

    /// Create the data, photo and export directories
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.photo_dir)?;
        std::fs::create_dir_all(&self.export_dir)?;
        Ok(())
    }
}

fn parse_number<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

/// `<project>/data` when running from `target/{debug,release}`, otherwise
/// `data` next to the executable
fn default_data_dir() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(project_root) = path.parent().and_then(Path::parent) {
            path = project_root.to_path_buf();
        }
    }

    path.join("data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_dirs_follow_database_path() {
        let config = config_from(&[(ENV_DATABASE_PATH, "/srv/predicare/health.db")]);
        assert_eq!(config.database_path, PathBuf::from("/srv/predicare/health.db"));
        assert_eq!(config.photo_dir, PathBuf::from("/srv/predicare/meal_photos"));
        assert_eq!(config.export_dir, PathBuf::from("/srv/predicare"));
    }

    #[test]
    fn test_explicit_dirs() {
        let config = config_from(&[
            (ENV_DATABASE_PATH, "/srv/predicare/health.db"),
            (ENV_PHOTO_DIR, "/photos"),
            (ENV_EXPORT_DIR, "/exports"),
        ]);
        assert_eq!(config.photo_dir, PathBuf::from("/photos"));
        assert_eq!(config.export_dir, PathBuf::from("/exports"));
    }

    #[test]
    fn test_policy_overrides() {
        let config = config_from(&[
            (ENV_CALORIE_DEFICIT, "500"),
            (ENV_CALORIE_FLOOR, "1300"),
            (ENV_CARB_TARGET_G, "130"),
            (ENV_DEFAULT_PACE_KMH, "4.2"),
        ]);
        assert_eq!(config.policy.calorie_deficit, 500.0);
        assert_eq!(config.policy.calorie_floor, 1300.0);
        assert_eq!(config.policy.carb_target_grams, 130);
        assert_eq!(config.policy.default_pace_kmh, 4.2);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = config_from(&[
            (ENV_CALORIE_DEFICIT, "lots"),
            (ENV_DEFAULT_PACE_KMH, "-3"),
        ]);
        assert_eq!(config.policy, EnergyPolicy::default());
    }
}
