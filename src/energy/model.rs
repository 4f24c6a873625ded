//! Energy model
//!
//! Closed-form energy formulas: Mifflin-St Jeor BMR, activity-factor TDEE,
//! pace-bucketed walking MET and MET-to-kcal conversion.

use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Factor applied when the activity level text is not recognized
pub const DEFAULT_ACTIVITY_FACTOR: f64 = 1.375;

/// Default moderate deficit below TDEE (kcal/day)
pub const DEFAULT_CALORIE_DEFICIT: f64 = 300.0;

/// Lowest daily calorie target ever recommended (kcal/day)
pub const DEFAULT_CALORIE_FLOOR: f64 = 1200.0;

/// Fixed daily carbohydrate target (g/day)
pub const DEFAULT_CARB_TARGET_G: i64 = 150;

/// Pace assumed for MET lookup when none was entered or derived (km/h)
pub const DEFAULT_WALKING_PACE_KMH: f64 = 4.0;

/// Biological sex, as used by the Mifflin-St Jeor constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" | "woman" | "여성" | "여" => Some(Sex::Female),
            "male" | "m" | "man" | "남성" | "남" => Some(Sex::Male),
            _ => None,
        }
    }

    /// Sex-specific constant of the Mifflin-St Jeor equation
    pub fn bmr_constant(&self) -> f64 {
        match self {
            Sex::Male => 5.0,
            Sex::Female => -161.0,
        }
    }
}

/// Usual daily activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    Moderate,
    Active,
    VeryActive,
    /// Text that matched no known level; scored with the moderate factor
    Unrecognized,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::Unrecognized => "unrecognized",
        }
    }

    /// Parse an activity level. Never fails: unknown text maps to
    /// [`ActivityLevel::Unrecognized`].
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "low" | "sedentary" | "낮음" => ActivityLevel::Low,
            "moderate" | "normal" | "보통" => ActivityLevel::Moderate,
            "active" | "활동적" => ActivityLevel::Active,
            "very_active" | "veryactive" | "매우_활동적" => ActivityLevel::VeryActive,
            other => {
                tracing::warn!(
                    "Unrecognized activity level '{}', using factor {}",
                    other,
                    DEFAULT_ACTIVITY_FACTOR
                );
                ActivityLevel::Unrecognized
            }
        }
    }

    /// TDEE multiplier for this level
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Low => 1.2,
            ActivityLevel::Moderate => 1.375,
            ActivityLevel::Active => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::Unrecognized => DEFAULT_ACTIVITY_FACTOR,
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate (kcal/day).
///
/// Inputs are not validated; zero or negative body measurements give a
/// meaningless but finite number.
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: i32, sex: Sex) -> f64 {
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + sex.bmr_constant()
}

/// Total daily energy expenditure: BMR scaled by the activity factor
pub fn total_daily_energy_expenditure(bmr: f64, activity_level: ActivityLevel) -> f64 {
    bmr * activity_level.factor()
}

/// MET value for walking at the given pace. Each bucket includes its upper
/// bound.
pub fn walking_met(pace_kmh: f64) -> f64 {
    if pace_kmh <= 3.5 {
        3.0
    } else if pace_kmh <= 4.5 {
        3.8
    } else if pace_kmh <= 5.5 {
        4.8
    } else if pace_kmh <= 6.4 {
        6.0
    } else {
        6.5
    }
}

/// Calories burned for `minutes` of activity at `met`. Unrounded.
pub fn calories_from_met(met: f64, weight_kg: f64, minutes: f64) -> f64 {
    met * 3.5 * weight_kg / 200.0 * minutes
}

/// Target policy. These encode a recommendation choice, so they are kept as
/// data rather than literals in the formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPolicy {
    pub calorie_deficit: f64,
    pub calorie_floor: f64,
    pub carb_target_grams: i64,
    pub default_pace_kmh: f64,
}

impl Default for EnergyPolicy {
    fn default() -> Self {
        Self {
            calorie_deficit: DEFAULT_CALORIE_DEFICIT,
            calorie_floor: DEFAULT_CALORIE_FLOOR,
            carb_target_grams: DEFAULT_CARB_TARGET_G,
            default_pace_kmh: DEFAULT_WALKING_PACE_KMH,
        }
    }
}

impl EnergyPolicy {
    /// `max(floor, tdee - deficit)`, truncated to whole kcal
    pub fn daily_calorie_target(&self, tdee: f64) -> i64 {
        self.calorie_floor.max(tdee - self.calorie_deficit) as i64
    }

    pub fn daily_carb_target_grams(&self) -> i64 {
        self.carb_target_grams
    }
}

/// Energy figures derived from a profile. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub bmr: f64,
    pub tdee: f64,
    pub daily_calorie_target: i64,
    pub daily_carb_target_grams: i64,
}

impl EnergyEstimate {
    pub fn compute(
        weight_kg: f64,
        height_cm: f64,
        age: i32,
        sex: Sex,
        activity_level: ActivityLevel,
        policy: &EnergyPolicy,
    ) -> Self {
        let bmr = basal_metabolic_rate(weight_kg, height_cm, age, sex);
        let tdee = total_daily_energy_expenditure(bmr, activity_level);
        Self {
            bmr,
            tdee,
            daily_calorie_target: policy.daily_calorie_target(tdee),
            daily_carb_target_grams: policy.daily_carb_target_grams(),
        }
    }

    /// Estimate for `profile`, taking age as `current_year - birth_year`
    pub fn from_profile(profile: &Profile, policy: &EnergyPolicy, current_year: i32) -> Self {
        Self::compute(
            profile.weight_kg,
            profile.height_cm,
            profile.age_in(current_year),
            profile.sex,
            profile.activity_level,
            policy,
        )
    }
}
