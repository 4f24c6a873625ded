//! Profile tools
//!
//! Save the user profile and report BMR / TDEE / daily targets.

use serde::Serialize;

use crate::db::Database;
use crate::energy::{EnergyEstimate, EnergyPolicy};
use crate::models::{Profile, StoredProfile};

/// Profile with the energy figures computed for the current year
#[derive(Debug, Serialize)]
pub struct ProfileDetail {
    pub profile: StoredProfile,
    pub age: i32,
    pub energy: EnergyEstimate,
    /// Kilograms left to reach the target weight (negative when below it)
    pub kg_to_target: f64,
}

/// Response for estimate_energy
#[derive(Debug, Serialize)]
pub struct EnergyEstimateResponse {
    pub age: i32,
    pub energy: EnergyEstimate,
}

/// Check the ranges the input form enforces. The energy formulas themselves
/// accept anything.
pub fn validate_profile(profile: &Profile, current_year: i32) -> Result<(), String> {
    if profile.birth_year < 1900 || profile.birth_year > current_year {
        return Err(format!("birth_year must be between 1900 and {}", current_year));
    }
    if profile.height_cm <= 0.0 {
        return Err("height_cm must be positive".to_string());
    }
    if profile.weight_kg <= 0.0 {
        return Err("weight_kg must be positive".to_string());
    }
    if profile.target_weight_kg <= 0.0 {
        return Err("target_weight_kg must be positive".to_string());
    }
    Ok(())
}

fn detail(stored: StoredProfile, policy: &EnergyPolicy, current_year: i32) -> ProfileDetail {
    let energy = EnergyEstimate::from_profile(&stored.profile, policy, current_year);
    ProfileDetail {
        age: stored.profile.age_in(current_year),
        kg_to_target: stored.profile.weight_kg - stored.profile.target_weight_kg,
        energy,
        profile: stored,
    }
}

/// Validate and compute the estimate without saving anything
pub fn estimate_energy(
    profile: &Profile,
    policy: &EnergyPolicy,
    current_year: i32,
) -> Result<EnergyEstimateResponse, String> {
    validate_profile(profile, current_year)?;
    Ok(EnergyEstimateResponse {
        age: profile.age_in(current_year),
        energy: EnergyEstimate::from_profile(profile, policy, current_year),
    })
}

/// Validate, compute targets and upsert the profile
pub fn save_profile(
    db: &Database,
    profile: Profile,
    policy: &EnergyPolicy,
    current_year: i32,
) -> Result<ProfileDetail, String> {
    validate_profile(&profile, current_year)?;
    store_profile(db, profile, policy, current_year)
}

/// Store an already validated profile with its computed targets
pub fn store_profile(
    db: &Database,
    profile: Profile,
    policy: &EnergyPolicy,
    current_year: i32,
) -> Result<ProfileDetail, String> {
    let estimate = EnergyEstimate::from_profile(&profile, policy, current_year);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = StoredProfile::save(&conn, &profile, &estimate)
        .map_err(|e| format!("Failed to save profile: {}", e))?;

    tracing::info!(
        "Profile saved: calorie target {} kcal, carb target {} g",
        stored.daily_calorie_target,
        stored.daily_carb_target_g
    );

    Ok(detail(stored, policy, current_year))
}

/// The saved profile with a freshly computed estimate
pub fn get_profile(
    db: &Database,
    policy: &EnergyPolicy,
    current_year: i32,
) -> Result<Option<ProfileDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let stored = StoredProfile::get(&conn).map_err(|e| format!("Failed to get profile: {}", e))?;
    Ok(stored.map(|s| detail(s, policy, current_year)))
}
