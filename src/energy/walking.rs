//! Walking estimate
//!
//! Reconciles the minutes / distance / pace triple entered for a walk and
//! turns it into a MET value and calories burned.

use serde::{Deserialize, Serialize};

use super::model::{calories_from_met, walking_met, EnergyPolicy};

/// Which quantity was filled in from the other two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedQuantity {
    Distance,
    Pace,
    None,
}

impl DerivedQuantity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedQuantity::Distance => "distance",
            DerivedQuantity::Pace => "pace",
            DerivedQuantity::None => "none",
        }
    }
}

/// Raw walking input. Zero means "not entered".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkInput {
    pub minutes: f64,
    pub distance_km: f64,
    pub pace_kmh: f64,
}

/// Walking input after the one-shot reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciledWalk {
    pub minutes: f64,
    pub distance_km: f64,
    /// Entered or derived pace; still zero when neither was possible
    pub pace_kmh: f64,
    /// Pace used for the MET lookup, always positive
    pub effective_pace_kmh: f64,
    pub derived: DerivedQuantity,
}

/// Fill in at most one missing quantity.
///
/// Distance is derived from pace and minutes when distance is zero; otherwise
/// pace is derived from distance and minutes when pace is zero. If pace is
/// still zero, `default_pace_kmh` is used for the MET lookup only.
pub fn reconcile_walk(input: WalkInput, default_pace_kmh: f64) -> ReconciledWalk {
    let WalkInput { minutes, mut distance_km, mut pace_kmh } = input;
    let mut derived = DerivedQuantity::None;

    if pace_kmh > 0.0 && minutes > 0.0 && distance_km == 0.0 {
        distance_km = pace_kmh * (minutes / 60.0);
        derived = DerivedQuantity::Distance;
    } else if distance_km > 0.0 && minutes > 0.0 && pace_kmh == 0.0 {
        pace_kmh = distance_km / (minutes / 60.0);
        derived = DerivedQuantity::Pace;
    }

    let effective_pace_kmh = if pace_kmh > 0.0 { pace_kmh } else { default_pace_kmh };

    ReconciledWalk {
        minutes,
        distance_km,
        pace_kmh,
        effective_pace_kmh,
        derived,
    }
}

/// MET and calorie estimate for one walk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkEstimate {
    pub met_value: f64,
    pub calories_burned: f64,
    pub walk: ReconciledWalk,
}

impl WalkEstimate {
    pub fn compute(input: WalkInput, weight_kg: f64, policy: &EnergyPolicy) -> Self {
        let walk = reconcile_walk(input, policy.default_pace_kmh);
        let met_value = walking_met(walk.effective_pace_kmh);
        Self {
            met_value,
            calories_burned: calories_from_met(met_value, weight_kg, walk.minutes),
            walk,
        }
    }
}
