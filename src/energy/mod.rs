//! Energy estimation module
//!
//! Basal metabolic rate, daily expenditure, walking MET classification and the
//! calorie/carbohydrate target policy.

pub mod model;
pub mod walking;

pub use model::{
    basal_metabolic_rate, calories_from_met, total_daily_energy_expenditure, walking_met,
    ActivityLevel, EnergyEstimate, EnergyPolicy, Sex,
};
pub use walking::{reconcile_walk, DerivedQuantity, ReconciledWalk, WalkEstimate, WalkInput};
