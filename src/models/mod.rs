//! Data models
//!
//! Rows of the profile, meal, activity and weight tables.

mod activity;
mod meal;
mod profile;
mod weight;

pub use activity::{ActivityKind, ActivityRecord, ActivityRecordCreate};
pub use meal::{MealLabel, MealRecord, MealRecordCreate, TIMESTAMP_FORMAT};
pub use profile::{Profile, StoredProfile};
pub use weight::WeightEntry;
