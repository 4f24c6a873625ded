//! Nutrition module
//!
//! Food catalog lookups and calorie/carbohydrate aggregation.

pub mod aggregator;
pub mod catalog;

pub use aggregator::{
    aggregate, aggregate_template, describe_selections, expand_template, unknown_items,
    NutritionTotals, SelectionLine,
};
pub use catalog::{FoodCatalog, FoodCategory, FoodItem, FoodSort, MealTemplate};
