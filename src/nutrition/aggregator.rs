//! Nutrition aggregation
//!
//! Sums calories and carbohydrates over catalog selections. Unknown item
//! names contribute nothing.

use serde::{Deserialize, Serialize};

use super::catalog::{FoodCatalog, MealTemplate};

/// Calories and carbohydrate grams
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub carb_grams: f64,
}

impl NutritionTotals {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(calories: f64, carb_grams: f64) -> Self {
        Self { calories, carb_grams }
    }

    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            carb_grams: self.carb_grams * multiplier,
        }
    }
}

impl std::ops::Add for NutritionTotals {
    type Output = NutritionTotals;

    fn add(self, other: NutritionTotals) -> NutritionTotals {
        NutritionTotals {
            calories: self.calories + other.calories,
            carb_grams: self.carb_grams + other.carb_grams,
        }
    }
}

impl std::ops::Mul<f64> for NutritionTotals {
    type Output = NutritionTotals;

    fn mul(self, multiplier: f64) -> NutritionTotals {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for NutritionTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutritionTotals::zero(), |acc, n| acc + n)
    }
}

/// A catalog item name with the number of servings eaten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionLine {
    pub food_name: String,
    pub servings: f64,
}

impl SelectionLine {
    pub fn new(food_name: impl Into<String>, servings: f64) -> Self {
        Self {
            food_name: food_name.into(),
            servings,
        }
    }
}

/// Per-serving values for `name`, or zero when the catalog has no such item
fn per_serving(catalog: &FoodCatalog, name: &str) -> NutritionTotals {
    match catalog.get(name) {
        Some(item) => NutritionTotals::new(item.calories, item.carb_grams),
        None => {
            tracing::debug!("Food '{}' not in catalog, counted as zero", name);
            NutritionTotals::zero()
        }
    }
}

/// Contribution of a single line
pub fn line_totals(catalog: &FoodCatalog, line: &SelectionLine) -> NutritionTotals {
    per_serving(catalog, &line.food_name) * line.servings
}

/// Total calories and carbs over all lines
pub fn aggregate(catalog: &FoodCatalog, lines: &[SelectionLine]) -> NutritionTotals {
    lines.iter().map(|line| line_totals(catalog, line)).sum()
}

/// One line per template entry at a single serving
pub fn expand_template(template: &MealTemplate) -> Vec<SelectionLine> {
    template
        .items
        .iter()
        .map(|name| SelectionLine::new(name.clone(), 1.0))
        .collect()
}

pub fn aggregate_template(catalog: &FoodCatalog, template: &MealTemplate) -> NutritionTotals {
    aggregate(catalog, &expand_template(template))
}

/// Names in `lines` that the catalog does not know, in input order
pub fn unknown_items<'a>(catalog: &FoodCatalog, lines: &'a [SelectionLine]) -> Vec<&'a str> {
    lines
        .iter()
        .map(|line| line.food_name.as_str())
        .filter(|name| !catalog.contains(name))
        .collect()
}

/// Items text stored with a meal: `"name x1.5, name x1"` followed by any
/// free-text items
pub fn describe_selections(lines: &[SelectionLine], free_text: Option<&str>) -> String {
    let selected = lines
        .iter()
        .map(|line| format!("{} x{}", line.food_name, line.servings))
        .collect::<Vec<_>>()
        .join(", ");

    [Some(selected.as_str()), free_text.map(str::trim)]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_totals(actual: NutritionTotals, calories: f64, carbs: f64) {
        assert!((actual.calories - calories).abs() < 1e-9, "calories {}", actual.calories);
        assert!((actual.carb_grams - carbs).abs() < 1e-9, "carbs {}", actual.carb_grams);
    }

    #[test]
    fn test_aggregate_with_servings() {
        let catalog = FoodCatalog::builtin();
        let lines = vec![
            SelectionLine::new("현미밥 1/2공기(100g)", 1.0),
            SelectionLine::new("계란 1개", 2.0),
        ];
        assert_totals(aggregate(&catalog, &lines), 290.0, 34.2);
    }

    #[test]
    fn test_aggregate_unknown_item_is_zero() {
        let catalog = FoodCatalog::builtin();
        let lines = vec![SelectionLine::new("nonexistent-item", 3.0)];
        assert_eq!(aggregate(&catalog, &lines), NutritionTotals::zero());
        assert_eq!(unknown_items(&catalog, &lines), vec!["nonexistent-item"]);
    }

    #[test]
    fn test_aggregate_mixed_known_and_unknown() {
        let catalog = FoodCatalog::builtin();
        let lines = vec![
            SelectionLine::new("두부 100g", 0.5),
            SelectionLine::new("김치찌개", 1.0),
        ];
        assert_totals(aggregate(&catalog, &lines), 40.0, 1.0);
    }

    #[test]
    fn test_aggregate_order_independent() {
        let catalog = FoodCatalog::builtin();
        let forward = vec![
            SelectionLine::new("아몬드 25g", 1.0),
            SelectionLine::new("사과 1/2개", 2.0),
        ];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(aggregate(&catalog, &forward), aggregate(&catalog, &backward));
    }

    #[test]
    fn test_empty_selection() {
        let catalog = FoodCatalog::builtin();
        assert_eq!(aggregate(&catalog, &[]), NutritionTotals::zero());
    }

    #[test]
    fn test_template_aggregation() {
        let catalog = FoodCatalog::builtin();
        let breakfast = catalog.template("breakfast").unwrap();
        // 150 + 70 + 60 + 80 kcal, 33 + 0.6 + 8 + 2 g
        assert_totals(aggregate_template(&catalog, breakfast), 360.0, 43.6);
        assert!(expand_template(breakfast).iter().all(|l| l.servings == 1.0));
    }

    #[test]
    fn test_describe_selections() {
        let lines = vec![
            SelectionLine::new("계란 1개", 2.0),
            SelectionLine::new("두부 100g", 1.0),
        ];
        assert_eq!(describe_selections(&lines, None), "계란 1개 x2, 두부 100g x1");
        assert_eq!(
            describe_selections(&lines, Some(" 김치 ")),
            "계란 1개 x2, 두부 100g x1, 김치"
        );
        assert_eq!(describe_selections(&[], Some("샐러드")), "샐러드");
        assert_eq!(describe_selections(&[], Some("  ")), "");
    }

    #[test]
    fn test_totals_arithmetic() {
        let a = NutritionTotals::new(100.0, 10.0);
        let b = NutritionTotals::new(50.0, 5.0);
        assert_eq!(a + b, NutritionTotals::new(150.0, 15.0));
        assert_eq!(b * 2.0, NutritionTotals::new(100.0, 10.0));
    }
}
