//! Built-in food catalog
//!
//! Per-serving calories and carbohydrate grams for a diabetes-friendly food
//! list, plus example meal templates. The table is fixed at build time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::MealLabel;

/// Food group, used for browsing the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Grains,
    Protein,
    Vegetables,
    NoodleAlternatives,
    SnacksAndDairy,
    Fruit,
    Fats,
}

impl FoodCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Grains => "grains",
            FoodCategory::Protein => "protein",
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::NoodleAlternatives => "noodle_alternatives",
            FoodCategory::SnacksAndDairy => "snacks_and_dairy",
            FoodCategory::Fruit => "fruit",
            FoodCategory::Fats => "fats",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "grains" | "grain" | "rice" | "곡류" => Some(FoodCategory::Grains),
            "protein" | "단백질" => Some(FoodCategory::Protein),
            "vegetables" | "vegetable" | "salad" | "채소" => Some(FoodCategory::Vegetables),
            "noodle_alternatives" | "noodles" | "면" => Some(FoodCategory::NoodleAlternatives),
            "snacks_and_dairy" | "snacks" | "dairy" | "nuts" | "간식" => Some(FoodCategory::SnacksAndDairy),
            "fruit" | "fruits" | "과일" => Some(FoodCategory::Fruit),
            "fats" | "fat" | "oil" | "지방" => Some(FoodCategory::Fats),
            _ => None,
        }
    }
}

/// One catalog entry, valued per reference serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub calories: f64,
    pub carb_grams: f64,
    pub category: FoodCategory,
}

/// Named, ordered list of catalog item names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealTemplate {
    pub name: String,
    pub label: MealLabel,
    pub items: Vec<String>,
}

/// Sort order for catalog listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodSort {
    Name,
    CaloriesAsc,
    CaloriesDesc,
}

impl FoodSort {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "calories" | "calories_asc" | "low" => FoodSort::CaloriesAsc,
            "calories_desc" | "high" => FoodSort::CaloriesDesc,
            _ => FoodSort::Name,
        }
    }
}

/// (name, kcal, carb g, category)
const BUILTIN_FOODS: &[(&str, f64, f64, FoodCategory)] = &[
    ("현미밥 1/2공기(100g)", 150.0, 33.0, FoodCategory::Grains),
    ("현미밥 1공기(200g)", 300.0, 66.0, FoodCategory::Grains),
    ("잡곡밥 1공기", 320.0, 68.0, FoodCategory::Grains),
    ("곤약밥 1공기", 180.0, 40.0, FoodCategory::Grains),
    ("닭가슴살 100g", 165.0, 0.0, FoodCategory::Protein),
    ("두부 100g", 80.0, 2.0, FoodCategory::Protein),
    ("계란 1개", 70.0, 0.6, FoodCategory::Protein),
    ("연어 120g", 240.0, 0.0, FoodCategory::Protein),
    ("고등어 120g", 250.0, 0.0, FoodCategory::Protein),
    ("샐러드(채소) 1접시", 60.0, 8.0, FoodCategory::Vegetables),
    ("찐브로콜리 1접시", 55.0, 11.0, FoodCategory::Vegetables),
    ("시금치나물 1접시", 70.0, 7.0, FoodCategory::Vegetables),
    ("곤약면 1인분", 25.0, 2.0, FoodCategory::NoodleAlternatives),
    ("현미국수 1인분", 380.0, 78.0, FoodCategory::NoodleAlternatives),
    ("플레인 요거트 150g", 95.0, 11.0, FoodCategory::SnacksAndDairy),
    ("아몬드 25g", 145.0, 5.0, FoodCategory::SnacksAndDairy),
    ("방울토마토 10개", 30.0, 7.0, FoodCategory::SnacksAndDairy),
    ("사과 1/2개", 50.0, 14.0, FoodCategory::Fruit),
    ("바나나 1/2개", 45.0, 12.0, FoodCategory::Fruit),
    ("올리브오일 1작은술", 40.0, 0.0, FoodCategory::Fats),
];

const BUILTIN_TEMPLATES: &[(&str, MealLabel, &[&str])] = &[
    (
        "아침(예시)",
        MealLabel::Breakfast,
        &["현미밥 1/2공기(100g)", "계란 1개", "샐러드(채소) 1접시", "두부 100g"],
    ),
    (
        "점심(예시)",
        MealLabel::Lunch,
        &["곤약면 1인분", "닭가슴살 100g", "샐러드(채소) 1접시", "올리브오일 1작은술"],
    ),
    (
        "저녁(예시)",
        MealLabel::Dinner,
        &["연어 120g", "찐브로콜리 1접시", "두부 100g"],
    ),
    (
        "간식(예시)",
        MealLabel::Snack,
        &["플레인 요거트 150g", "아몬드 25g"],
    ),
];

/// Immutable food lookup table with meal templates
#[derive(Debug, Clone)]
pub struct FoodCatalog {
    items: Vec<FoodItem>,
    index: HashMap<String, usize>,
    templates: Vec<MealTemplate>,
}

impl FoodCatalog {
    /// Build a catalog. A later item with a duplicate name replaces the
    /// earlier one in lookups.
    pub fn new(items: Vec<FoodItem>, templates: Vec<MealTemplate>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.name.clone(), i))
            .collect();
        Self { items, index, templates }
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> Self {
        let items = BUILTIN_FOODS
            .iter()
            .map(|&(name, calories, carb_grams, category)| FoodItem {
                name: name.to_string(),
                calories,
                carb_grams,
                category,
            })
            .collect();
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|&(name, label, items)| MealTemplate {
                name: name.to_string(),
                label,
                items: items.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self::new(items, templates)
    }

    pub fn get(&self, name: &str) -> Option<&FoodItem> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &FoodItem> {
        self.items.iter()
    }

    /// Items whose name contains `query`, optionally limited to one category,
    /// in the requested order
    pub fn search(
        &self,
        query: Option<&str>,
        category: Option<FoodCategory>,
        sort: FoodSort,
    ) -> Vec<&FoodItem> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let mut found: Vec<&FoodItem> = self
            .items
            .iter()
            .filter(|item| query.map_or(true, |q| item.name.contains(q)))
            .filter(|item| category.map_or(true, |c| item.category == c))
            .collect();

        match sort {
            FoodSort::Name => found.sort_by(|a, b| a.name.cmp(&b.name)),
            FoodSort::CaloriesAsc => found.sort_by(|a, b| a.calories.total_cmp(&b.calories)),
            FoodSort::CaloriesDesc => found.sort_by(|a, b| b.calories.total_cmp(&a.calories)),
        }
        found
    }

    pub fn templates(&self) -> &[MealTemplate] {
        &self.templates
    }

    /// Find a template by its name, or by meal label ("breakfast", "아침", ...)
    pub fn template(&self, key: &str) -> Option<&MealTemplate> {
        let key = key.trim();
        self.templates
            .iter()
            .find(|t| t.name == key)
            .or_else(|| {
                let label = MealLabel::from_str(key)?;
                self.templates.iter().find(|t| t.label == label)
            })
    }
}

impl Default for FoodCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
