use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

impl MacroTotals {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.calories == 0.0 && self.protein == 0.0 && self.carbs == 0.0 && self.fat == 0.0
    }
}

/// The authoritative aggregate for one date, exactly as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub total_macros: MacroTotals,
    #[serde(default, deserialize_with = "deserialize_food_items")]
    pub food_items: Vec<LogItem>,
}

impl DailyLog {
    #[must_use]
    pub fn item(&self, log_item_id: i64) -> Option<&LogItem> {
        self.food_items.iter().find(|i| i.log_item_id == log_item_id)
    }
}

/// The service stores items as `{"items": [...]}`; older responses and our own
/// serialization use a bare list.
fn deserialize_food_items<'de, D>(deserializer: D) -> Result<Vec<LogItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FoodItems {
        Bare(Vec<LogItem>),
        Wrapped {
            #[serde(default)]
            items: Vec<LogItem>,
        },
    }

    Ok(match FoodItems::deserialize(deserializer)? {
        FoodItems::Bare(items) | FoodItems::Wrapped { items } => items,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogItem {
    pub log_item_id: i64,
    pub name: String,
    pub quantity_g: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl LogItem {
    #[must_use]
    pub fn to_new(&self) -> NewLogItem {
        NewLogItem {
            name: self.name.clone(),
            quantity_g: self.quantity_g,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// A priced item that has not been logged yet. Also the element type of a meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogItem {
    pub name: String,
    pub quantity_g: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NewLogItem {
    #[must_use]
    pub fn with_id(self, log_item_id: i64) -> LogItem {
        LogItem {
            log_item_id,
            name: self.name,
            quantity_g: self.quantity_g,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// Partial edit applied on top of a logged item before it is sent as a full record.
#[derive(Debug, Clone, Default)]
pub struct LogItemChanges {
    pub name: Option<String>,
    pub quantity_g: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl LogItemChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity_g.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
    }

    #[must_use]
    pub fn apply_to(&self, item: &LogItem) -> LogItem {
        LogItem {
            log_item_id: item.log_item_id,
            name: self.name.clone().unwrap_or_else(|| item.name.clone()),
            quantity_g: self.quantity_g.unwrap_or(item.quantity_g),
            calories: self.calories.unwrap_or(item.calories),
            protein: self.protein.unwrap_or(item.protein),
            carbs: self.carbs.unwrap_or(item.carbs),
            fat: self.fat.unwrap_or(item.fat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_plan_items")]
    pub items: Vec<NewLogItem>,
}

fn deserialize_plan_items<'de, D>(deserializer: D) -> Result<Vec<NewLogItem>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PlanItems {
        Bare(Vec<NewLogItem>),
        Wrapped {
            #[serde(default)]
            items: Vec<NewLogItem>,
        },
    }

    Ok(match PlanItems::deserialize(deserializer)? {
        PlanItems::Bare(items) | PlanItems::Wrapped { items } => items,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMealPlan {
    pub name: String,
    pub items: Vec<NewLogItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub items: Vec<NewLogItem>,
    #[serde(default)]
    pub totals: MacroTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

impl Food {
    /// Price `quantity_g` grams of this food.
    #[must_use]
    pub fn item_for(&self, quantity_g: f64) -> NewLogItem {
        let scale = quantity_g / 100.0;
        NewLogItem {
            name: self.name.clone(),
            quantity_g,
            calories: self.calories_per_100g * scale,
            protein: self.protein_per_100g * scale,
            carbs: self.carbs_per_100g * scale,
            fat: self.fat_per_100g * scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFood {
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub muscle_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExercise {
    pub exercise_id: i64,
    pub name: String,
    pub sets: i64,
    pub reps: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: i64,
    pub name: String,
    pub goal_type: String,
    #[serde(default)]
    pub exercises: Vec<PlanExercise>,
}

pub const WORKOUT_GOALS: &[&str] = &["general", "strength", "hypertrophy", "endurance"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutPlan {
    pub name: String,
    pub goal_type: String,
    pub exercises: Vec<PlanExercise>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
    pub reps: i64,
    /// Kilograms.
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedExercise {
    /// Assigned by the service when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_exercise_id: Option<String>,
    pub exercise_id: i64,
    pub exercise_name: String,
    #[serde(default)]
    pub sets: Vec<LoggedSet>,
}

impl LoggedExercise {
    /// Total reps times weight across all sets.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(|s| s.reps as f64 * s.weight).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkoutLog {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub exercises: Vec<LoggedExercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercises: Vec<LoggedExercise>,
}

impl WorkoutPlan {
    /// Plan exercises as empty log entries, ready to have sets filled in.
    #[must_use]
    pub fn to_log_exercises(&self) -> Vec<LoggedExercise> {
        self.exercises
            .iter()
            .map(|e| LoggedExercise {
                log_exercise_id: None,
                exercise_id: e.exercise_id,
                exercise_name: e.name.clone(),
                sets: Vec::new(),
            })
            .collect()
    }
}

pub const USER_GOALS: &[&str] = &["lose_weight", "maintain_weight", "gain_muscle"];
pub const ACTIVITY_LEVELS: &[&str] = &[
    "sedentary",
    "lightly_active",
    "moderately_active",
    "very_active",
    "extra_active",
];

/// Body profile. Sent as-is on create and update; the service fills the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub age: Option<i64>,
    /// Centimetres.
    #[serde(default)]
    pub height: Option<f64>,
    /// Kilograms.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// --- Validation ---

fn check_macro(field: &str, value: f64) -> Result<(), ClientError> {
    if !value.is_finite() {
        return Err(ClientError::Validation(format!("{field} must be a number")));
    }
    if value < 0.0 {
        return Err(ClientError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}

/// Validate a priced item before it is sent: name non-empty, quantity positive,
/// macros finite and non-negative.
pub fn validate_new_item(item: &NewLogItem) -> Result<(), ClientError> {
    if item.name.trim().is_empty() {
        return Err(ClientError::Validation(
            "Item name must not be empty".to_string(),
        ));
    }
    if !item.quantity_g.is_finite() || item.quantity_g <= 0.0 {
        return Err(ClientError::Validation(
            "quantity_g must be greater than 0".to_string(),
        ));
    }
    check_macro("calories", item.calories)?;
    check_macro("protein", item.protein)?;
    check_macro("carbs", item.carbs)?;
    check_macro("fat", item.fat)?;
    Ok(())
}

pub fn validate_items(items: &[NewLogItem]) -> Result<(), ClientError> {
    if items.is_empty() {
        return Err(ClientError::Validation(
            "At least one item must be provided".to_string(),
        ));
    }
    items.iter().try_for_each(validate_new_item)
}

/// Validate a food record: name must not be empty, per-100g values must not be negative.
pub fn validate_food_data(food: &NewFood) -> Result<(), ClientError> {
    if food.name.trim().is_empty() {
        return Err(ClientError::Validation(
            "Food name must not be empty".to_string(),
        ));
    }
    check_macro("calories_per_100g", food.calories_per_100g)?;
    check_macro("protein_per_100g", food.protein_per_100g)?;
    check_macro("carbs_per_100g", food.carbs_per_100g)?;
    check_macro("fat_per_100g", food.fat_per_100g)?;
    Ok(())
}

pub fn validate_plan(plan: &NewMealPlan) -> Result<(), ClientError> {
    if plan.name.trim().is_empty() {
        return Err(ClientError::Validation(
            "Meal plan name must not be empty".to_string(),
        ));
    }
    validate_items(&plan.items)
}

fn check_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), ClientError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )))
    }
}

pub fn validate_workout_plan(plan: &NewWorkoutPlan) -> Result<(), ClientError> {
    if plan.name.trim().is_empty() {
        return Err(ClientError::Validation(
            "Workout plan name must not be empty".to_string(),
        ));
    }
    check_choice("goal_type", &plan.goal_type, WORKOUT_GOALS)?;
    if plan.exercises.is_empty() {
        return Err(ClientError::Validation(
            "A workout plan needs at least one exercise".to_string(),
        ));
    }
    for exercise in &plan.exercises {
        if exercise.sets <= 0 {
            return Err(ClientError::Validation(format!(
                "{}: sets must be greater than 0",
                exercise.name
            )));
        }
        if exercise.reps.trim().is_empty() {
            return Err(ClientError::Validation(format!(
                "{}: reps must not be empty",
                exercise.name
            )));
        }
    }
    Ok(())
}

pub fn validate_workout_log(log: &NewWorkoutLog) -> Result<(), ClientError> {
    if log.exercises.is_empty() {
        return Err(ClientError::Validation(
            "A workout log needs at least one exercise".to_string(),
        ));
    }
    for exercise in &log.exercises {
        for set in &exercise.sets {
            if set.reps < 0 {
                return Err(ClientError::Validation(format!(
                    "{}: reps must not be negative",
                    exercise.exercise_name
                )));
            }
            check_macro("weight", set.weight)?;
        }
    }
    Ok(())
}

/// Profile values are optional, but those present must be plausible.
pub fn validate_profile(profile: &UserProfile) -> Result<(), ClientError> {
    if profile.age.is_some_and(|age| !(1..=150).contains(&age)) {
        return Err(ClientError::Validation(
            "age must be between 1 and 150".to_string(),
        ));
    }
    for (field, value) in [("height", profile.height), ("weight", profile.weight)] {
        if value.is_some_and(|v| !v.is_finite() || v <= 0.0) {
            return Err(ClientError::Validation(format!(
                "{field} must be greater than 0"
            )));
        }
    }
    if let Some(goal) = &profile.goal {
        check_choice("goal", goal, USER_GOALS)?;
    }
    if let Some(level) = &profile.activity_level {
        check_choice("activity_level", level, ACTIVITY_LEVELS)?;
    }
    Ok(())
}
