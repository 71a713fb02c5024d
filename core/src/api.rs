use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::ClientError;
use crate::models::{
    DailyLog, Exercise, Food, LogItem, MealAnalysis, MealPlan, NewFood, NewLogItem, NewMealPlan,
    NewWorkoutLog, NewWorkoutPlan, Token, User, UserProfile, WorkoutLog, WorkoutPlan,
};

/// The external nutrition service.
///
/// The CLI implements this with reqwest; tests use in-memory fakes. Every
/// mutation of a daily log answers with the full replacement aggregate for
/// that date.
pub trait NutritionApi: Send + Sync {
    /// Install (or with `None`, remove) the bearer credential sent with every request.
    fn set_credential(&self, token: Option<&str>);

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Token, ClientError>> + Send;

    fn current_user(&self) -> impl Future<Output = Result<User, ClientError>> + Send;

    fn fetch_daily_log(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DailyLog, ClientError>> + Send;

    fn log_items(
        &self,
        date: NaiveDate,
        items: &[NewLogItem],
    ) -> impl Future<Output = Result<DailyLog, ClientError>> + Send;

    fn update_item(
        &self,
        date: NaiveDate,
        item: &LogItem,
    ) -> impl Future<Output = Result<DailyLog, ClientError>> + Send;

    fn delete_item(
        &self,
        date: NaiveDate,
        log_item_id: i64,
    ) -> impl Future<Output = Result<DailyLog, ClientError>> + Send;

    fn replay_plan(
        &self,
        date: NaiveDate,
        plan_id: i64,
    ) -> impl Future<Output = Result<DailyLog, ClientError>> + Send;

    fn search_foods(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Food>, ClientError>> + Send;

    fn search_exercises(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Exercise>, ClientError>> + Send;

    fn analyze_meal(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<MealAnalysis, ClientError>> + Send;

    fn create_food(
        &self,
        food: &NewFood,
    ) -> impl Future<Output = Result<Food, ClientError>> + Send;

    fn save_meal_plan(
        &self,
        plan: &NewMealPlan,
    ) -> impl Future<Output = Result<MealPlan, ClientError>> + Send;

    fn list_meal_plans(&self) -> impl Future<Output = Result<Vec<MealPlan>, ClientError>> + Send;

    fn list_exercises(&self) -> impl Future<Output = Result<Vec<Exercise>, ClientError>> + Send;

    fn list_workout_plans(
        &self,
    ) -> impl Future<Output = Result<Vec<WorkoutPlan>, ClientError>> + Send;

    fn delete_workout_plan(
        &self,
        plan_id: i64,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn create_workout_plan(
        &self,
        plan: &NewWorkoutPlan,
    ) -> impl Future<Output = Result<WorkoutPlan, ClientError>> + Send;

    fn fetch_workout_plan(
        &self,
        plan_id: i64,
    ) -> impl Future<Output = Result<WorkoutPlan, ClientError>> + Send;

    fn log_workout(
        &self,
        log: &NewWorkoutLog,
    ) -> impl Future<Output = Result<WorkoutLog, ClientError>> + Send;

    /// Workout logs dated `start..=end`.
    fn list_workout_logs(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<Vec<WorkoutLog>, ClientError>> + Send;

    fn delete_workout_log(
        &self,
        log_id: i64,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn fetch_profile(&self) -> impl Future<Output = Result<UserProfile, ClientError>> + Send;

    fn create_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, ClientError>> + Send;

    fn update_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, ClientError>> + Send;
}

/// Anything the debouncer can issue lookups against.
pub trait SearchSource: Send + Sync {
    type Item: Clone + Send;

    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Self::Item>, ClientError>> + Send;
}

/// Incremental search over the user's food library.
pub struct FoodSearch<A>(pub Arc<A>);

impl<A: NutritionApi> SearchSource for FoodSearch<A> {
    type Item = Food;

    async fn search(&self, query: &str) -> Result<Vec<Food>, ClientError> {
        self.0.search_foods(query).await
    }
}

/// Incremental search over the exercise catalogue.
pub struct ExerciseSearch<A>(pub Arc<A>);

impl<A: NutritionApi> SearchSource for ExerciseSearch<A> {
    type Item = Exercise;

    async fn search(&self, query: &str) -> Result<Vec<Exercise>, ClientError> {
        self.0.search_exercises(query).await
    }
}
