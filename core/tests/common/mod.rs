//! In-memory stand-in for the nutrition service.
//!
//! Requests are processed in the order they are issued; the response is then
//! held back for the delay queued with [`FakeApi::delay_next`]. This lets tests
//! make an earlier request answer later than a newer one.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use nutrilog_core::api::NutritionApi;
use nutrilog_core::error::ClientError;
use nutrilog_core::models::{
    DailyLog, Exercise, Food, LogItem, MacroTotals, MealAnalysis, MealPlan, NewFood, NewLogItem,
    NewMealPlan, NewWorkoutLog, NewWorkoutPlan, PlanExercise, Token, User, UserProfile, WorkoutLog,
    WorkoutPlan,
};

pub const GOOD_TOKEN: &str = "good-token";
pub const PASSWORD: &str = "secret";

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

pub fn item(name: &str, quantity_g: f64, calories: f64) -> NewLogItem {
    NewLogItem {
        name: name.to_string(),
        quantity_g,
        calories,
        protein: calories / 40.0,
        carbs: calories / 10.0,
        fat: calories / 100.0,
    }
}

fn totals(items: &[LogItem]) -> MacroTotals {
    items.iter().fold(MacroTotals::default(), |acc, i| MacroTotals {
        calories: acc.calories + i.calories,
        protein: acc.protein + i.protein,
        carbs: acc.carbs + i.carbs,
        fat: acc.fat + i.fat,
    })
}

fn not_found(what: &str) -> ClientError {
    ClientError::from_status(404, &format!(r#"{{"detail": "{what} not found"}}"#))
}

#[derive(Default)]
struct FakeState {
    logs: HashMap<NaiveDate, DailyLog>,
    next_id: i64,
    plans: Vec<MealPlan>,
    foods: Vec<Food>,
    exercises: Vec<Exercise>,
    workout_plans: Vec<WorkoutPlan>,
    workout_logs: Vec<WorkoutLog>,
    profile: Option<UserProfile>,
    credential: Option<String>,
    delays: VecDeque<Duration>,
    failures: VecDeque<ClientError>,
    calls: Vec<String>,
}

impl FakeState {
    fn log_mut(&mut self, date: NaiveDate) -> &mut DailyLog {
        self.logs.entry(date).or_insert_with(|| DailyLog {
            id: None,
            user_id: Some(1),
            date,
            total_macros: MacroTotals::default(),
            food_items: Vec::new(),
        })
    }

    fn append(&mut self, date: NaiveDate, items: &[NewLogItem]) -> DailyLog {
        let first_id = self.next_id + 1;
        self.next_id += items.len() as i64;
        let log = self.log_mut(date);
        for (offset, item) in (0_i64..).zip(items) {
            log.food_items.push(item.clone().with_id(first_id + offset));
        }
        log.total_macros = totals(&log.food_items);
        log.clone()
    }
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Store a log for `date` with the given items; totals are computed.
    pub fn seed_log(&self, date: NaiveDate, items: Vec<LogItem>) -> DailyLog {
        let mut state = self.lock();
        let max_id = items.iter().map(|i| i.log_item_id).max().unwrap_or(0);
        state.next_id = state.next_id.max(max_id);
        let log = DailyLog {
            id: Some(1),
            user_id: Some(1),
            date,
            total_macros: totals(&items),
            food_items: items,
        };
        state.logs.insert(date, log.clone());
        log
    }

    pub fn seed_plan(&self, id: i64, name: &str, items: Vec<NewLogItem>) {
        self.lock().plans.push(MealPlan {
            id,
            name: name.to_string(),
            items,
        });
    }

    pub fn seed_food(&self, id: i64, name: &str, calories_per_100g: f64) {
        self.lock().foods.push(Food {
            id,
            user_id: Some(1),
            name: name.to_string(),
            calories_per_100g,
            protein_per_100g: 5.0,
            carbs_per_100g: 10.0,
            fat_per_100g: 2.0,
        });
    }

    pub fn seed_exercise(&self, id: i64, name: &str, muscle_group: &str) {
        self.lock().exercises.push(Exercise {
            id,
            name: name.to_string(),
            muscle_group: muscle_group.to_string(),
            equipment: None,
            difficulty: "beginner".to_string(),
            instructions: None,
        });
    }

    pub fn seed_workout_plan(&self, id: i64, name: &str, exercises: Vec<PlanExercise>) {
        self.lock().workout_plans.push(WorkoutPlan {
            id,
            name: name.to_string(),
            goal_type: "general".to_string(),
            exercises,
        });
    }

    pub fn workout_logs(&self) -> Vec<WorkoutLog> {
        self.lock().workout_logs.clone()
    }

    /// Hold the response of the next request back for `delay`.
    pub fn delay_next(&self, delay: Duration) {
        self.lock().delays.push_back(delay);
    }

    /// Make the next request fail with `error`.
    pub fn fail_next(&self, error: ClientError) {
        self.lock().failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn credential(&self) -> Option<String> {
        self.lock().credential.clone()
    }

    pub fn server_log(&self, date: NaiveDate) -> Option<DailyLog> {
        self.lock().logs.get(&date).cloned()
    }

    async fn respond<T, F>(&self, call: &str, op: F) -> Result<T, ClientError>
    where
        F: FnOnce(&mut FakeState) -> Result<T, ClientError> + Send,
        T: Send,
    {
        let (delay, result) = {
            let mut state = self.lock();
            state.calls.push(call.to_string());
            let delay = state.delays.pop_front().unwrap_or_default();
            let result = match state.failures.pop_front() {
                Some(err) => Err(err),
                None => op(&mut state),
            };
            (delay, result)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

impl NutritionApi for FakeApi {
    fn set_credential(&self, token: Option<&str>) {
        self.lock().credential = token.map(str::to_string);
    }

    async fn login(&self, email: &str, password: &str) -> Result<Token, ClientError> {
        let ok = !email.is_empty() && password == PASSWORD;
        self.respond("login", move |_| {
            if ok {
                Ok(Token {
                    access_token: GOOD_TOKEN.to_string(),
                    token_type: "bearer".to_string(),
                })
            } else {
                Err(ClientError::from_status(
                    401,
                    r#"{"detail": "Incorrect email or password"}"#,
                ))
            }
        })
        .await
    }

    async fn current_user(&self) -> Result<User, ClientError> {
        self.respond("current_user", |state| {
            if state.credential.as_deref() == Some(GOOD_TOKEN) {
                Ok(User {
                    id: 1,
                    email: "cook@example.com".to_string(),
                    full_name: Some("Test Cook".to_string()),
                    is_active: true,
                    profile: state.profile.clone(),
                })
            } else {
                Err(ClientError::from_status(
                    401,
                    r#"{"detail": "Could not validate credentials"}"#,
                ))
            }
        })
        .await
    }

    async fn fetch_daily_log(&self, date: NaiveDate) -> Result<DailyLog, ClientError> {
        self.respond("fetch_daily_log", move |state| Ok(state.log_mut(date).clone()))
            .await
    }

    async fn log_items(&self, date: NaiveDate, items: &[NewLogItem]) -> Result<DailyLog, ClientError> {
        self.respond("log_items", move |state| Ok(state.append(date, items)))
            .await
    }

    async fn update_item(&self, date: NaiveDate, item: &LogItem) -> Result<DailyLog, ClientError> {
        self.respond("update_item", move |state| {
            let log = state.log_mut(date);
            let slot = log
                .food_items
                .iter_mut()
                .find(|i| i.log_item_id == item.log_item_id)
                .ok_or_else(|| not_found("Food item"))?;
            *slot = item.clone();
            log.total_macros = totals(&log.food_items);
            Ok(log.clone())
        })
        .await
    }

    async fn delete_item(&self, date: NaiveDate, log_item_id: i64) -> Result<DailyLog, ClientError> {
        self.respond("delete_item", move |state| {
            let log = state.log_mut(date);
            let before = log.food_items.len();
            log.food_items.retain(|i| i.log_item_id != log_item_id);
            if log.food_items.len() == before {
                return Err(not_found("Food item"));
            }
            log.total_macros = totals(&log.food_items);
            Ok(log.clone())
        })
        .await
    }

    async fn replay_plan(&self, date: NaiveDate, plan_id: i64) -> Result<DailyLog, ClientError> {
        self.respond("replay_plan", move |state| {
            let items = state
                .plans
                .iter()
                .find(|p| p.id == plan_id)
                .map(|p| p.items.clone())
                .ok_or_else(|| not_found("Meal plan"))?;
            Ok(state.append(date, &items))
        })
        .await
    }

    async fn search_foods(&self, query: &str) -> Result<Vec<Food>, ClientError> {
        let needle = query.to_lowercase();
        self.respond("search_foods", move |state| {
            Ok(state
                .foods
                .iter()
                .filter(|f| f.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        })
        .await
    }

    async fn search_exercises(&self, query: &str) -> Result<Vec<Exercise>, ClientError> {
        let needle = query.to_lowercase();
        self.respond("search_exercises", move |state| {
            Ok(state
                .exercises
                .iter()
                .filter(|e| e.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        })
        .await
    }

    async fn analyze_meal(&self, text: &str) -> Result<MealAnalysis, ClientError> {
        let text = text.trim().to_string();
        self.respond("analyze_meal", move |_| {
            let items = vec![item(&text, 100.0, 120.0)];
            Ok(MealAnalysis {
                totals: MacroTotals {
                    calories: 120.0,
                    protein: 3.0,
                    carbs: 12.0,
                    fat: 1.2,
                },
                items,
            })
        })
        .await
    }

    async fn create_food(&self, food: &NewFood) -> Result<Food, ClientError> {
        self.respond("create_food", move |state| {
            let created = Food {
                id: state.foods.len() as i64 + 1,
                user_id: Some(1),
                name: food.name.clone(),
                calories_per_100g: food.calories_per_100g,
                protein_per_100g: food.protein_per_100g,
                carbs_per_100g: food.carbs_per_100g,
                fat_per_100g: food.fat_per_100g,
            };
            state.foods.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn save_meal_plan(&self, plan: &NewMealPlan) -> Result<MealPlan, ClientError> {
        self.respond("save_meal_plan", move |state| {
            let saved = MealPlan {
                id: state.plans.len() as i64 + 1,
                name: plan.name.clone(),
                items: plan.items.clone(),
            };
            state.plans.push(saved.clone());
            Ok(saved)
        })
        .await
    }

    async fn list_meal_plans(&self) -> Result<Vec<MealPlan>, ClientError> {
        self.respond("list_meal_plans", |state| Ok(state.plans.clone()))
            .await
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, ClientError> {
        self.respond("list_exercises", |state| Ok(state.exercises.clone()))
            .await
    }

    async fn list_workout_plans(&self) -> Result<Vec<WorkoutPlan>, ClientError> {
        self.respond("list_workout_plans", |state| Ok(state.workout_plans.clone()))
            .await
    }

    async fn delete_workout_plan(&self, plan_id: i64) -> Result<(), ClientError> {
        self.respond("delete_workout_plan", move |state| {
            let before = state.workout_plans.len();
            state.workout_plans.retain(|p| p.id != plan_id);
            if state.workout_plans.len() == before {
                Err(not_found("Workout plan"))
            } else {
                Ok(())
            }
        })
        .await
    }

    async fn create_workout_plan(&self, plan: &NewWorkoutPlan) -> Result<WorkoutPlan, ClientError> {
        self.respond("create_workout_plan", move |state| {
            let created = WorkoutPlan {
                id: state.workout_plans.iter().map(|p| p.id).max().unwrap_or(0) + 1,
                name: plan.name.clone(),
                goal_type: plan.goal_type.clone(),
                exercises: plan.exercises.clone(),
            };
            state.workout_plans.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn fetch_workout_plan(&self, plan_id: i64) -> Result<WorkoutPlan, ClientError> {
        self.respond("fetch_workout_plan", move |state| {
            state
                .workout_plans
                .iter()
                .find(|p| p.id == plan_id)
                .cloned()
                .ok_or_else(|| not_found("Plan"))
        })
        .await
    }

    async fn log_workout(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, ClientError> {
        self.respond("log_workout", move |state| {
            let id = state.workout_logs.len() as i64 + 1;
            let exercises = log
                .exercises
                .iter()
                .enumerate()
                .map(|(n, e)| {
                    let mut e = e.clone();
                    if e.log_exercise_id.is_none() {
                        e.log_exercise_id = Some(format!("{id}-{n}"));
                    }
                    e
                })
                .collect();
            let created = WorkoutLog {
                id,
                date: log.date,
                notes: log.notes.clone(),
                exercises,
            };
            state.workout_logs.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn list_workout_logs(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutLog>, ClientError> {
        self.respond("list_workout_logs", move |state| {
            Ok(state
                .workout_logs
                .iter()
                .filter(|l| (start..=end).contains(&l.date))
                .cloned()
                .collect())
        })
        .await
    }

    async fn delete_workout_log(&self, log_id: i64) -> Result<(), ClientError> {
        self.respond("delete_workout_log", move |state| {
            state.workout_logs.retain(|l| l.id != log_id);
            Ok(())
        })
        .await
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ClientError> {
        self.respond("fetch_profile", |state| {
            state.profile.clone().ok_or_else(|| {
                ClientError::from_status(404, r#"{"detail": "Profile not found for this user"}"#)
            })
        })
        .await
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, ClientError> {
        self.respond("create_profile", move |state| {
            if state.profile.is_some() {
                return Err(ClientError::from_status(
                    400,
                    r#"{"detail": "Profile already exists for this user"}"#,
                ));
            }
            state.profile = Some(profile.clone());
            Ok(profile.clone())
        })
        .await
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, ClientError> {
        self.respond("update_profile", move |state| {
            let current = state.profile.as_mut().ok_or_else(|| {
                ClientError::from_status(404, r#"{"detail": "Profile not found, create one first"}"#)
            })?;
            *current = profile.clone();
            Ok(profile.clone())
        })
        .await
    }
}
