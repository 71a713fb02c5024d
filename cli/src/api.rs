use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use nutrilog_core::api::NutritionApi;
use nutrilog_core::error::ClientError;
use nutrilog_core::models::{
    DailyLog, Exercise, Food, LogItem, MealAnalysis, MealPlan, NewFood, NewLogItem, NewMealPlan,
    NewWorkoutLog, NewWorkoutPlan, Token, User, UserProfile, WorkoutLog, WorkoutPlan,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// reqwest-backed client for the nutrition service.
///
/// The bearer token lives behind a lock so the session can install or remove
/// it while the client is shared.
pub struct HttpNutritionApi {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpNutritionApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("nutrilog-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "request");
        let req = self.client.request(method, url);
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_deref() {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn send_raw(req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to reach nutrition service: {e}")))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), %body, "request failed");
        Err(ClientError::from_status(status.as_u16(), &body))
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ClientError> {
        Self::send_raw(req)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to parse response: {e}")))
    }
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn date_query(date: NaiveDate) -> [(&'static str, String); 1] {
    [("log_date", ymd(date))]
}

impl NutritionApi for HttpNutritionApi {
    fn set_credential(&self, token: Option<&str>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.map(str::to_string);
    }

    async fn login(&self, email: &str, password: &str) -> Result<Token, ClientError> {
        let req = self
            .request(Method::POST, "/login/token")
            .form(&[("username", email), ("password", password)]);
        Self::send(req).await
    }

    async fn current_user(&self) -> Result<User, ClientError> {
        Self::send(self.request(Method::GET, "/users/me")).await
    }

    async fn fetch_daily_log(&self, date: NaiveDate) -> Result<DailyLog, ClientError> {
        let req = self
            .request(Method::GET, "/nutrition/meals/by-date")
            .query(&date_query(date));
        Self::send(req).await
    }

    async fn log_items(&self, date: NaiveDate, items: &[NewLogItem]) -> Result<DailyLog, ClientError> {
        let req = self
            .request(Method::POST, "/nutrition/meals/log")
            .query(&date_query(date))
            .json(&json!({ "items_to_log": items }));
        Self::send(req).await
    }

    async fn update_item(&self, date: NaiveDate, item: &LogItem) -> Result<DailyLog, ClientError> {
        let path = format!("/nutrition/meals/log-item/{}", item.log_item_id);
        let req = self
            .request(Method::PUT, &path)
            .query(&date_query(date))
            .json(item);
        Self::send(req).await
    }

    async fn delete_item(&self, date: NaiveDate, log_item_id: i64) -> Result<DailyLog, ClientError> {
        let req = self
            .request(Method::DELETE, "/nutrition/meals/log-item")
            .json(&json!({ "date": date, "log_item_id": log_item_id }));
        Self::send(req).await
    }

    async fn replay_plan(&self, date: NaiveDate, plan_id: i64) -> Result<DailyLog, ClientError> {
        let path = format!("/nutrition/meal-plans/{plan_id}/log");
        let req = self
            .request(Method::POST, &path)
            .query(&date_query(date));
        Self::send(req).await
    }

    async fn search_foods(&self, query: &str) -> Result<Vec<Food>, ClientError> {
        let req = self
            .request(Method::GET, "/nutrition/foods/search")
            .query(&[("query", query)]);
        Self::send(req).await
    }

    async fn search_exercises(&self, query: &str) -> Result<Vec<Exercise>, ClientError> {
        let req = self
            .request(Method::GET, "/workouts/exercises/search")
            .query(&[("query", query)]);
        Self::send(req).await
    }

    async fn analyze_meal(&self, text: &str) -> Result<MealAnalysis, ClientError> {
        let req = self
            .request(Method::POST, "/nutrition/nutrition/analyze")
            .json(&json!({ "query": text }));
        Self::send(req).await
    }

    async fn create_food(&self, food: &NewFood) -> Result<Food, ClientError> {
        Self::send(self.request(Method::POST, "/nutrition/foods").json(food)).await
    }

    async fn save_meal_plan(&self, plan: &NewMealPlan) -> Result<MealPlan, ClientError> {
        Self::send(self.request(Method::POST, "/nutrition/meal-plans").json(plan)).await
    }

    async fn list_meal_plans(&self) -> Result<Vec<MealPlan>, ClientError> {
        Self::send(self.request(Method::GET, "/nutrition/meal-plans")).await
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, ClientError> {
        let req = self
            .request(Method::GET, "/workouts/exercises")
            .query(&[("limit", "1000")]);
        Self::send(req).await
    }

    async fn list_workout_plans(&self) -> Result<Vec<WorkoutPlan>, ClientError> {
        Self::send(self.request(Method::GET, "/workouts/plans")).await
    }

    async fn delete_workout_plan(&self, plan_id: i64) -> Result<(), ClientError> {
        let path = format!("/workouts/plans/{plan_id}");
        Self::send_raw(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn create_workout_plan(&self, plan: &NewWorkoutPlan) -> Result<WorkoutPlan, ClientError> {
        Self::send(self.request(Method::POST, "/workouts/plans").json(plan)).await
    }

    async fn fetch_workout_plan(&self, plan_id: i64) -> Result<WorkoutPlan, ClientError> {
        let path = format!("/workouts/plans/{plan_id}");
        Self::send(self.request(Method::GET, &path)).await
    }

    async fn log_workout(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, ClientError> {
        Self::send(self.request(Method::POST, "/workouts/logs").json(log)).await
    }

    async fn list_workout_logs(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkoutLog>, ClientError> {
        let req = self
            .request(Method::GET, "/workouts/logs")
            .query(&[("start_date", ymd(start)), ("end_date", ymd(end))]);
        Self::send(req).await
    }

    async fn delete_workout_log(&self, log_id: i64) -> Result<(), ClientError> {
        let path = format!("/workouts/logs/{log_id}");
        Self::send_raw(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ClientError> {
        Self::send(self.request(Method::GET, "/profile/me")).await
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, ClientError> {
        Self::send(self.request(Method::POST, "/profile/").json(profile)).await
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, ClientError> {
        Self::send(self.request(Method::PUT, "/profile/me").json(profile)).await
    }
}
