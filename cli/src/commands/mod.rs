mod auth;
mod exercise;
mod find;
mod food;
mod helpers;
mod log;
mod meal;
mod plan;
mod profile;
mod summary;
mod workout;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use tracing::warn;

use crate::api::HttpNutritionApi;
use crate::config::Config;
use nutrilog_core::dispatcher::MutationDispatcher;
use nutrilog_core::error::ClientError;
use nutrilog_core::models::{DailyLog, LogItemChanges, NewLogItem};
use nutrilog_core::session::Session;
use nutrilog_core::store::{LogStore, PageState};

use helpers::parse_quantity;

pub(crate) use auth::{cmd_login, cmd_logout, cmd_whoami};
pub(crate) use exercise::{cmd_exercise_list, cmd_exercise_search};
pub(crate) use find::{FindTarget, cmd_find};
pub(crate) use food::{cmd_food_add, cmd_food_log, cmd_food_search};
pub(crate) use log::{cmd_analyze, cmd_log};
pub(crate) use meal::{cmd_delete, cmd_update};
pub(crate) use plan::{cmd_plan_list, cmd_plan_log, cmd_plan_save};
pub(crate) use profile::{cmd_profile_setup, cmd_profile_show, cmd_profile_update};
pub(crate) use summary::cmd_summary;
pub(crate) use workout::{
    cmd_workout_create, cmd_workout_delete_log, cmd_workout_delete_plan, cmd_workout_log,
    cmd_workout_logs, cmd_workout_plans, cmd_workout_show,
};

/// Shared state for one CLI invocation.
pub(crate) struct App {
    pub config: Config,
    pub api: Arc<HttpNutritionApi>,
    pub session: Session<HttpNutritionApi>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = Arc::new(HttpNutritionApi::new(&config.api_url)?);
        let session = match config.load_token()? {
            Some(token) => Session::with_credential(Arc::clone(&api), token),
            None => Session::new(Arc::clone(&api)),
        };
        Ok(Self {
            config,
            api,
            session,
        })
    }

    pub fn require_login(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("Not logged in. Run `nutrilog login <email>` first");
        }
        Ok(())
    }

    pub fn dispatcher(&self, date: NaiveDate) -> MutationDispatcher<HttpNutritionApi> {
        let store = Arc::new(Mutex::new(LogStore::new(date)));
        MutationDispatcher::new(Arc::clone(&self.api), store)
    }

    /// Turn a service failure into a CLI error. An authentication failure ends
    /// the session and removes the stored token.
    pub fn fail(&self, err: ClientError) -> anyhow::Error {
        if self.session.handle_failure(&err) {
            if let Err(e) = self.config.clear_token() {
                warn!(error = %e, "could not remove stored token");
            }
            return anyhow!("{err}. Session ended, run `nutrilog login` again");
        }
        anyhow::Error::new(err)
    }

    /// Select `date` on `dispatcher` and return its log.
    pub async fn load_log(
        &self,
        dispatcher: &MutationDispatcher<HttpNutritionApi>,
        date: NaiveDate,
    ) -> Result<DailyLog> {
        match dispatcher.select_date(date).await {
            PageState::Ready => dispatcher
                .current_log()
                .with_context(|| format!("No log resident for {date}")),
            PageState::Error | PageState::Loading => {
                let err = dispatcher
                    .page_error()
                    .unwrap_or_else(|| ClientError::Transport(format!("Could not load log for {date}")));
                Err(self.fail(err))
            }
        }
    }
}

/// Manually entered item fields, as given on the command line.
pub(crate) struct ItemFields {
    pub name: String,
    pub quantity: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl ItemFields {
    pub fn into_item(self) -> Result<NewLogItem> {
        Ok(NewLogItem {
            name: self.name,
            quantity_g: parse_quantity(&self.quantity)?,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        })
    }
}

pub(crate) fn parse_changes(
    name: Option<String>,
    quantity: Option<String>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
) -> Result<LogItemChanges> {
    let changes = LogItemChanges {
        name,
        quantity_g: quantity.as_deref().map(parse_quantity).transpose()?,
        calories,
        protein,
        carbs,
        fat,
    };
    if changes.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --name, --quantity, --calories, --protein, --carbs, or --fat"
        );
    }
    Ok(changes)
}
