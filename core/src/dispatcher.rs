//! Pessimistic mutation dispatch against the daily log.
//!
//! Nothing is applied locally before the service answers. A successful
//! response replaces the [`LogStore`] slot with exactly the returned body; a
//! failure leaves the slot alone and is recorded as the page error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::api::NutritionApi;
use crate::error::ClientError;
use crate::lifecycle::{RequestLifecycle, RequestStatus, RequestTicket};
use crate::lock;
use crate::models::{DailyLog, NewLogItem, validate_items, validate_new_item};
use crate::store::{ApplyOutcome, LogStore, MutationOrdering, MutationStamp, PageState};

/// The UI control a mutation was triggered from. Each has its own pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    LogItems,
    UpdateItem(i64),
    DeleteItem(i64),
    ReplayPlan(i64),
}

pub struct MutationDispatcher<A> {
    api: Arc<A>,
    store: Arc<Mutex<LogStore>>,
    controls: Mutex<HashMap<Control, RequestLifecycle<()>>>,
    ordering: MutationOrdering,
}

impl<A: NutritionApi> MutationDispatcher<A> {
    pub fn new(api: Arc<A>, store: Arc<Mutex<LogStore>>) -> Self {
        Self {
            api,
            store,
            controls: Mutex::new(HashMap::new()),
            ordering: MutationOrdering::default(),
        }
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: MutationOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn store(&self) -> &Arc<Mutex<LogStore>> {
        &self.store
    }

    /// Clone of the resident log, if any.
    pub fn current_log(&self) -> Option<DailyLog> {
        lock(&self.store).log().cloned()
    }

    pub fn page_state(&self) -> PageState {
        lock(&self.store).page_state()
    }

    /// The failure behind an `Error` page state.
    pub fn page_error(&self) -> Option<ClientError> {
        lock(&self.store).error().cloned()
    }

    /// Select `date` and fetch its log if the store asks for it.
    pub async fn select_date(&self, date: NaiveDate) -> PageState {
        let fetch = lock(&self.store).select(date);
        if let Some(fetch) = fetch {
            let result = self.api.fetch_daily_log(fetch.date()).await;
            lock(&self.store).complete_fetch(fetch, result, self.ordering);
        }
        self.page_state()
    }

    /// Append caller-priced items to `date`'s log.
    pub async fn log_items(
        &self,
        date: NaiveDate,
        items: Vec<NewLogItem>,
    ) -> Result<DailyLog, ClientError> {
        let control = Control::LogItems;
        if let Err(err) = validate_items(&items) {
            return self.reject_locally(control, err);
        }
        self.dispatch(control, date, self.api.log_items(date, &items))
            .await
    }

    /// Replace one logged item with `fields` in full.
    pub async fn update_item(
        &self,
        date: NaiveDate,
        log_item_id: i64,
        fields: NewLogItem,
    ) -> Result<DailyLog, ClientError> {
        let control = Control::UpdateItem(log_item_id);
        if let Err(err) = validate_new_item(&fields) {
            return self.reject_locally(control, err);
        }
        let item = fields.with_id(log_item_id);
        self.dispatch(control, date, self.api.update_item(date, &item))
            .await
    }

    pub async fn delete_item(
        &self,
        date: NaiveDate,
        log_item_id: i64,
    ) -> Result<DailyLog, ClientError> {
        self.dispatch(
            Control::DeleteItem(log_item_id),
            date,
            self.api.delete_item(date, log_item_id),
        )
        .await
    }

    /// Expand a saved meal plan into `date`'s log.
    pub async fn replay_plan(&self, date: NaiveDate, plan_id: i64) -> Result<DailyLog, ClientError> {
        self.dispatch(
            Control::ReplayPlan(plan_id),
            date,
            self.api.replay_plan(date, plan_id),
        )
        .await
    }

    pub fn control_status(&self, control: Control) -> RequestStatus {
        lock(&self.controls)
            .get(&control)
            .map_or(RequestStatus::Idle, RequestLifecycle::status)
    }

    pub fn control_error(&self, control: Control) -> Option<ClientError> {
        lock(&self.controls)
            .get(&control)
            .and_then(|lc| lc.error().cloned())
    }

    async fn dispatch<F>(
        &self,
        control: Control,
        date: NaiveDate,
        request: F,
    ) -> Result<DailyLog, ClientError>
    where
        F: Future<Output = Result<DailyLog, ClientError>>,
    {
        let ticket = lock(&self.controls).entry(control).or_default().begin();
        let stamp = lock(&self.store).stamp_mutation(date);
        debug!(?control, %date, seq = stamp.seq, "mutation dispatched");

        let result = request.await;
        self.settle(control, ticket, stamp, result)
    }

    fn settle(
        &self,
        control: Control,
        ticket: RequestTicket,
        stamp: MutationStamp,
        result: Result<DailyLog, ClientError>,
    ) -> Result<DailyLog, ClientError> {
        match result {
            Ok(log) => {
                let outcome = lock(&self.store).apply_mutation(stamp, log.clone(), self.ordering);
                if outcome == ApplyOutcome::Applied {
                    debug!(?control, seq = stamp.seq, "mutation applied");
                } else {
                    info!(?control, seq = stamp.seq, ?outcome, "mutation response not applied");
                }
                lock(&self.controls)
                    .entry(control)
                    .or_default()
                    .fulfill(ticket, ());
                Ok(log)
            }
            Err(err) => {
                warn!(?control, seq = stamp.seq, error = %err, "mutation failed");
                lock(&self.store).record_failure(err.clone());
                lock(&self.controls)
                    .entry(control)
                    .or_default()
                    .reject(ticket, err.clone());
                Err(err)
            }
        }
    }

    fn reject_locally(&self, control: Control, err: ClientError) -> Result<DailyLog, ClientError> {
        warn!(?control, error = %err, "mutation payload rejected before dispatch");
        {
            let mut controls = lock(&self.controls);
            let lifecycle = controls.entry(control).or_default();
            let ticket = lifecycle.begin();
            lifecycle.reject(ticket, err.clone());
        }
        lock(&self.store).record_failure(err.clone());
        Err(err)
    }
}
