//! Single-slot, date-keyed holder of the authoritative [`DailyLog`].

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::lifecycle::{RequestLifecycle, RequestStatus, RequestTicket};
use crate::models::DailyLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
    /// A date was just selected and its fetch is outstanding.
    Loading,
    /// A log is resident.
    Ready,
    /// The last fetch or mutation failed. Any resident log is still shown.
    Error,
}

/// How responses of concurrent mutations on the same date are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationOrdering {
    /// Whichever response resolves last replaces the slot.
    #[default]
    LastResponseWins,
    /// A response is dropped if a mutation issued after it has already been applied.
    LatestIssuedWins,
}

/// A fetch started by [`LogStore::select`]; hand it back to [`LogStore::complete_fetch`].
#[derive(Debug)]
#[must_use = "a fetch ticket must be completed"]
pub struct FetchTicket {
    date: NaiveDate,
    ticket: RequestTicket,
    /// Last mutation sequence number issued when the fetch started.
    issued_after: u64,
}

impl FetchTicket {
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Identifies one dispatched mutation: the date it targets and its issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationStamp {
    pub date: NaiveDate,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The response belongs to a date that is no longer selected.
    WrongDate,
    /// A mutation issued later has already been applied.
    Superseded,
}

#[derive(Debug)]
pub struct LogStore {
    date: NaiveDate,
    log: RequestLifecycle<DailyLog>,
    error: Option<ClientError>,
    mutation_seq: u64,
    applied_seq: u64,
}

impl LogStore {
    /// A store for `date` with nothing resident yet. Call [`select`](Self::select)
    /// to obtain the initial fetch.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            log: RequestLifecycle::new(),
            error: None,
            mutation_seq: 0,
            applied_seq: 0,
        }
    }

    /// Make `date` the active date.
    ///
    /// Changing the date discards the resident log. A fetch ticket is returned
    /// when nothing is cached for the active date and no fetch is outstanding.
    pub fn select(&mut self, date: NaiveDate) -> Option<FetchTicket> {
        if date != self.date {
            info!(from = %self.date, to = %date, "date changed, discarding resident log");
            self.date = date;
            self.log = RequestLifecycle::new();
            self.error = None;
        }

        if self.log.data().is_some() || self.log.is_pending() {
            debug!(%date, "serving cached log");
            return None;
        }

        debug!(%date, "fetching daily log");
        Some(FetchTicket {
            date,
            ticket: self.log.begin(),
            issued_after: self.mutation_seq,
        })
    }

    /// Settle a fetch, subject to the date key and `ordering`.
    ///
    /// Under [`MutationOrdering::LatestIssuedWins`] a fetch that started before
    /// an already applied mutation is settled without touching the slot.
    pub fn complete_fetch(
        &mut self,
        fetch: FetchTicket,
        result: Result<DailyLog, ClientError>,
        ordering: MutationOrdering,
    ) -> ApplyOutcome {
        if fetch.date != self.date {
            debug!(fetched = %fetch.date, active = %self.date, "dropping fetch for inactive date");
            return ApplyOutcome::WrongDate;
        }
        if ordering == MutationOrdering::LatestIssuedWins && self.applied_seq > fetch.issued_after {
            info!(
                date = %fetch.date,
                applied = self.applied_seq,
                "dropping fetch superseded by an applied mutation"
            );
            self.log.discard(fetch.ticket);
            return ApplyOutcome::Superseded;
        }
        match result {
            Ok(log) => {
                self.log.fulfill(fetch.ticket, log);
                self.error = None;
            }
            Err(err) => {
                warn!(date = %fetch.date, error = %err, "daily log fetch failed");
                self.log.reject(fetch.ticket, err.clone());
                self.error = Some(err);
            }
        }
        ApplyOutcome::Applied
    }

    /// Swap the resident log for `log` in full. Returns the log it displaced.
    pub fn replace(&mut self, log: DailyLog) -> Option<DailyLog> {
        let previous = self.log.take_data();
        self.log.set_data(log);
        self.error = None;
        previous
    }

    /// Reserve the next mutation sequence number for a mutation targeting `date`.
    pub fn stamp_mutation(&mut self, date: NaiveDate) -> MutationStamp {
        self.mutation_seq += 1;
        MutationStamp {
            date,
            seq: self.mutation_seq,
        }
    }

    /// Install a mutation response, subject to the date key and `ordering`.
    pub fn apply_mutation(
        &mut self,
        stamp: MutationStamp,
        log: DailyLog,
        ordering: MutationOrdering,
    ) -> ApplyOutcome {
        if stamp.date != self.date || log.date != self.date {
            warn!(
                stamped = %stamp.date,
                returned = %log.date,
                active = %self.date,
                "dropping mutation response for inactive date"
            );
            return ApplyOutcome::WrongDate;
        }
        if ordering == MutationOrdering::LatestIssuedWins && stamp.seq < self.applied_seq {
            info!(
                seq = stamp.seq,
                applied = self.applied_seq,
                "dropping superseded mutation response"
            );
            return ApplyOutcome::Superseded;
        }
        self.applied_seq = self.applied_seq.max(stamp.seq);
        self.replace(log);
        ApplyOutcome::Applied
    }

    /// Surface a mutation failure. The resident log is not touched.
    pub fn record_failure(&mut self, error: ClientError) {
        self.error = Some(error);
    }

    /// Drop everything resident, e.g. when the view goes away.
    pub fn clear(&mut self) {
        self.log = RequestLifecycle::new();
        self.error = None;
    }

    /// `Loading` only while nothing is resident. A log installed by a mutation
    /// is `Ready` even if the date's fetch is still outstanding.
    #[must_use]
    pub fn page_state(&self) -> PageState {
        if self.log.is_pending() && self.log.data().is_none() {
            PageState::Loading
        } else if self.error.is_some() {
            PageState::Error
        } else if self.log.data().is_some() {
            PageState::Ready
        } else {
            PageState::Loading
        }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn log(&self) -> Option<&DailyLog> {
        self.log.data()
    }

    #[must_use]
    pub fn fetch_status(&self) -> RequestStatus {
        self.log.status()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }
}
