//! Generic request state wrapper: `idle → pending → fulfilled | rejected`.
//!
//! A [`RequestLifecycle`] hands out a [`RequestTicket`] for every request it
//! starts. Tickets are not `Clone` and settling consumes them, so each pending
//! request is settled at most once. A ticket that is dropped unsettled keeps
//! the lifecycle pending.

use serde::Serialize;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Proof that a request was started. Consumed by `fulfill` or `reject`.
#[derive(Debug)]
#[must_use = "a request ticket must be settled with fulfill or reject"]
pub struct RequestTicket {
    seq: u64,
}

impl RequestTicket {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone)]
pub struct RequestLifecycle<T> {
    status: RequestStatus,
    data: Option<T>,
    error: Option<ClientError>,
    next_seq: u64,
    in_flight: usize,
}

impl<T> Default for RequestLifecycle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestLifecycle<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: RequestStatus::Idle,
            data: None,
            error: None,
            next_seq: 0,
            in_flight: 0,
        }
    }

    /// Mark a request as started. Clears the error channel, keeps data.
    pub fn begin(&mut self) -> RequestTicket {
        self.next_seq += 1;
        self.in_flight += 1;
        self.status = RequestStatus::Pending;
        self.error = None;
        RequestTicket { seq: self.next_seq }
    }

    /// Settle a request successfully, storing `data`.
    pub fn fulfill(&mut self, ticket: RequestTicket, data: T) {
        self.settle(ticket, RequestStatus::Fulfilled);
        self.data = Some(data);
        self.error = None;
    }

    /// Settle a request as failed. Stored data is left as it was.
    pub fn reject(&mut self, ticket: RequestTicket, error: ClientError) {
        self.settle(ticket, RequestStatus::Rejected);
        self.error = Some(error);
    }

    /// Settle a request successfully without storing its result.
    pub fn discard(&mut self, ticket: RequestTicket) {
        self.settle(ticket, RequestStatus::Fulfilled);
    }

    #[allow(clippy::needless_pass_by_value)]
    fn settle(&mut self, _ticket: RequestTicket, outcome: RequestStatus) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.status = if self.in_flight > 0 {
            RequestStatus::Pending
        } else {
            outcome
        };
    }

    /// Store data outside of a request, e.g. a replacement produced by another operation.
    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
    }

    pub fn take_data(&mut self) -> Option<T> {
        self.data.take()
    }

    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Sequence number of the most recently started request (0 if none).
    #[must_use]
    pub fn latest_seq(&self) -> u64 {
        self.next_seq
    }
}
