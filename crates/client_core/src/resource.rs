//! Single-flight holder for a remotely fetched value.
//!
//! Every fetch is issued a ticket carrying a monotonically increasing
//! sequence number. Only the most recently issued ticket may complete; a
//! result arriving for an older ticket is dropped, so a slow response can
//! never overwrite a newer one.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState<T> {
    Pending,
    Failed(String),
    Ready(T),
}

#[derive(Debug)]
pub struct AsyncResource<T> {
    state: ResourceState<T>,
    last_issued: u64,
    in_flight: Option<u64>,
    stale: bool,
}

impl<T> Default for AsyncResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AsyncResource<T> {
    pub fn new() -> Self {
        Self {
            state: ResourceState::Pending,
            last_issued: 0,
            in_flight: None,
            stale: true,
        }
    }

    pub fn state(&self) -> &ResourceState<T> {
        &self.state
    }

    pub fn value(&self) -> Option<&T> {
        match &self.state {
            ResourceState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Issues a new ticket and makes it the only one allowed to complete.
    ///
    /// A resolved value stays visible while the refetch runs. A failed
    /// resource goes back to pending.
    pub fn begin(&mut self) -> FetchTicket {
        self.last_issued += 1;
        if let Some(superseded) = self.in_flight.replace(self.last_issued) {
            debug!(
                superseded,
                sequence = self.last_issued,
                "superseding in-flight fetch"
            );
        }
        if matches!(self.state, ResourceState::Failed(_)) {
            self.state = ResourceState::Pending;
        }
        FetchTicket(self.last_issued)
    }

    /// Applies `result` if `ticket` is still current. Returns whether it was
    /// applied.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<T, String>) -> bool {
        if self.in_flight != Some(ticket.0) {
            debug!(
                sequence = ticket.0,
                current = ?self.in_flight,
                "discarding stale fetch result"
            );
            return false;
        }

        self.in_flight = None;
        self.stale = false;
        self.state = match result {
            Ok(value) => ResourceState::Ready(value),
            Err(message) => ResourceState::Failed(message),
        };
        true
    }

    /// Forgets the in-flight request; its result will be discarded.
    pub fn cancel(&mut self) -> Option<FetchTicket> {
        self.in_flight.take().map(FetchTicket)
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }
}

#[cfg(test)]
#[path = "tests/resource_tests.rs"]
mod tests;
