//! Directory controller: binds a member source, the snapshot resource and
//! the view engine, and publishes directory events to subscribers.

use std::{fmt, sync::Arc};

use anyhow::Result;
use futures::future::BoxFuture;
use shared::{
    domain::{Member, SortDirection, SortField},
    error::{ApiException, ErrorCode},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    directory::{DirectoryEngine, Projection, Snapshot},
    resource::{AsyncResource, FetchTicket, ResourceState},
    MemberSource,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    SnapshotReplaced { members: usize },
    FetchFailed(String),
    MemberSelected(Member),
}

/// What the renderer shows. Exactly one variant holds at a time; `Ready`
/// with no rows is the "no records" state.
#[derive(Debug)]
pub enum DirectoryStatus<'a> {
    Pending,
    Failed(&'a str),
    Ready(Projection<'a>),
}

pub const UNREACHABLE_MESSAGE: &str = "Member service unreachable; check the server URL and refresh.";

pub fn describe_fetch_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("connection refused")
        || lower.contains("failed to reach")
        || lower.contains("dns")
        || lower.contains("timed out")
        || lower.contains("error sending request")
    {
        UNREACHABLE_MESSAGE.to_string()
    } else {
        format!("Failed to load members: {message}")
    }
}

/// User-facing text for a failed `getMembers`. A typed service error is
/// described by its code; anything else by its message chain.
pub fn describe_fetch_error(err: &anyhow::Error) -> String {
    let Some(api) = err.downcast_ref::<ApiException>() else {
        return describe_fetch_failure(&format!("{err:#}"));
    };
    match api.code {
        ErrorCode::Unavailable => UNREACHABLE_MESSAGE.to_string(),
        ErrorCode::NotFound => {
            "Member list not found; check the server URL and refresh.".to_string()
        }
        ErrorCode::Validation | ErrorCode::Conflict | ErrorCode::Internal => {
            format!("Failed to load members: {}", api.message)
        }
    }
}

pub struct FetchOutcome {
    ticket: FetchTicket,
    result: Result<Vec<Member>>,
}

/// A `getMembers` call detached from the controller so it can run on its
/// own task. Hand the outcome back through [`DirectoryController::finish_fetch`].
pub struct PendingFetch {
    ticket: FetchTicket,
    call: BoxFuture<'static, Result<Vec<Member>>>,
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

impl PendingFetch {
    pub fn ticket(&self) -> FetchTicket {
        self.ticket
    }

    pub async fn run(self) -> FetchOutcome {
        FetchOutcome {
            ticket: self.ticket,
            result: self.call.await,
        }
    }
}

pub struct DirectoryController {
    source: Arc<dyn MemberSource>,
    resource: AsyncResource<Snapshot>,
    engine: DirectoryEngine,
    events: broadcast::Sender<DirectoryEvent>,
}

impl DirectoryController {
    pub fn new(source: Arc<dyn MemberSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            resource: AsyncResource::new(),
            engine: DirectoryEngine::default(),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    pub fn engine(&self) -> &DirectoryEngine {
        &self.engine
    }

    pub fn is_fetching(&self) -> bool {
        self.resource.is_fetching()
    }

    pub fn start_fetch(&mut self) -> PendingFetch {
        let ticket = self.resource.begin();
        debug!(sequence = ticket.sequence(), "fetching members");
        let source = Arc::clone(&self.source);
        PendingFetch {
            ticket,
            call: Box::pin(async move { source.get_members().await }),
        }
    }

    /// Applies a finished fetch. Returns `false` when the outcome was
    /// superseded or cancelled.
    pub fn finish_fetch(&mut self, outcome: FetchOutcome) -> bool {
        let FetchOutcome { ticket, result } = outcome;
        match result {
            Ok(members) => {
                let snapshot: Snapshot = Arc::from(members);
                if !self.resource.complete(ticket, Ok(Arc::clone(&snapshot))) {
                    return false;
                }
                let count = snapshot.len();
                self.engine.replace_snapshot(snapshot);
                info!(members = count, "member snapshot replaced");
                let _ = self
                    .events
                    .send(DirectoryEvent::SnapshotReplaced { members: count });
                true
            }
            Err(err) => {
                let message = describe_fetch_error(&err);
                if !self.resource.complete(ticket, Err(message.clone())) {
                    return false;
                }
                warn!(error = %message, "member fetch failed");
                let _ = self.events.send(DirectoryEvent::FetchFailed(message));
                true
            }
        }
    }

    pub async fn refresh(&mut self) -> bool {
        let outcome = self.start_fetch().run().await;
        self.finish_fetch(outcome)
    }

    /// Refetches only when nothing has been loaded yet or the snapshot was
    /// invalidated.
    pub async fn refresh_if_stale(&mut self) -> bool {
        if !self.resource.is_stale() {
            return false;
        }
        self.refresh().await
    }

    /// Marks the snapshot out of date, e.g. after a member was added.
    pub fn invalidate(&mut self) {
        self.resource.invalidate();
    }

    /// Releases the pending fetch when the directory is no longer shown.
    pub fn detach(&mut self) {
        if let Some(ticket) = self.resource.cancel() {
            debug!(sequence = ticket.sequence(), "released pending fetch");
        }
    }

    pub fn status(&self) -> DirectoryStatus<'_> {
        match self.resource.state() {
            ResourceState::Pending => DirectoryStatus::Pending,
            ResourceState::Failed(message) => DirectoryStatus::Failed(message),
            ResourceState::Ready(_) => DirectoryStatus::Ready(self.engine.compute_view()),
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.engine.set_search_term(term);
    }

    pub fn clear_search(&mut self) {
        self.engine.clear_search();
    }

    pub fn set_sort(&mut self, field: SortField) {
        self.engine.set_sort(field);
    }

    pub fn sort_by(&mut self, field: SortField, direction: SortDirection) {
        self.engine.sort_by(field, direction);
    }

    pub fn go_to_page(&mut self, index: usize) {
        self.engine.go_to_page(index);
    }

    pub fn next_page(&mut self) {
        self.engine.next_page();
    }

    pub fn previous_page(&mut self) {
        self.engine.previous_page();
    }

    /// Activates the `row`-th visible row of the current page.
    pub fn select_row(&self, row: usize) -> Option<Member> {
        let DirectoryStatus::Ready(projection) = self.status() else {
            return None;
        };
        let member = projection.rows.get(row)?.member.clone();
        self.emit_selected(&member);
        Some(member)
    }

    /// Activates the member with `email` anywhere in the snapshot.
    pub fn select_email(&self, email: &str) -> Option<Member> {
        self.resource.value()?;
        let member = self
            .engine
            .snapshot()
            .iter()
            .find(|member| member.email.eq_ignore_ascii_case(email))?
            .clone();
        self.emit_selected(&member);
        Some(member)
    }

    fn emit_selected(&self, member: &Member) {
        debug!(email = %member.email, "member selected");
        let _ = self
            .events
            .send(DirectoryEvent::MemberSelected(member.clone()));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
