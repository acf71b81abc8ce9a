use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Member, Timestamp},
    error::{ApiException, ErrorCode},
    protocol::AddMemberResult,
};
use tokio::sync::Mutex;

use crate::{MemberSource, NewMember};

pub(crate) fn member(name: &str, surname: &str, email: &str) -> Member {
    Member {
        name: name.to_string(),
        surname: surname.to_string(),
        email: email.to_string(),
        created_date: Timestamp(1_700_000_000_000_000_000),
        updated_date: Timestamp(1_700_000_000_000_000_000),
    }
}

/// `A0..A{n-1}`, surname `Z`, emails `a{i}@example.com`.
pub(crate) fn numbered_members(count: usize) -> Vec<Member> {
    (0..count)
        .map(|i| member(&format!("A{i}"), "Z", &format!("a{i}@example.com")))
        .collect()
}

/// In-memory member service with scriptable failures.
pub(crate) struct FakeMemberSource {
    members: Mutex<Vec<Member>>,
    fetch_error: Mutex<Option<String>>,
    fetch_api_error: Mutex<Option<ApiException>>,
    unreachable_emails: HashSet<String>,
    refused_emails: HashMap<String, ApiException>,
    clock: AtomicUsize,
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) add_calls: AtomicUsize,
}

impl FakeMemberSource {
    pub(crate) fn with_members(members: Vec<Member>) -> Self {
        Self {
            members: Mutex::new(members),
            fetch_error: Mutex::new(None),
            fetch_api_error: Mutex::new(None),
            unreachable_emails: HashSet::new(),
            refused_emails: HashMap::new(),
            clock: AtomicUsize::new(1),
            fetch_calls: AtomicUsize::new(0),
            add_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::with_members(Vec::new())
    }

    /// `add_member` for these emails fails at the transport level.
    pub(crate) fn with_unreachable_emails<'a>(
        mut self,
        emails: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.unreachable_emails = emails.into_iter().map(str::to_string).collect();
        self
    }

    /// `add_member` for `email` fails with a typed service error.
    pub(crate) fn with_refused_email(
        mut self,
        email: &str,
        code: ErrorCode,
        message: &str,
    ) -> Self {
        self.refused_emails
            .insert(email.to_string(), ApiException::new(code, message));
        self
    }

    pub(crate) async fn fail_fetches_with_code(&self, code: ErrorCode, message: &str) {
        *self.fetch_api_error.lock().await = Some(ApiException::new(code, message));
    }

    pub(crate) async fn fail_fetches_with(&self, message: &str) {
        *self.fetch_error.lock().await = Some(message.to_string());
    }

    pub(crate) async fn heal(&self) {
        *self.fetch_error.lock().await = None;
        *self.fetch_api_error.lock().await = None;
    }

    pub(crate) async fn stored(&self) -> Vec<Member> {
        self.members.lock().await.clone()
    }
}

#[async_trait]
impl MemberSource for FakeMemberSource {
    async fn get_members(&self) -> Result<Vec<Member>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fetch_error.lock().await.clone() {
            return Err(anyhow!(message));
        }
        if let Some(api) = self.fetch_api_error.lock().await.clone() {
            return Err(api.into());
        }
        Ok(self.members.lock().await.clone())
    }

    async fn add_member(&self, new_member: &NewMember) -> Result<AddMemberResult> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable_emails.contains(new_member.email()) {
            return Err(anyhow!("connection reset"));
        }
        if let Some(api) = self.refused_emails.get(new_member.email()) {
            return Err(api.clone().into());
        }

        let mut members = self.members.lock().await;
        if members
            .iter()
            .any(|existing| existing.email == new_member.email())
        {
            return Ok(AddMemberResult::Err(
                "A member with this email already exists".to_string(),
            ));
        }

        let now = Timestamp(self.clock.fetch_add(1, Ordering::SeqCst) as i64);
        members.push(Member {
            name: new_member.name().to_string(),
            surname: new_member.surname().to_string(),
            email: new_member.email().to_string(),
            created_date: now,
            updated_date: now,
        });
        Ok(AddMemberResult::Ok(()))
    }
}
