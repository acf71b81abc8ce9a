use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::Member,
    error::{ApiError, ApiException},
    protocol::AddMemberResult,
};
use tracing::debug;

pub mod batch;
pub mod config;
pub mod controller;
pub mod detail;
pub mod directory;
pub mod registration;
pub mod resource;
pub mod seed;
pub mod transfer;

pub use config::{load_settings, ClientSettings};
pub use controller::{DirectoryController, DirectoryEvent, DirectoryStatus};
pub use directory::{DirectoryEngine, Projection, Snapshot, PAGE_SIZE};
pub use registration::{register, NewMember, RegistrationOutcome};

/// The remote member service. It always returns the full collection; all
/// filtering, sorting and paging happen client-side.
#[async_trait]
pub trait MemberSource: Send + Sync {
    async fn get_members(&self) -> Result<Vec<Member>>;
    /// Transport failures are `Err`; a refusal by the service is
    /// `Ok(AddMemberResult::Err(..))`.
    async fn add_member(&self, member: &NewMember) -> Result<AddMemberResult>;
}

/// JSON-over-HTTP binding of [`MemberSource`]:
/// `GET {server}/members` and `POST {server}/members`.
pub struct HttpMemberSource {
    http: Client,
    server_url: String,
}

impl HttpMemberSource {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: normalize_server_url(server_url.into()),
        }
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            server_url: normalize_server_url(server_url.into()),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::with_timeout(settings.server_url.clone(), settings.request_timeout())
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn members_url(&self) -> String {
        format!("{}/members", self.server_url)
    }
}

fn normalize_server_url(raw: String) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Passes 2xx responses through. Anything else becomes an error, typed as
/// [`ApiException`] when the body carries an [`ApiError`].
async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => Err(ApiException::from(api_error).into()),
        Err(_) => Err(anyhow!("member service returned {status}")),
    }
}

#[async_trait]
impl MemberSource for HttpMemberSource {
    async fn get_members(&self) -> Result<Vec<Member>> {
        let res = self
            .http
            .get(self.members_url())
            .send()
            .await
            .context("failed to reach member service")?;
        let members: Vec<Member> = ensure_success(res)
            .await?
            .json()
            .await
            .context("malformed member list")?;
        debug!(count = members.len(), "getMembers returned");
        Ok(members)
    }

    async fn add_member(&self, member: &NewMember) -> Result<AddMemberResult> {
        let res = self
            .http
            .post(self.members_url())
            .json(&member.to_request())
            .send()
            .await
            .context("failed to reach member service")?;
        let result: AddMemberResult = ensure_success(res)
            .await?
            .json()
            .await
            .context("malformed addMember result")?;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod testing;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
