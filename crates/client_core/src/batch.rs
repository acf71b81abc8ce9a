//! Bulk `addMember` submission in fixed-size batches.
//!
//! Calls inside one batch run concurrently; batches run one after another
//! with a pause in between so the member service is not flooded.

use std::time::Duration;

use futures::future::join_all;
use shared::protocol::AddMemberResult;
use tracing::{debug, info};

use crate::{registration::NewMember, MemberSource};

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(200);
const SUMMARY_ERROR_SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay: DEFAULT_BATCH_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    /// One `"<email>: <reason>"` entry per member that was not added.
    pub failures: Vec<String>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failure_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let sample = self
            .failures
            .iter()
            .take(SUMMARY_ERROR_SAMPLE)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "Failed to add {} users. First few errors: {sample}",
            self.failed()
        ))
    }
}

pub async fn submit_in_batches(
    source: &dyn MemberSource,
    members: &[NewMember],
    options: &BatchOptions,
) -> BatchReport {
    let batch_size = options.batch_size.max(1);
    let batch_count = members.len().div_ceil(batch_size);
    let mut report = BatchReport::default();

    for (index, batch) in members.chunks(batch_size).enumerate() {
        let results = join_all(batch.iter().map(|member| source.add_member(member))).await;

        for (member, result) in batch.iter().zip(results) {
            match result {
                Ok(AddMemberResult::Ok(())) => report.succeeded += 1,
                Ok(AddMemberResult::Err(message)) => {
                    report.failures.push(format!("{}: {message}", member.email()));
                }
                Err(err) => {
                    debug!(email = member.email(), error = %err, "add_member transport failure");
                    report
                        .failures
                        .push(format!("{}: Network error", member.email()));
                }
            }
        }

        debug!(
            batch = index + 1,
            batch_count,
            succeeded = report.succeeded,
            failed = report.failed(),
            "batch submitted"
        );

        if index + 1 < batch_count && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    info!(
        submitted = members.len(),
        succeeded = report.succeeded,
        failed = report.failed(),
        "bulk submission finished"
    );
    report
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
