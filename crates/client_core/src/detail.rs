//! Read-only member detail card.

use chrono::{DateTime, Utc};
use shared::domain::{Member, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDetail {
    pub full_name: String,
    pub email: String,
    pub registered: String,
    pub registered_short: String,
    /// Present only when the record changed after creation.
    pub last_updated: Option<String>,
    pub member_since_days: i64,
}

impl MemberDetail {
    pub fn new(member: &Member, now: DateTime<Utc>) -> Self {
        Self {
            full_name: member.full_name(),
            email: member.email.clone(),
            registered: long_date(member.created_date),
            registered_short: short_date(member.created_date),
            last_updated: member
                .was_updated()
                .then(|| long_date(member.updated_date)),
            member_since_days: member.member_since_days(now),
        }
    }
}

/// `January 2, 2024, 03:04:05 PM` (UTC).
pub fn long_date(timestamp: Timestamp) -> String {
    timestamp
        .to_datetime()
        .format("%B %-d, %Y, %I:%M:%S %p")
        .to_string()
}

/// `Jan 2, 2024` (UTC).
pub fn short_date(timestamp: Timestamp) -> String {
    timestamp.to_datetime().format("%b %-d, %Y").to_string()
}
