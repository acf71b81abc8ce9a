use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i64 = 1_000_000_000;
const SECS_PER_DAY: i64 = 86_400;

/// Nanoseconds since the Unix epoch, as stamped by the member backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_nanos_opt().unwrap_or(i64::MAX))
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        let secs = self.0.div_euclid(NANOS_PER_SEC);
        let nanos = self.0.rem_euclid(NANOS_PER_SEC) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub created_date: Timestamp,
    pub updated_date: Timestamp,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn sort_key(&self, field: SortField) -> &str {
        match field {
            SortField::Name => &self.name,
            SortField::Surname => &self.surname,
        }
    }

    pub fn was_updated(&self) -> bool {
        self.updated_date != self.created_date
    }

    /// Whole days elapsed between creation and `now`; never negative.
    pub fn member_since_days(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = now.timestamp() - self.created_date.to_datetime().timestamp();
        elapsed.max(0) / SECS_PER_DAY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Surname,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}
