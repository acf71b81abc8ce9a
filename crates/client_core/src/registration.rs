//! Member registration: input normalization and the `addMember` round trip.

use shared::{
    error::{ApiException, ErrorCode},
    protocol::{AddMemberRequest, AddMemberResult},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::MemberSource;

pub const REGISTRATION_FAILED_MESSAGE: &str = "Failed to register member. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingField(&'static str),
}

/// A member ready to be submitted: every field trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    name: String,
    surname: String,
    email: String,
}

impl NewMember {
    pub fn new(
        name: impl AsRef<str>,
        surname: impl AsRef<str>,
        email: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        let name = required("name", name.as_ref())?;
        let surname = required("surname", surname.as_ref())?;
        let email = required("email", email.as_ref())?;
        Ok(Self {
            name,
            surname,
            email,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn to_request(&self) -> AddMemberRequest {
        AddMemberRequest {
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    /// The member service refused the member, either as an `err` result or
    /// as a validation/conflict error status; carries its message verbatim.
    Rejected(String),
    /// The call never produced an answer.
    Failed(String),
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }

    /// Text to show the user.
    pub fn message(&self) -> &str {
        match self {
            Self::Registered => "Member registered successfully!",
            Self::Rejected(message) => message,
            Self::Failed(_) => REGISTRATION_FAILED_MESSAGE,
        }
    }
}

pub async fn register(source: &dyn MemberSource, member: &NewMember) -> RegistrationOutcome {
    match source.add_member(member).await {
        Ok(AddMemberResult::Ok(())) => {
            info!(email = member.email(), "member registered");
            RegistrationOutcome::Registered
        }
        Ok(AddMemberResult::Err(message)) => {
            info!(email = member.email(), reason = %message, "member rejected");
            RegistrationOutcome::Rejected(message)
        }
        Err(err) => {
            if let Some(api) = err.downcast_ref::<ApiException>() {
                if matches!(api.code, ErrorCode::Validation | ErrorCode::Conflict) {
                    info!(
                        email = member.email(),
                        code = ?api.code,
                        reason = %api.message,
                        "member rejected"
                    );
                    return RegistrationOutcome::Rejected(api.message.clone());
                }
            }
            let reason = format!("{err:#}");
            warn!(email = member.email(), error = %reason, "add_member call failed");
            RegistrationOutcome::Failed(reason)
        }
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
