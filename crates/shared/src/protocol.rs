use serde::{Deserialize, Serialize};

/// Body of an `addMember` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub name: String,
    pub surname: String,
    pub email: String,
}

/// Outcome of an `addMember` call as the backend reports it:
/// `{"ok": null}` or `{"err": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddMemberResult {
    #[serde(rename = "ok")]
    Ok(()),
    #[serde(rename = "err")]
    Err(String),
}
