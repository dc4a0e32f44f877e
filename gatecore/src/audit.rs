//! Permission decision audit records.

use serde::{Deserialize, Serialize};
use crate::Context;

/// One record per evaluated permission check.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PermissionCheck {
    pub user_id: String,
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub context: Context,
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: i64,
}

/// Inclusive range of unix timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

/// Criteria for querying the audit log; unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CheckFilter {
    pub user_id: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub result: Option<bool>,
    pub date_range: Option<DateRange>,
}

mod impls;
