//! Typed views over the agent's XML-RPC responses. Both records live only
//! for the scrape that decoded them.

use openvpnas_rpc::{Result, RpcError, Value};

/// Response of `GetASLongVersion`: a single version string.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: String,
}

impl VersionInfo {
    pub fn from_value(value: &Value) -> Result<Self> {
        match value.as_str() {
            Some(version) => Ok(Self {
                version: version.to_string(),
            }),
            None => Err(RpcError::InvalidResponse(
                "version response is not a string".to_string(),
            )),
        }
    }
}

/// Response of `GetSubscriptionStatus`. Only six numeric fields are
/// published; the rest are decoded for completeness and dropped. Missing
/// members default rather than fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionStatus {
    pub agent_disabled: bool,
    pub agent_id: String,
    pub cc_limit: i64,
    pub current_cc: i64,
    pub error: String,
    pub fallback_cc: i64,
    pub grace_period: i64,
    pub last_successful_update: i64,
    pub last_successful_update_age: i64,
    pub max_cc: i64,
    pub name: String,
    pub next_update: i64,
    pub next_update_in: i64,
    pub notes: Vec<String>,
    pub overdraft: bool,
    pub server: String,
    pub state: String,
    pub subkey: String,
    pub total_cc: i64,
    pub kind: String,
    pub updates_failed: i64,
}

impl SubscriptionStatus {
    pub fn from_value(value: &Value) -> Result<Self> {
        if !matches!(value, Value::Struct(_)) {
            return Err(RpcError::InvalidResponse(
                "subscription status response is not a struct".to_string(),
            ));
        }

        Ok(Self {
            agent_disabled: bool_member(value, "agent_disabled"),
            agent_id: string_member(value, "agent_id"),
            cc_limit: int_member(value, "cc_limit"),
            current_cc: int_member(value, "current_cc"),
            error: string_member(value, "error"),
            fallback_cc: int_member(value, "fallback_cc"),
            grace_period: int_member(value, "grace_period"),
            last_successful_update: int_member(value, "last_successful_update"),
            last_successful_update_age: int_member(value, "last_successful_update_age"),
            max_cc: int_member(value, "max_cc"),
            name: string_member(value, "name"),
            next_update: int_member(value, "next_update"),
            next_update_in: int_member(value, "next_update_in"),
            notes: notes_member(value),
            overdraft: bool_member(value, "overdraft"),
            server: string_member(value, "server"),
            state: string_member(value, "state"),
            subkey: string_member(value, "subkey"),
            total_cc: int_member(value, "total_cc"),
            kind: string_member(value, "type"),
            updates_failed: int_member(value, "updates_failed"),
        })
    }
}

fn int_member(value: &Value, member: &str) -> i64 {
    value.get(member).and_then(Value::as_i64).unwrap_or(0)
}

fn bool_member(value: &Value, member: &str) -> bool {
    value.get(member).and_then(Value::as_bool).unwrap_or(false)
}

fn string_member(value: &Value, member: &str) -> String {
    value
        .get(member)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn notes_member(value: &Value) -> Vec<String> {
    value
        .get("notes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
