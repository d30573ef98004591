//! Page protocol: request/response messages exchanged between the page agent
//! and the extension's popup or background process.
//!
//! Requests are tagged by their `action` field.  Every request kind has
//! exactly one response shape:
//!
//! | Request                               | Response                      |
//! |---------------------------------------|-------------------------------|
//! | `{"action":"getCurrentSpreadsheetInfo"}` | `{id, title, url}` or `{error}` |
//! | `{"action":"ping"}`                    | `{"status":"ready"}`          |
//! | anything else                          | no response                   |

use serde::{Deserialize, Serialize};

pub const ACTION_GET_CURRENT_SPREADSHEET_INFO: &str = "getCurrentSpreadsheetInfo";
pub const ACTION_PING: &str = "ping";

/// Inbound request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    /// Popup/background → agent: describe the document open in this page.
    #[serde(rename = "getCurrentSpreadsheetInfo")]
    GetCurrentSpreadsheetInfo,

    /// Liveness check.
    #[serde(rename = "ping")]
    Ping,

    /// Any other action.  Never answered.
    #[serde(other)]
    Unrecognized,
}

impl Request {
    /// Decode a raw message.  Payloads that are not an object with a string
    /// `action` decode as [`Request::Unrecognized`].
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self::deserialize(value).unwrap_or(Self::Unrecognized)
    }

    /// Wire name of the action, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetCurrentSpreadsheetInfo => ACTION_GET_CURRENT_SPREADSHEET_INFO,
            Self::Ping => ACTION_PING,
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Description of the document open in the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetInfo {
    /// `None` when the URL carries no document id.
    pub id: Option<String>,
    /// Page title with the service suffix removed.
    pub title: String,
    pub url: String,
}

/// Agent readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Ready,
}

/// Outbound response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    SpreadsheetInfo(SpreadsheetInfo),
    Status { status: AgentStatus },
    Error { error: String },
}

impl Response {
    pub fn ready() -> Self {
        Self::Status {
            status: AgentStatus::Ready,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Serialize for the transport.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("failed to encode response: {e}") })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_known_actions() {
        assert_eq!(
            Request::from_value(&json!({"action": "getCurrentSpreadsheetInfo"})),
            Request::GetCurrentSpreadsheetInfo
        );
        assert_eq!(Request::from_value(&json!({"action": "ping"})), Request::Ping);
    }

    #[test]
    fn extra_fields_are_ignored() {
        assert_eq!(
            Request::from_value(&json!({"action": "ping", "tabId": 7})),
            Request::Ping
        );
    }

    #[test]
    fn unknown_action_is_unrecognized() {
        assert_eq!(
            Request::from_value(&json!({"action": "openSidebar"})),
            Request::Unrecognized
        );
    }

    #[test]
    fn malformed_payloads_are_unrecognized() {
        for value in [json!("ping"), json!(42), json!({}), json!({"action": 1}), json!(null)] {
            assert_eq!(Request::from_value(&value), Request::Unrecognized, "{value}");
        }
    }

    #[test]
    fn action_names_match_wire() {
        assert_eq!(
            serde_json::to_value(Request::Ping).unwrap(),
            json!({"action": ACTION_PING})
        );
        assert_eq!(
            serde_json::to_value(Request::GetCurrentSpreadsheetInfo).unwrap(),
            json!({"action": ACTION_GET_CURRENT_SPREADSHEET_INFO})
        );
    }

    #[test]
    fn response_shapes() {
        assert_eq!(Response::ready().to_value(), json!({"status": "ready"}));
        assert_eq!(Response::error("boom").to_value(), json!({"error": "boom"}));
        let info = Response::SpreadsheetInfo(SpreadsheetInfo {
            id: None,
            title: "Q3 Plan".into(),
            url: "https://docs.google.com/spreadsheets/u/0/".into(),
        });
        assert_eq!(
            info.to_value(),
            json!({"id": null, "title": "Q3 Plan", "url": "https://docs.google.com/spreadsheets/u/0/"})
        );
    }

    #[test]
    fn responses_decode_by_shape() {
        let decoded: Response = serde_json::from_value(json!({"status": "ready"})).unwrap();
        assert_eq!(decoded, Response::ready());
        let decoded: Response = serde_json::from_value(json!({"error": "x"})).unwrap();
        assert_eq!(decoded, Response::error("x"));
    }
}
