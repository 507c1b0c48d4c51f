//! Host messages - envelopes between the App layer and the Host layer
//!
//! Both directions serialize as `{"type": ..., "value": ...}`.

use serde::{Deserialize, Serialize};

use crate::models::{ApiRequest, ApiResponse, Collection, Environment, HistoryEntry};

/// Request to execute, with the environment to resolve placeholders from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(flatten)]
    pub request: ApiRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
}

/// Commands sent from App layer to Host layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HostCommand {
    ExecuteRequest(Execution),
    SaveCollections(Vec<Collection>),
    GetCollections,
    SaveHistory(Vec<HistoryEntry>),
    GetHistory,
    ClearHistory,
    GetEnvironments,
    SaveEnvironments(Vec<Environment>),
    OnInfo(String),
    OnError(String),
    /// Stop the host loop
    Shutdown,
}

impl HostCommand {
    pub fn name(&self) -> &'static str {
        match self {
            HostCommand::ExecuteRequest(_) => "executeRequest",
            HostCommand::SaveCollections(_) => "saveCollections",
            HostCommand::GetCollections => "getCollections",
            HostCommand::SaveHistory(_) => "saveHistory",
            HostCommand::GetHistory => "getHistory",
            HostCommand::ClearHistory => "clearHistory",
            HostCommand::GetEnvironments => "getEnvironments",
            HostCommand::SaveEnvironments(_) => "saveEnvironments",
            HostCommand::OnInfo(_) => "onInfo",
            HostCommand::OnError(_) => "onError",
            HostCommand::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Events sent from Host layer to App layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HostEvent {
    Response(ApiResponse),
    Collections(Vec<Collection>),
    History(Vec<HistoryEntry>),
    Environments(Vec<Environment>),
    Notification(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_envelope_flattens_request() {
        let request = ApiRequest {
            url: "https://example.com".into(),
            ..ApiRequest::default()
        };
        let command = HostCommand::ExecuteRequest(Execution {
            request,
            environment_id: Some("env-1".into()),
        });

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "executeRequest");
        assert_eq!(json["value"]["url"], "https://example.com");
        assert_eq!(json["value"]["method"], "GET");
        assert_eq!(json["value"]["environmentId"], "env-1");

        let back: HostCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn unit_commands_have_no_value() {
        let json = serde_json::to_value(HostCommand::GetHistory).unwrap();
        assert_eq!(json, serde_json::json!({"type": "getHistory"}));
        assert_eq!(HostCommand::GetHistory.name(), "getHistory");
    }

    #[test]
    fn notification_event_shape() {
        let event = HostEvent::Notification(Notification {
            level: NotificationLevel::Error,
            message: "Please enter a collection name".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["value"]["level"], "error");
    }
}
