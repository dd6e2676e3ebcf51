//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC messages, negotiates `initialize`, and routes tool and
//! resource calls to the job-search domain. Notifications are acknowledged
//! without doing any work, so they never reach the upstream API.

use rust_mcp_sdk::schema::{
    CallToolRequest, Implementation, InitializeRequest, InitializeResult, JsonrpcMessage,
    JsonrpcRequest, ListResourcesRequest, ListResourcesResult, ListToolsRequest, ListToolsResult,
    PingRequest, ProtocolVersion, ReadResourceRequest, ServerCapabilities,
    ServerCapabilitiesResources, ServerCapabilitiesTools,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::domain::{
    resources::{build_resources_list, handle_resources_read},
    tools::{build_tools_list, handle_tools_call},
};
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result, request_id_to_value,
};
use crate::{errors::AppError, AppState};

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";

const SERVER_INSTRUCTIONS: &str = "Search Adzuna job listings with search_jobs; use \
    get_categories for valid category tags and health_check to verify credentials.";

/// Substrings that mark an argument as secret in the audit log, on top of the
/// credential field names.
const SENSITIVE_MARKERS: [&str; 7] = [
    "token",
    "secret",
    "password",
    "credential",
    "authorization",
    "bearer",
    "api_key",
];

/// Request methods this server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    Ping,
    ListTools,
    CallTool,
    ListResources,
    ReadResource,
}

impl McpMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Self::Initialize),
            "ping" => Some(Self::Ping),
            "tools/list" => Some(Self::ListTools),
            "tools/call" => Some(Self::CallTool),
            "resources/list" => Some(Self::ListResources),
            "resources/read" => Some(Self::ReadResource),
            _ => None,
        }
    }

    /// Checks the whole request envelope against the SDK schema for this method.
    fn accepts(self, payload: Value) -> bool {
        match self {
            Self::Initialize => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
            Self::Ping => serde_json::from_value::<PingRequest>(payload).is_ok(),
            Self::ListTools => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
            Self::CallTool => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
            Self::ListResources => {
                serde_json::from_value::<ListResourcesRequest>(payload).is_ok()
            }
            Self::ReadResource => serde_json::from_value::<ReadResourceRequest>(payload).is_ok(),
        }
    }
}

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, -32600, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, -32600, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => Some(handle_request(state, request).await),
        JsonrpcMessage::Notification(notification) => {
            acknowledge_notification(notification.method.trim());
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, -32600, "Invalid Request"))
        }
    }
}

/// Nothing can be returned to the sender of a notification, so none is dispatched.
fn acknowledge_notification(method: &str) {
    if method.starts_with("notifications/") {
        debug!(method = %method, "mcp notification acknowledged");
    } else {
        warn!(method = %method, "mcp request without id ignored");
    }
}

async fn handle_request(state: &AppState, request: JsonrpcRequest) -> Value {
    let id = Some(request_id_to_value(request.id.clone()));
    let method_name = request.method.trim().to_string();
    if method_name.is_empty() {
        return json_rpc_error(id, -32600, "Invalid Request");
    }

    let params = request.params.clone().map(Value::Object);
    let audit_params = redact_audit_params(params.as_ref());

    let response = match McpMethod::parse(&method_name) {
        None => json_rpc_error(id, -32601, "Method not found"),
        Some(method) if !serde_json::to_value(&request).is_ok_and(|p| method.accepts(p)) => {
            json_rpc_error(id, -32602, "Invalid params")
        }
        Some(method) => dispatch(state, method, id, params).await,
    };

    info!(
        method = %method_name,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

async fn dispatch(
    state: &AppState,
    method: McpMethod,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    match method {
        McpMethod::Initialize => match negotiate_protocol_version(params.as_ref()) {
            Ok(version) => serialized_result(id, &initialize_result(version)),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        McpMethod::Ping => json_rpc_result(id, json!({})),
        McpMethod::ListTools => serialized_result(
            id,
            &ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: build_tools_list(),
            },
        ),
        McpMethod::CallTool => handle_tools_call(state, id, params).await,
        McpMethod::ListResources => serialized_result(
            id,
            &ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: build_resources_list(),
            },
        ),
        McpMethod::ReadResource => handle_resources_read(state, id, params).await,
    }
}

fn serialized_result<T: Serialize>(id: Option<Value>, result: &T) -> Value {
    match serde_json::to_value(result) {
        Ok(value) => json_rpc_result(id, value),
        Err(err) => app_error_to_json_rpc(
            id,
            AppError::internal(format!("mcp result serialization failed: {err}")),
        ),
    }
}

fn initialize_result(protocol_version: ProtocolVersion) -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Adzuna Jobs".to_string()),
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: None,
            ..Default::default()
        },
        protocol_version: protocol_version.into(),
        instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        meta: None,
    }
}

pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<ProtocolVersion, AppError> {
    let offered_version = params
        .and_then(|params| params.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| AppError::validation("protocolVersion", "protocolVersion is required"))?;

    if offered_version != SUPPORTED_PROTOCOL_VERSION {
        return Err(AppError::validation(
            "protocolVersion",
            format!("unsupported protocolVersion; this server speaks {SUPPORTED_PROTOCOL_VERSION}"),
        ));
    }

    Ok(ProtocolVersion::V2024_11_05)
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    match params {
        Some(Value::Object(map)) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    let value = if is_sensitive_key(key) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact_audit_params(Some(item))
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| redact_audit_params(Some(item)))
            .collect(),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// Credential field names plus anything that looks like a token or password.
pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    Credentials::FIELD_NAMES.contains(&normalized.as_str())
        || SENSITIVE_MARKERS
            .iter()
            .any(|marker| normalized.contains(marker))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        is_sensitive_key, negotiate_protocol_version, redact_audit_params, McpMethod,
        SUPPORTED_PROTOCOL_VERSION,
    };

    #[test]
    fn redacts_credentials_and_tokens_in_audit_params() {
        let params = json!({
            "name": "search_jobs",
            "arguments": {
                "what": "data scientist",
                "app_id": "should-not-appear",
                "app_key": "should-not-appear",
                "nested": [{"access_token": "should-not-appear"}]
            }
        });

        let redacted = redact_audit_params(Some(&params));

        assert_eq!(redacted["name"], json!("search_jobs"));
        assert_eq!(redacted["arguments"]["what"], json!("data scientist"));
        assert_eq!(redacted["arguments"]["app_id"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["app_key"], json!("[REDACTED]"));
        assert_eq!(
            redacted["arguments"]["nested"][0]["access_token"],
            json!("[REDACTED]")
        );
    }

    #[test]
    fn search_arguments_are_not_sensitive() {
        for key in ["what", "where", "country", "category", "results_per_page"] {
            assert!(!is_sensitive_key(key), "{key}");
        }
        assert!(is_sensitive_key(" APP_KEY "));
    }

    #[test]
    fn only_request_methods_are_dispatchable() {
        assert_eq!(McpMethod::parse("tools/call"), Some(McpMethod::CallTool));
        assert_eq!(
            McpMethod::parse("resources/read"),
            Some(McpMethod::ReadResource)
        );
        assert_eq!(McpMethod::parse("notifications/initialized"), None);
        assert_eq!(McpMethod::parse("prompts/list"), None);
    }

    #[test]
    fn negotiate_protocol_version_accepts_supported_version() {
        let params = json!({
            "protocolVersion": SUPPORTED_PROTOCOL_VERSION
        });

        let version = negotiate_protocol_version(Some(&params)).expect("supported version");
        assert_eq!(version, rust_mcp_sdk::schema::ProtocolVersion::V2024_11_05);
    }

    #[test]
    fn negotiate_protocol_version_rejects_unsupported_version() {
        let params = json!({
            "protocolVersion": "2026-01-01"
        });

        let error =
            negotiate_protocol_version(Some(&params)).expect_err("unsupported version must fail");
        assert!(error.to_string().contains("protocolVersion"));
    }
}
