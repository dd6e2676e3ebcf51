//! Model Context Protocol static resource providers
//!
//! Exposes the supported country list and a health snapshot under `resource://` URIs.

use rust_mcp_sdk::schema::{
    ReadResourceContent, ReadResourceRequestParams, ReadResourceResult, Resource,
    TextResourceContents,
};
use serde_json::{json, Value};

use crate::domain::operations;
use crate::domain::queries::HealthParams;
use crate::domain::utils::{DEFAULT_COUNTRY, SUPPORTED_COUNTRIES};
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
};
use crate::AppState;

pub const COUNTRIES_RESOURCE_URI: &str = "resource://adzuna/countries";
pub const HEALTH_RESOURCE_URI: &str = "resource://adzuna/health";

pub fn build_resources_list() -> Vec<Resource> {
    vec![
        Resource {
            annotations: None,
            description: Some("Country codes accepted by every job-search tool".to_string()),
            icons: vec![],
            meta: None,
            mime_type: Some("application/json".to_string()),
            name: "Supported Countries".to_string(),
            size: None,
            title: None,
            uri: COUNTRIES_RESOURCE_URI.to_string(),
        },
        Resource {
            annotations: None,
            description: Some("Server health and credential status".to_string()),
            icons: vec![],
            meta: None,
            mime_type: Some("application/json".to_string()),
            name: "Health Snapshot".to_string(),
            size: None,
            title: None,
            uri: HEALTH_RESOURCE_URI.to_string(),
        },
    ]
}

fn text_resource(uri: &str, content: Value) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some("application/json".to_string()),
            text: content.to_string(),
            uri: uri.to_string(),
        })],
        meta: None,
    }
}

pub async fn handle_resources_read(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    match resource_read.uri.as_str() {
        COUNTRIES_RESOURCE_URI => {
            let content = json!({
                "countries": SUPPORTED_COUNTRIES,
                "default": DEFAULT_COUNTRY,
            });
            let result = serde_json::to_value(text_resource(COUNTRIES_RESOURCE_URI, content))
                .expect("read countries result serialization");

            json_rpc_result(id, result)
        }
        HEALTH_RESOURCE_URI => {
            match operations::health_check(state, HealthParams::default()).await {
                Ok(health) => {
                    let result = serde_json::to_value(text_resource(
                        HEALTH_RESOURCE_URI,
                        json!(health),
                    ))
                    .expect("read health result serialization");

                    json_rpc_result(id, result)
                }
                Err(err) => app_error_to_json_rpc(id, err),
            }
        }
        _ => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "resource_not_found",
                "message": "unknown resource uri",
                "details": {
                    "uri": resource_read.uri,
                },
            })),
        ),
    }
}
