//! JSON-RPC protocol representations and formatting utilities
//!
//! Maps normalized `AppError` categories onto JSON-RPC error payloads.

use serde_json::{json, Value};
use rust_mcp_sdk::schema::{JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError};
use crate::errors::{AppError, ErrorCategory};

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub const UPSTREAM_FAILURE_CODE: i32 = -32002;
pub const UNAVAILABLE_CODE: i32 = -32003;

/// Maps the normalized error category onto a JSON-RPC error, carrying the body as `data`.
pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    let body = err.to_error_body();
    let (code, message) = match body.category {
        ErrorCategory::ClientError => (-32602, "Invalid params"),
        ErrorCategory::UpstreamFailure => (UPSTREAM_FAILURE_CODE, "Upstream error"),
        ErrorCategory::Unavailable => (UNAVAILABLE_CODE, "Service unavailable"),
        ErrorCategory::InternalError => (-32603, "Internal error"),
    };

    let data = serde_json::to_value(&body).expect("error body serialization");
    json_rpc_error_with_data(id, code, message, Some(data))
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data,
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );
    serde_json::to_value(response).expect("jsonrpc error response serialization")
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        return serde_json::to_value(response).expect("jsonrpc result response serialization");
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}
