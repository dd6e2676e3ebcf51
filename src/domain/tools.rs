//! Interactive tools exposed via Model Context Protocol
//!
//! One tool per dispatcher operation. Tool structs only describe the input
//! schema; arguments are stringified and funneled through the same
//! parameter structs the REST routes use.

use chrono::{SecondsFormat, Utc};
use rust_mcp_sdk::{
    macros,
    schema::{CallToolRequestParams, CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::operations;
use crate::domain::queries::{params_rejection, VersionParams};
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
};
use crate::{errors::AppError, AppState};

#[macros::mcp_tool(
    name = "search_jobs",
    description = "Search Adzuna job listings with keyword, location, pagination, sort and filter options"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct SearchJobsTool {
    /// Keywords to search for, e.g. 'data scientist'
    pub what: String,
    /// Keywords to exclude from results
    pub what_exclude: Option<String>,
    /// Free-text location, e.g. 'Singapore' or 'New York'
    #[serde(rename = "where")]
    pub location: Option<String>,
    /// Search radius around the location in kilometres (1-1000)
    pub distance: Option<u32>,
    /// Country code, e.g. 'sg', 'us', 'gb' (default 'sg')
    pub country: Option<String>,
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Results per page (1-50, default 10)
    pub results_per_page: Option<u32>,
    /// Sort key: default, hybrid, date, salary or relevance
    pub sort_by: Option<String>,
    /// Sort direction: up or down
    pub sort_dir: Option<String>,
    /// Only full-time positions
    pub full_time: Option<bool>,
    /// Only part-time positions
    pub part_time: Option<bool>,
    /// Only contract positions
    pub contract: Option<bool>,
    /// Only permanent positions
    pub permanent: Option<bool>,
    /// Minimum salary
    pub salary_min: Option<u32>,
    /// Maximum salary
    pub salary_max: Option<u32>,
    /// Only listings posted within this many days (1-365)
    pub max_days_old: Option<u32>,
    /// Category tag, e.g. 'it-jobs' (see get_categories)
    pub category: Option<String>,
}

#[macros::mcp_tool(
    name = "get_categories",
    description = "List the job category tags available in a country"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetCategoriesTool {
    /// Country code (default 'sg')
    pub country: Option<String>,
}

#[macros::mcp_tool(
    name = "get_top_companies",
    description = "Get the companies with the most open positions in a country"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetTopCompaniesTool {
    /// Country code (default 'sg')
    pub country: Option<String>,
    /// Optional keywords to restrict the leaderboard
    pub what: Option<String>,
    /// Comma-separated location hierarchy, e.g. 'UK,London'
    pub location: Option<String>,
    /// Category tag, e.g. 'it-jobs'
    pub category: Option<String>,
}

#[macros::mcp_tool(
    name = "get_salary_histogram",
    description = "Get the salary distribution of jobs matching a search"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetSalaryHistogramTool {
    /// Keywords to search for, e.g. 'data scientist'
    pub what: String,
    /// Country code (default 'sg')
    pub country: Option<String>,
    /// Free-text location, e.g. 'London'
    #[serde(rename = "where")]
    pub place: Option<String>,
    /// Comma-separated location hierarchy, e.g. 'UK,London'
    pub location: Option<String>,
    /// Category tag, e.g. 'it-jobs'
    pub category: Option<String>,
}

#[macros::mcp_tool(
    name = "get_geodata",
    description = "Get open job counts per location within a country or region"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetGeodataTool {
    /// Country code (default 'sg')
    pub country: Option<String>,
    /// Comma-separated location hierarchy, e.g. 'UK,London'
    pub location: Option<String>,
    /// Category tag, e.g. 'it-jobs'
    pub category: Option<String>,
}

#[macros::mcp_tool(
    name = "get_salary_history",
    description = "Get the monthly average advertised salary over time"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetSalaryHistoryTool {
    /// Country code (default 'sg')
    pub country: Option<String>,
    /// Comma-separated location hierarchy, e.g. 'UK,London'
    pub location: Option<String>,
    /// Category tag, e.g. 'it-jobs'
    pub category: Option<String>,
    /// Number of months of history (1-60, default 12)
    pub months: Option<u32>,
}

#[macros::mcp_tool(
    name = "get_api_version",
    description = "Get the version of the upstream Adzuna API"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetApiVersionTool {}

#[macros::mcp_tool(
    name = "health_check",
    description = "Report whether the server is running and its Adzuna credentials are configured"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct HealthCheckTool {
    /// Also probe the upstream API (one outbound call)
    pub check_upstream: Option<bool>,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![
        SearchJobsTool::tool(),
        GetCategoriesTool::tool(),
        GetTopCompaniesTool::tool(),
        GetSalaryHistogramTool::tool(),
        GetGeodataTool::tool(),
        GetSalaryHistoryTool::tool(),
        GetApiVersionTool::tool(),
        HealthCheckTool::tool(),
    ]
}

/// Stringifies scalar tool arguments so they share the REST parameter structs.
pub fn arguments_to_params<T: DeserializeOwned>(
    arguments: Option<Map<String, Value>>,
) -> Result<T, AppError> {
    let mut flattened = Map::new();
    for (key, value) in arguments.unwrap_or_default() {
        let text = match value {
            Value::Null => continue,
            Value::String(text) => text,
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::validation(
                    key,
                    "argument must be a string, number or boolean",
                ))
            }
        };
        flattened.insert(key, Value::String(text));
    }

    serde_json::from_value(Value::Object(flattened))
        .map_err(|err| params_rejection(&err.to_string(), "arguments"))
}

fn render_tool_result<R: Serialize>(
    id: Option<Value>,
    outcome: Result<R, AppError>,
    summarize: impl FnOnce(&R) -> String,
) -> Value {
    let result = match outcome {
        Ok(result) => result,
        Err(err) => return app_error_to_json_rpc(id, err),
    };

    let summary = summarize(&result);
    let mut structured_content = match serde_json::to_value(&result) {
        Ok(Value::Object(map)) => map,
        Ok(other) => Map::from_iter([("result".to_string(), other)]),
        Err(err) => {
            return app_error_to_json_rpc(
                id,
                AppError::internal(format!("tool result serialization failed: {err}")),
            )
        }
    };
    structured_content.insert(
        "generated_at_utc".to_string(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    json_rpc_result(
        id,
        serde_json::to_value(CallToolResult {
            content: vec![ContentBlock::from(TextContent::new(summary, None, None))],
            is_error: None,
            meta: None,
            structured_content: Some(structured_content),
        })
        .expect("tool result serialization"),
    )
}

pub async fn handle_tools_call(
    state: &AppState,
    id: Option<Value>,
    params: Option<Value>,
) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };
    let arguments = tool_call.arguments;

    match tool_call.name.as_str() {
        "search_jobs" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(id, operations::search_jobs(state, params).await, |result| {
                format!(
                    "Returned {} of {} jobs (page {})",
                    result.returned, result.count, result.page
                )
            })
        }
        "get_categories" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(id, operations::get_categories(state, params).await, |result| {
                format!("Returned {} categories", result.categories.len())
            })
        }
        "get_top_companies" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(
                id,
                operations::get_top_companies(state, params).await,
                |result| format!("Returned {} companies", result.companies.len()),
            )
        }
        "get_salary_histogram" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(
                id,
                operations::get_salary_histogram(state, params).await,
                |result| format!("Returned {} salary buckets", result.buckets.len()),
            )
        }
        "get_geodata" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(id, operations::get_geodata(state, params).await, |result| {
                format!("Returned {} locations", result.locations.len())
            })
        }
        "get_salary_history" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(
                id,
                operations::get_salary_history(state, params).await,
                |result| format!("Returned {} months of salary history", result.months.len()),
            )
        }
        "get_api_version" => {
            if let Err(err) = arguments_to_params::<VersionParams>(arguments) {
                return app_error_to_json_rpc(id, err);
            }
            render_tool_result(id, operations::get_api_version(state).await, |result| {
                format!("Adzuna API version {}", result.api_version)
            })
        }
        "health_check" => {
            let params = match arguments_to_params(arguments) {
                Ok(params) => params,
                Err(err) => return app_error_to_json_rpc(id, err),
            };
            render_tool_result(id, operations::health_check(state, params).await, |result| {
                format!(
                    "Status {}, credentials configured: {}",
                    result.status.as_str(),
                    result.credentials_configured
                )
            })
        }
        _ => json_rpc_error_with_data(
            id,
            -32601,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": tool_call.name,
                },
            })),
        ),
    }
}
