//! Axum HTTP handlers for the web server
//!
//! One REST route per dispatcher operation, plus the Model Context Protocol
//! endpoint and discovery metadata.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::adzuna::models::{
    ApiVersion, CategoryList, CompanyLeaderboard, GeoData, HealthStatus, SalaryHistogram,
    SalaryHistory, SearchResult,
};
use crate::domain::operations;
use crate::domain::queries::{
    params_rejection, CountryParams, GeodataParams, HealthParams, HistogramParams, HistoryParams,
    SearchParams, TopCompaniesParams, VersionParams,
};
use crate::errors::AppError;
use crate::mcp::rpc::json_rpc_error;
use crate::mcp::server::handle_json_rpc_value;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
    pub health_endpoint: &'static str,
}

type ApiResult<T> = Result<Json<T>, AppError>;

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| params_rejection(&rejection.body_text(), "query"))
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
        health_endpoint: "/health",
    })
}

pub async fn health(
    State(state): State<AppState>,
    params: Result<Query<HealthParams>, QueryRejection>,
) -> ApiResult<HealthStatus> {
    let params = query_params(params)?;
    Ok(Json(operations::health_check(&state, params).await?))
}

pub async fn search_jobs(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<SearchResult> {
    let params = query_params(params)?;
    Ok(Json(operations::search_jobs(&state, params).await?))
}

pub async fn get_categories(
    State(state): State<AppState>,
    params: Result<Query<CountryParams>, QueryRejection>,
) -> ApiResult<CategoryList> {
    let params = query_params(params)?;
    Ok(Json(operations::get_categories(&state, params).await?))
}

pub async fn get_top_companies(
    State(state): State<AppState>,
    params: Result<Query<TopCompaniesParams>, QueryRejection>,
) -> ApiResult<CompanyLeaderboard> {
    let params = query_params(params)?;
    Ok(Json(operations::get_top_companies(&state, params).await?))
}

pub async fn get_salary_histogram(
    State(state): State<AppState>,
    params: Result<Query<HistogramParams>, QueryRejection>,
) -> ApiResult<SalaryHistogram> {
    let params = query_params(params)?;
    Ok(Json(operations::get_salary_histogram(&state, params).await?))
}

pub async fn get_geodata(
    State(state): State<AppState>,
    params: Result<Query<GeodataParams>, QueryRejection>,
) -> ApiResult<GeoData> {
    let params = query_params(params)?;
    Ok(Json(operations::get_geodata(&state, params).await?))
}

pub async fn get_salary_history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<SalaryHistory> {
    let params = query_params(params)?;
    Ok(Json(operations::get_salary_history(&state, params).await?))
}

pub async fn get_api_version(
    State(state): State<AppState>,
    params: Result<Query<VersionParams>, QueryRejection>,
) -> ApiResult<ApiVersion> {
    query_params(params)?;
    Ok(Json(operations::get_api_version(&state).await?))
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(json_rpc_error(None, -32700, "Parse error")),
            )
                .into_response()
        }
    };

    if let Some(batch) = payload.as_array() {
        if batch.is_empty() {
            return (
                StatusCode::OK,
                Json(vec![json_rpc_error(None, -32600, "Invalid Request")]),
            )
                .into_response();
        }

        let mut responses = Vec::new();
        for item in batch {
            if let Some(response) = handle_json_rpc_value(&state, item.clone()).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            return StatusCode::NO_CONTENT.into_response();
        }

        return (StatusCode::OK, Json(Value::Array(responses))).into_response();
    }

    match handle_json_rpc_value(&state, payload).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
