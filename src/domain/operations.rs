//! Endpoint dispatcher shared by the REST routes and the MCP tools
//!
//! Each operation validates its parameters before touching the upstream
//! provider, so a validation failure never costs an outbound call.

use tracing::warn;

use crate::adzuna::models::{
    ApiVersion, CategoryList, CompanyLeaderboard, GeoData, HealthState, HealthStatus,
    SalaryHistogram, SalaryHistory, SearchResult,
};
use crate::domain::queries::{
    build_categories_query, build_geodata_query, build_health_query, build_histogram_query,
    build_history_query, build_search_query, build_top_companies_query, CountryParams,
    GeodataParams, HealthParams, HistogramParams, HistoryParams, SearchParams,
    TopCompaniesParams,
};
use crate::{errors::AppError, AppState};

pub async fn search_jobs(state: &AppState, params: SearchParams) -> Result<SearchResult, AppError> {
    let query = build_search_query(params)?;
    state.jobs_provider.search(&query).await
}

pub async fn get_categories(
    state: &AppState,
    params: CountryParams,
) -> Result<CategoryList, AppError> {
    let query = build_categories_query(params)?;
    state.jobs_provider.categories(&query).await
}

pub async fn get_top_companies(
    state: &AppState,
    params: TopCompaniesParams,
) -> Result<CompanyLeaderboard, AppError> {
    let query = build_top_companies_query(params)?;
    state.jobs_provider.top_companies(&query).await
}

pub async fn get_salary_histogram(
    state: &AppState,
    params: HistogramParams,
) -> Result<SalaryHistogram, AppError> {
    let query = build_histogram_query(params)?;
    state.jobs_provider.histogram(&query).await
}

pub async fn get_geodata(state: &AppState, params: GeodataParams) -> Result<GeoData, AppError> {
    let query = build_geodata_query(params)?;
    state.jobs_provider.geodata(&query).await
}

pub async fn get_salary_history(
    state: &AppState,
    params: HistoryParams,
) -> Result<SalaryHistory, AppError> {
    let query = build_history_query(params)?;
    state.jobs_provider.salary_history(&query).await
}

pub async fn get_api_version(state: &AppState) -> Result<ApiVersion, AppError> {
    state.jobs_provider.version().await
}

/// Local credential check; only probes upstream when `check_upstream` is set.
pub async fn health_check(state: &AppState, params: HealthParams) -> Result<HealthStatus, AppError> {
    let query = build_health_query(params)?;
    let credentials_configured = state.jobs_provider.credentials_configured();

    let status = if !credentials_configured {
        HealthState::Degraded
    } else if query.check_upstream {
        match state.jobs_provider.version().await {
            Ok(_) => HealthState::Healthy,
            Err(err) => {
                warn!(error = %err, "upstream health probe failed");
                HealthState::Unreachable
            }
        }
    } else {
        HealthState::Healthy
    };

    Ok(HealthStatus {
        status,
        credentials_configured,
    })
}
