//! Raw per-operation parameters and the validated queries built from them

use serde::{Deserialize, Serialize};

use crate::domain::utils::{
    normalize_category, normalize_country, normalize_location, normalize_optional_text,
    normalize_page, normalize_required_text, normalize_results_per_page, normalize_salary_bounds,
    normalize_sort_by, normalize_sort_direction, parse_bounded, parse_flag,
    DEFAULT_HISTORY_MONTHS, MAX_DAYS_OLD, MAX_DISTANCE_KM, MAX_HISTORY_MONTHS,
};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Default,
    Hybrid,
    Date,
    Salary,
    Relevance,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Hybrid => "hybrid",
            Self::Date => "date",
            Self::Salary => "salary",
            Self::Relevance => "relevance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Up,
    Down,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    pub what: Option<String>,
    pub what_exclude: Option<String>,
    #[serde(rename = "where", alias = "location")]
    pub location: Option<String>,
    pub distance: Option<String>,
    pub country: Option<String>,
    pub page: Option<String>,
    pub results_per_page: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub full_time: Option<String>,
    pub part_time: Option<String>,
    pub contract: Option<String>,
    pub permanent: Option<String>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub max_days_old: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountryParams {
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopCompaniesParams {
    pub country: Option<String>,
    pub what: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramParams {
    pub what: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "where")]
    pub place: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeodataParams {
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryParams {
    pub country: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub months: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionParams {}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthParams {
    pub check_upstream: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub country: String,
    pub page: u32,
    pub results_per_page: u32,
    pub what: String,
    pub what_exclude: Option<String>,
    pub location: Option<String>,
    pub distance_km: Option<u32>,
    pub max_days_old: Option<u32>,
    pub category: Option<String>,
    pub sort_by: Option<SortBy>,
    pub sort_dir: Option<SortDirection>,
    pub full_time: bool,
    pub part_time: bool,
    pub contract: bool,
    pub permanent: bool,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoriesQuery {
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopCompaniesQuery {
    pub country: String,
    pub what: Option<String>,
    pub location: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramQuery {
    pub country: String,
    pub what: String,
    /// Free-text location, sent upstream as `where`.
    pub place: Option<String>,
    pub location: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeodataQuery {
    pub country: String,
    pub location: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub country: String,
    pub location: Vec<String>,
    pub category: Option<String>,
    pub months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthQuery {
    pub check_upstream: bool,
}

/// Turns a parameter decoding failure into a client error, naming the
/// unrecognized field when there is one.
pub fn params_rejection(message: &str, fallback_field: &str) -> AppError {
    let field = message
        .split_once("unknown field `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map_or(fallback_field, |(field, _)| field);
    AppError::validation(field, message)
}

pub fn build_search_query(params: SearchParams) -> Result<SearchQuery, AppError> {
    let what = normalize_required_text("what", params.what)?;
    let (salary_min, salary_max) = normalize_salary_bounds(params.salary_min, params.salary_max)?;

    Ok(SearchQuery {
        country: normalize_country(params.country)?,
        page: normalize_page(params.page)?,
        results_per_page: normalize_results_per_page(params.results_per_page)?,
        what,
        what_exclude: normalize_optional_text(params.what_exclude),
        location: normalize_optional_text(params.location),
        distance_km: parse_bounded("distance", params.distance, 1, MAX_DISTANCE_KM)?,
        max_days_old: parse_bounded("max_days_old", params.max_days_old, 1, MAX_DAYS_OLD)?,
        category: normalize_category(params.category)?,
        sort_by: normalize_sort_by(params.sort_by)?,
        sort_dir: normalize_sort_direction(params.sort_dir)?,
        full_time: parse_flag("full_time", params.full_time)?,
        part_time: parse_flag("part_time", params.part_time)?,
        contract: parse_flag("contract", params.contract)?,
        permanent: parse_flag("permanent", params.permanent)?,
        salary_min,
        salary_max,
    })
}

pub fn build_categories_query(params: CountryParams) -> Result<CategoriesQuery, AppError> {
    Ok(CategoriesQuery {
        country: normalize_country(params.country)?,
    })
}

pub fn build_top_companies_query(params: TopCompaniesParams) -> Result<TopCompaniesQuery, AppError> {
    Ok(TopCompaniesQuery {
        country: normalize_country(params.country)?,
        what: normalize_optional_text(params.what),
        location: normalize_location(params.location)?,
        category: normalize_category(params.category)?,
    })
}

pub fn build_histogram_query(params: HistogramParams) -> Result<HistogramQuery, AppError> {
    Ok(HistogramQuery {
        what: normalize_required_text("what", params.what)?,
        country: normalize_country(params.country)?,
        place: normalize_optional_text(params.place),
        location: normalize_location(params.location)?,
        category: normalize_category(params.category)?,
    })
}

pub fn build_geodata_query(params: GeodataParams) -> Result<GeodataQuery, AppError> {
    Ok(GeodataQuery {
        country: normalize_country(params.country)?,
        location: normalize_location(params.location)?,
        category: normalize_category(params.category)?,
    })
}

pub fn build_history_query(params: HistoryParams) -> Result<HistoryQuery, AppError> {
    Ok(HistoryQuery {
        country: normalize_country(params.country)?,
        location: normalize_location(params.location)?,
        category: normalize_category(params.category)?,
        months: parse_bounded("months", params.months, 1, MAX_HISTORY_MONTHS)?
            .unwrap_or(DEFAULT_HISTORY_MONTHS),
    })
}

pub fn build_health_query(params: HealthParams) -> Result<HealthQuery, AppError> {
    Ok(HealthQuery {
        check_upstream: parse_flag("check_upstream", params.check_upstream)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_params(what: &str) -> SearchParams {
        SearchParams {
            what: Some(what.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn search_query_applies_defaults() {
        let query = build_search_query(search_params("data scientist")).expect("valid query");

        assert_eq!(query.what, "data scientist");
        assert_eq!(query.country, "sg");
        assert_eq!(query.page, 1);
        assert_eq!(query.results_per_page, 10);
        assert!(!query.full_time && !query.part_time && !query.contract && !query.permanent);
        assert!(query.sort_by.is_none());
    }

    #[test]
    fn search_query_requires_keywords() {
        let err = build_search_query(SearchParams::default()).expect_err("missing what");
        assert!(err.to_string().contains("what"));
    }

    #[test]
    fn search_query_parses_every_filter() {
        let query = build_search_query(SearchParams {
            what: Some("software engineer".to_string()),
            what_exclude: Some("manager".to_string()),
            location: Some("New York".to_string()),
            distance: Some("25".to_string()),
            country: Some("US".to_string()),
            page: Some("2".to_string()),
            results_per_page: Some("20".to_string()),
            sort_by: Some("salary".to_string()),
            sort_dir: Some("down".to_string()),
            full_time: Some("true".to_string()),
            part_time: Some("false".to_string()),
            contract: None,
            permanent: Some("1".to_string()),
            salary_min: Some("80000".to_string()),
            salary_max: Some("150000".to_string()),
            max_days_old: Some("14".to_string()),
            category: Some("it-jobs".to_string()),
        })
        .expect("valid query");

        assert_eq!(query.country, "us");
        assert_eq!(query.page, 2);
        assert_eq!(query.results_per_page, 20);
        assert_eq!(query.location.as_deref(), Some("New York"));
        assert_eq!(query.distance_km, Some(25));
        assert_eq!(query.sort_by, Some(SortBy::Salary));
        assert_eq!(query.sort_dir, Some(SortDirection::Down));
        assert!(query.full_time && query.permanent);
        assert!(!query.part_time && !query.contract);
        assert_eq!((query.salary_min, query.salary_max), (Some(80_000), Some(150_000)));
        assert_eq!(query.max_days_old, Some(14));
        assert_eq!(query.category.as_deref(), Some("it-jobs"));
    }

    #[test]
    fn histogram_requires_keywords() {
        let err = build_histogram_query(HistogramParams::default()).expect_err("missing what");
        assert!(err.to_string().contains("bad request"));
    }

    #[test]
    fn histogram_accepts_free_text_where() {
        let params: HistogramParams =
            serde_json::from_value(serde_json::json!({"what": "nurse", "where": "London"}))
                .expect("where is a histogram parameter");

        let query = build_histogram_query(params).expect("valid query");
        assert_eq!(query.place.as_deref(), Some("London"));
        assert!(query.location.is_empty());
    }

    #[test]
    fn misspelled_parameters_are_rejected_naming_the_field() {
        let err = serde_json::from_value::<SearchParams>(serde_json::json!({
            "what": "nurse",
            "results_per_pag": "49"
        }))
        .expect_err("unknown field");

        let err = params_rejection(&err.to_string(), "arguments");
        assert_eq!(
            err.to_error_body().detail,
            Some(serde_json::json!({"field": "results_per_pag"}))
        );
    }

    #[test]
    fn decoding_failures_without_field_use_fallback() {
        let err = params_rejection("invalid type: sequence", "query");
        assert!(err.to_string().starts_with("bad request: query:"));
    }

    #[test]
    fn history_months_default_and_bounds() {
        let query = build_history_query(HistoryParams::default()).expect("defaults");
        assert_eq!(query.months, DEFAULT_HISTORY_MONTHS);

        let err = build_history_query(HistoryParams {
            months: Some("61".to_string()),
            ..Default::default()
        })
        .expect_err("too many months");
        assert!(err.to_string().contains("months"));
    }

    #[test]
    fn top_companies_location_becomes_hierarchy() {
        let query = build_top_companies_query(TopCompaniesParams {
            country: Some("gb".to_string()),
            what: None,
            location: Some("UK,London".to_string()),
            category: None,
        })
        .expect("valid query");

        assert_eq!(query.location, vec!["UK", "London"]);
    }
}
