//! Shared parameter validation helpers
//!
//! Every raw parameter arrives as an optional string (query strings and
//! stringified MCP arguments alike). Blank optional values count as absent.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::queries::{SortBy, SortDirection};
use crate::errors::AppError;

pub const SUPPORTED_COUNTRIES: [&str; 19] = [
    "at", "au", "be", "br", "ca", "ch", "de", "es", "fr", "gb", "in", "it", "mx", "nl", "nz",
    "pl", "sg", "us", "za",
];
pub const DEFAULT_COUNTRY: &str = "sg";

pub const MIN_RESULTS_PER_PAGE: u32 = 1;
pub const MAX_RESULTS_PER_PAGE: u32 = 50;
pub const DEFAULT_RESULTS_PER_PAGE: u32 = 10;
pub const MAX_DISTANCE_KM: u32 = 1_000;
pub const MAX_DAYS_OLD: u32 = 365;
pub const DEFAULT_HISTORY_MONTHS: u32 = 12;
pub const MAX_HISTORY_MONTHS: u32 = 60;
pub const MAX_LOCATION_DEPTH: usize = 8;

static CATEGORY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid category pattern"));

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    present(value)
}

pub fn normalize_required_text(field: &str, value: Option<String>) -> Result<String, AppError> {
    present(value).ok_or_else(|| AppError::validation(field, format!("{field} is required")))
}

pub fn normalize_country(country: Option<String>) -> Result<String, AppError> {
    let Some(value) = present(country) else {
        return Ok(DEFAULT_COUNTRY.to_string());
    };

    let normalized = value.to_ascii_lowercase();
    if !SUPPORTED_COUNTRIES.contains(&normalized.as_str()) {
        return Err(AppError::validation(
            "country",
            format!("country must be one of: {}", SUPPORTED_COUNTRIES.join(", ")),
        ));
    }

    Ok(normalized)
}

pub fn parse_bounded(
    field: &str,
    value: Option<String>,
    min: u32,
    max: u32,
) -> Result<Option<u32>, AppError> {
    let Some(value) = present(value) else {
        return Ok(None);
    };

    let out_of_range =
        || AppError::validation(field, format!("{field} must be an integer between {min} and {max}"));

    let parsed = value.parse::<u32>().map_err(|_| out_of_range())?;
    if parsed < min || parsed > max {
        return Err(out_of_range());
    }

    Ok(Some(parsed))
}

pub fn normalize_page(page: Option<String>) -> Result<u32, AppError> {
    Ok(parse_bounded("page", page, 1, u32::MAX)?.unwrap_or(1))
}

pub fn normalize_results_per_page(results_per_page: Option<String>) -> Result<u32, AppError> {
    Ok(parse_bounded(
        "results_per_page",
        results_per_page,
        MIN_RESULTS_PER_PAGE,
        MAX_RESULTS_PER_PAGE,
    )?
    .unwrap_or(DEFAULT_RESULTS_PER_PAGE))
}

pub fn parse_flag(field: &str, value: Option<String>) -> Result<bool, AppError> {
    let Some(value) = present(value) else {
        return Ok(false);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::validation(
            field,
            format!("{field} must be a boolean (true/false)"),
        )),
    }
}

pub fn normalize_sort_by(sort_by: Option<String>) -> Result<Option<SortBy>, AppError> {
    let Some(value) = present(sort_by) else {
        return Ok(None);
    };

    let sort_by = match value.to_ascii_lowercase().as_str() {
        "default" => SortBy::Default,
        "hybrid" => SortBy::Hybrid,
        "date" => SortBy::Date,
        "salary" => SortBy::Salary,
        "relevance" => SortBy::Relevance,
        _ => {
            return Err(AppError::validation(
                "sort_by",
                "sort_by must be one of: default, hybrid, date, salary, relevance",
            ))
        }
    };

    Ok(Some(sort_by))
}

pub fn normalize_sort_direction(sort_dir: Option<String>) -> Result<Option<SortDirection>, AppError> {
    let Some(value) = present(sort_dir) else {
        return Ok(None);
    };

    match value.to_ascii_lowercase().as_str() {
        "up" | "asc" => Ok(Some(SortDirection::Up)),
        "down" | "desc" => Ok(Some(SortDirection::Down)),
        _ => Err(AppError::validation(
            "sort_dir",
            "sort_dir must be one of: up, down",
        )),
    }
}

pub fn normalize_category(category: Option<String>) -> Result<Option<String>, AppError> {
    let Some(value) = present(category) else {
        return Ok(None);
    };

    let normalized = value.to_ascii_lowercase();
    if !CATEGORY_TAG.is_match(&normalized) {
        return Err(AppError::validation(
            "category",
            "category must be a category tag such as it-jobs (see get_categories)",
        ));
    }

    Ok(Some(normalized))
}

/// Splits a comma-separated location hierarchy, e.g. `UK, London`.
pub fn normalize_location(location: Option<String>) -> Result<Vec<String>, AppError> {
    let Some(value) = present(location) else {
        return Ok(vec![]);
    };

    let levels = value
        .split(',')
        .map(str::trim)
        .map(str::to_string)
        .collect::<Vec<_>>();

    if levels.iter().any(String::is_empty) {
        return Err(AppError::validation(
            "location",
            "location levels must not be empty",
        ));
    }

    if levels.len() > MAX_LOCATION_DEPTH {
        return Err(AppError::validation(
            "location",
            format!("location must have at most {MAX_LOCATION_DEPTH} comma-separated levels"),
        ));
    }

    Ok(levels)
}

pub fn normalize_salary_bounds(
    salary_min: Option<String>,
    salary_max: Option<String>,
) -> Result<(Option<u32>, Option<u32>), AppError> {
    let salary_min = parse_bounded("salary_min", salary_min, 0, u32::MAX)?;
    let salary_max = parse_bounded("salary_max", salary_max, 0, u32::MAX)?;

    if let (Some(min), Some(max)) = (salary_min, salary_max) {
        if min > max {
            return Err(AppError::validation(
                "salary_min",
                "salary_min must not exceed salary_max",
            ));
        }
    }

    Ok((salary_min, salary_max))
}
