//! Normalized result entities and the upstream payload shapes they are parsed from.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid html tag pattern"));

fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

fn scalar_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn scalar_is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => matches!(text.trim(), "1" | "true"),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobListing {
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub area: Vec<String>,
    pub category: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_is_predicted: bool,
    pub contract_time: Option<String>,
    pub contract_type: Option<String>,
    pub created: Option<String>,
    pub description: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub country: String,
    pub page: u32,
    pub results_per_page: u32,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_salary: Option<f64>,
    pub returned: usize,
    pub results: Vec<JobListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub tag: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryList {
    pub country: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRank {
    pub name: String,
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_salary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyLeaderboard {
    pub country: String,
    pub companies: Vec<CompanyRank>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalaryBucket {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalaryHistogram {
    pub country: String,
    pub buckets: Vec<SalaryBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub name: String,
    pub area: Vec<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoData {
    pub country: String,
    pub locations: Vec<LocationCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySalary {
    pub month: String,
    pub average_salary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryHistory {
    pub country: String,
    pub months: Vec<MonthlySalary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiVersion {
    pub api_version: String,
    pub software_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unreachable,
}

impl HealthState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unreachable => "unreachable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub credentials_configured: bool,
}

// Upstream payloads. Every field is optional so that partial records still parse.

#[derive(Debug, Default, Deserialize)]
struct RawNamed {
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLocation {
    display_name: Option<String>,
    #[serde(default)]
    area: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCategory {
    tag: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawJob {
    id: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    created: Option<String>,
    redirect_url: Option<String>,
    company: Option<RawNamed>,
    location: Option<RawLocation>,
    category: Option<RawCategory>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    salary_is_predicted: Option<Value>,
    contract_time: Option<String>,
    contract_type: Option<String>,
}

impl RawJob {
    /// Rows without a title or company name are dropped, like nameless leaderboard rows.
    pub fn into_listing(self) -> Option<JobListing> {
        let title = self
            .title
            .as_deref()
            .map(strip_html)
            .filter(|title| !title.is_empty())?;
        let company = self
            .company
            .and_then(|company| company.display_name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())?;
        let location = self.location.unwrap_or_default();

        Some(JobListing {
            id: scalar_to_string(self.id),
            title,
            company,
            location: location.display_name,
            area: location.area,
            category: self.category.and_then(|category| category.label),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            salary_is_predicted: scalar_is_truthy(self.salary_is_predicted.as_ref()),
            contract_time: self.contract_time,
            contract_type: self.contract_type,
            created: self.created,
            description: self.description.as_deref().map(strip_html),
            redirect_url: self.redirect_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchResponse {
    #[serde(default)]
    pub count: u64,
    pub mean: Option<f64>,
    #[serde(default)]
    pub results: Vec<RawJob>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCategoriesResponse {
    #[serde(default)]
    results: Vec<RawCategory>,
}

impl RawCategoriesResponse {
    pub fn into_categories(self) -> Vec<Category> {
        self.results
            .into_iter()
            .filter_map(|category| {
                let tag = category.tag?;
                let label = category.label.unwrap_or_else(|| tag.clone());
                Some(Category { tag, label })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawCompany {
    canonical_name: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    count: u64,
    average_salary: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTopCompaniesResponse {
    #[serde(default)]
    leaderboard: Vec<RawCompany>,
}

impl RawTopCompaniesResponse {
    pub fn into_companies(self) -> Vec<CompanyRank> {
        self.leaderboard
            .into_iter()
            .filter_map(|company| {
                Some(CompanyRank {
                    name: company.display_name.or(company.canonical_name)?,
                    count: company.count,
                    average_salary: company.average_salary,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHistogramResponse {
    #[serde(default)]
    histogram: HashMap<String, u64>,
}

impl RawHistogramResponse {
    /// Buckets ordered by their numeric floor; non-numeric labels sort last.
    pub fn into_buckets(self) -> Vec<SalaryBucket> {
        let mut buckets = self
            .histogram
            .into_iter()
            .map(|(label, count)| SalaryBucket { label, count })
            .collect::<Vec<_>>();

        buckets.sort_by(|left, right| {
            let floor = |bucket: &SalaryBucket| bucket.label.parse::<f64>().unwrap_or(f64::MAX);
            floor(left)
                .total_cmp(&floor(right))
                .then_with(|| left.label.cmp(&right.label))
        });
        buckets
    }
}

#[derive(Debug, Deserialize)]
struct RawLocationCount {
    location: Option<RawLocation>,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGeodataResponse {
    #[serde(default)]
    locations: Vec<RawLocationCount>,
}

impl RawGeodataResponse {
    pub fn into_locations(self) -> Vec<LocationCount> {
        self.locations
            .into_iter()
            .filter_map(|entry| {
                let location = entry.location?;
                Some(LocationCount {
                    name: location.display_name?,
                    area: location.area,
                    count: entry.count,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHistoryResponse {
    #[serde(default)]
    month: BTreeMap<String, f64>,
}

impl RawHistoryResponse {
    /// `YYYY-MM` keys sort chronologically in a `BTreeMap`.
    pub fn into_months(self) -> Vec<MonthlySalary> {
        self.month
            .into_iter()
            .map(|(month, average_salary)| MonthlySalary {
                month,
                average_salary,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVersionResponse {
    api_version: Option<Value>,
    software_version: Option<Value>,
}

impl From<RawVersionResponse> for ApiVersion {
    fn from(raw: RawVersionResponse) -> Self {
        Self {
            api_version: scalar_to_string(raw.api_version).unwrap_or_default(),
            software_version: scalar_to_string(raw.software_version).unwrap_or_default(),
        }
    }
}
