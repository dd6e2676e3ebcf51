//! Upstream client adapter for the Adzuna job-search API
//!
//! Turns validated queries into exactly one outbound GET request each and
//! parses the response into the normalized entities in [`models`].

pub mod models;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header::ACCEPT, redirect, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{Config, Credentials};
use crate::domain::queries::{
    CategoriesQuery, GeodataQuery, HistogramQuery, HistoryQuery, SearchQuery, TopCompaniesQuery,
};
use crate::errors::AppError;
use models::{
    ApiVersion, CategoryList, CompanyLeaderboard, GeoData, RawCategoriesResponse,
    RawGeodataResponse, RawHistogramResponse, RawHistoryResponse, RawJob, RawSearchResponse,
    RawTopCompaniesResponse, RawVersionResponse, SalaryHistogram, SalaryHistory, SearchResult,
};

pub const MAX_BODY_EXCERPT_CHARS: usize = 512;
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait JobsProvider: Send + Sync {
    fn credentials_configured(&self) -> bool;
    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, AppError>;
    async fn categories(&self, query: &CategoriesQuery) -> Result<CategoryList, AppError>;
    async fn top_companies(
        &self,
        query: &TopCompaniesQuery,
    ) -> Result<CompanyLeaderboard, AppError>;
    async fn histogram(&self, query: &HistogramQuery) -> Result<SalaryHistogram, AppError>;
    async fn geodata(&self, query: &GeodataQuery) -> Result<GeoData, AppError>;
    async fn salary_history(&self, query: &HistoryQuery) -> Result<SalaryHistory, AppError>;
    async fn version(&self) -> Result<ApiVersion, AppError>;
}

/// Path and operation-specific query pairs of one outbound call, without credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub path: String,
    pub params: Vec<(&'static str, String)>,
}

fn push_location(params: &mut Vec<(&'static str, String)>, levels: &[String]) {
    const KEYS: [&str; 8] = [
        "location0",
        "location1",
        "location2",
        "location3",
        "location4",
        "location5",
        "location6",
        "location7",
    ];
    for (key, level) in KEYS.into_iter().zip(levels) {
        params.push((key, level.clone()));
    }
}

pub fn search_request(query: &SearchQuery) -> UpstreamRequest {
    let mut params = vec![
        ("results_per_page", query.results_per_page.to_string()),
        ("what", query.what.clone()),
    ];

    if let Some(what_exclude) = &query.what_exclude {
        params.push(("what_exclude", what_exclude.clone()));
    }
    if let Some(location) = &query.location {
        params.push(("where", location.clone()));
    }
    if let Some(distance) = query.distance_km {
        params.push(("distance", distance.to_string()));
    }
    if let Some(max_days_old) = query.max_days_old {
        params.push(("max_days_old", max_days_old.to_string()));
    }
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }
    if let Some(sort_by) = query.sort_by {
        params.push(("sort_by", sort_by.as_str().to_string()));
    }
    if let Some(sort_dir) = query.sort_dir {
        params.push(("sort_dir", sort_dir.as_str().to_string()));
    }
    for (key, enabled) in [
        ("full_time", query.full_time),
        ("part_time", query.part_time),
        ("contract", query.contract),
        ("permanent", query.permanent),
    ] {
        if enabled {
            params.push((key, "1".to_string()));
        }
    }
    if let Some(salary_min) = query.salary_min {
        params.push(("salary_min", salary_min.to_string()));
    }
    if let Some(salary_max) = query.salary_max {
        params.push(("salary_max", salary_max.to_string()));
    }

    UpstreamRequest {
        path: format!("/jobs/{}/search/{}", query.country, query.page),
        params,
    }
}

pub fn categories_request(query: &CategoriesQuery) -> UpstreamRequest {
    UpstreamRequest {
        path: format!("/jobs/{}/categories", query.country),
        params: vec![],
    }
}

pub fn top_companies_request(query: &TopCompaniesQuery) -> UpstreamRequest {
    let mut params = vec![];
    if let Some(what) = &query.what {
        params.push(("what", what.clone()));
    }
    push_location(&mut params, &query.location);
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }

    UpstreamRequest {
        path: format!("/jobs/{}/top_companies", query.country),
        params,
    }
}

pub fn histogram_request(query: &HistogramQuery) -> UpstreamRequest {
    let mut params = vec![("what", query.what.clone())];
    if let Some(place) = &query.place {
        params.push(("where", place.clone()));
    }
    push_location(&mut params, &query.location);
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }

    UpstreamRequest {
        path: format!("/jobs/{}/histogram", query.country),
        params,
    }
}

pub fn geodata_request(query: &GeodataQuery) -> UpstreamRequest {
    let mut params = vec![];
    push_location(&mut params, &query.location);
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }

    UpstreamRequest {
        path: format!("/jobs/{}/geodata", query.country),
        params,
    }
}

pub fn history_request(query: &HistoryQuery) -> UpstreamRequest {
    let mut params = vec![];
    push_location(&mut params, &query.location);
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }
    params.push(("months", query.months.to_string()));

    UpstreamRequest {
        path: format!("/jobs/{}/history", query.country),
        params,
    }
}

pub fn version_request() -> UpstreamRequest {
    UpstreamRequest {
        path: "/version".to_string(),
        params: vec![],
    }
}

/// Masks credential values and caps the excerpt length.
pub fn body_excerpt(body: &str, credentials: &Credentials) -> String {
    let mut masked = body.to_string();
    for secret in [&credentials.app_key, &credentials.app_id] {
        if !secret.is_empty() {
            masked = masked.replace(secret.as_str(), "[REDACTED]");
        }
    }

    if masked.chars().count() <= MAX_BODY_EXCERPT_CHARS {
        return masked;
    }

    let mut excerpt = masked.chars().take(MAX_BODY_EXCERPT_CHARS).collect::<String>();
    excerpt.push_str("...");
    excerpt
}

fn transport_error(err: reqwest::Error) -> AppError {
    let timed_out = err.is_timeout();
    AppError::Transport {
        message: err.without_url().to_string(),
        timed_out,
    }
}

#[derive(Debug, Clone)]
pub struct AdzunaClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
    missing_credentials: Vec<&'static str>,
}

impl AdzunaClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(MAX_CONNECT_TIMEOUT))
            // Credentials ride in the query string and must not follow a redirect.
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            credentials: config.credentials(),
            missing_credentials: config.missing_credentials(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: UpstreamRequest) -> Result<T, AppError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::NotConfigured {
                missing: self.missing_credentials.clone(),
            })?;

        let mut params = Vec::from(credentials.query_pairs());
        params.extend(request.params);
        params.push(("content-type", "application/json".to_string()));

        let started_at = Instant::now();
        let response = self
            .http
            .get(format!("{}{}", self.base_url, request.path))
            .header(ACCEPT, "application/json")
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        let elapsed_ms = started_at.elapsed().as_millis();

        if !status.is_success() {
            warn!(
                path = %request.path,
                status = status.as_u16(),
                duration_ms = elapsed_ms,
                "upstream call failed"
            );
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body: body_excerpt(&body, credentials),
            });
        }

        debug!(
            path = %request.path,
            status = status.as_u16(),
            duration_ms = elapsed_ms,
            "upstream call completed"
        );

        serde_json::from_str(&body).map_err(|err| AppError::Decode {
            message: format!("{}: {err}", request.path),
        })
    }
}

#[async_trait]
impl JobsProvider for AdzunaClient {
    fn credentials_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResult, AppError> {
        let raw: RawSearchResponse = self.get_json(search_request(query)).await?;

        let results = raw
            .results
            .into_iter()
            .filter_map(RawJob::into_listing)
            .take(query.results_per_page as usize)
            .collect::<Vec<_>>();

        Ok(SearchResult {
            country: query.country.clone(),
            page: query.page,
            results_per_page: query.results_per_page,
            count: raw.count,
            mean_salary: raw.mean,
            returned: results.len(),
            results,
        })
    }

    async fn categories(&self, query: &CategoriesQuery) -> Result<CategoryList, AppError> {
        let raw: RawCategoriesResponse = self.get_json(categories_request(query)).await?;
        Ok(CategoryList {
            country: query.country.clone(),
            categories: raw.into_categories(),
        })
    }

    async fn top_companies(
        &self,
        query: &TopCompaniesQuery,
    ) -> Result<CompanyLeaderboard, AppError> {
        let raw: RawTopCompaniesResponse = self.get_json(top_companies_request(query)).await?;
        Ok(CompanyLeaderboard {
            country: query.country.clone(),
            companies: raw.into_companies(),
        })
    }

    async fn histogram(&self, query: &HistogramQuery) -> Result<SalaryHistogram, AppError> {
        let raw: RawHistogramResponse = self.get_json(histogram_request(query)).await?;
        Ok(SalaryHistogram {
            country: query.country.clone(),
            buckets: raw.into_buckets(),
        })
    }

    async fn geodata(&self, query: &GeodataQuery) -> Result<GeoData, AppError> {
        let raw: RawGeodataResponse = self.get_json(geodata_request(query)).await?;
        Ok(GeoData {
            country: query.country.clone(),
            locations: raw.into_locations(),
        })
    }

    async fn salary_history(&self, query: &HistoryQuery) -> Result<SalaryHistory, AppError> {
        let raw: RawHistoryResponse = self.get_json(history_request(query)).await?;
        Ok(SalaryHistory {
            country: query.country.clone(),
            months: raw.into_months(),
        })
    }

    async fn version(&self) -> Result<ApiVersion, AppError> {
        let raw: RawVersionResponse = self.get_json(version_request()).await?;
        Ok(ApiVersion::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::domain::queries::{build_search_query, SearchParams};
    use crate::domain::utils::SUPPORTED_COUNTRIES;
    use crate::errors::ErrorCategory;

    fn config_for(base_url: &str, with_credentials: bool) -> Config {
        let mut vars = HashMap::from([
            ("ADZUNA_BASE_URL".to_string(), base_url.to_string()),
            ("ADZUNA_TIMEOUT_SECS".to_string(), "2".to_string()),
        ]);
        if with_credentials {
            vars.insert("ADZUNA_APP_ID".to_string(), "test-id".to_string());
            vars.insert("ADZUNA_APP_KEY".to_string(), "test-key".to_string());
        }
        Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
    }

    fn client_for(base_url: &str) -> AdzunaClient {
        AdzunaClient::new(&config_for(base_url, true)).expect("client builds")
    }

    fn search_query(pairs: &[(&str, &str)]) -> SearchQuery {
        let params: HashMap<&str, &str> = pairs.iter().copied().collect();
        build_search_query(SearchParams {
            what: params.get("what").map(|value| value.to_string()),
            country: params.get("country").map(|value| value.to_string()),
            results_per_page: params.get("results_per_page").map(|value| value.to_string()),
            page: params.get("page").map(|value| value.to_string()),
            ..Default::default()
        })
        .expect("valid search query")
    }

    #[test]
    fn search_path_embeds_country_verbatim() {
        for country in SUPPORTED_COUNTRIES {
            let request = search_request(&search_query(&[("what", "nurse"), ("country", country)]));
            assert_eq!(request.path, format!("/jobs/{country}/search/1"));
        }
    }

    #[test]
    fn search_request_only_sends_enabled_flags() {
        let mut query = search_query(&[("what", "driver")]);
        query.full_time = true;
        query.contract = false;

        let request = search_request(&query);
        assert!(request.params.contains(&("full_time", "1".to_string())));
        assert!(!request.params.iter().any(|(key, _)| *key == "contract"));
        assert!(!request.params.iter().any(|(key, _)| *key == "app_key"));
    }

    #[test]
    fn location_hierarchy_maps_to_numbered_keys() {
        let request = geodata_request(&GeodataQuery {
            country: "gb".to_string(),
            location: vec!["UK".to_string(), "London".to_string()],
            category: None,
        });

        assert_eq!(request.path, "/jobs/gb/geodata");
        assert_eq!(
            request.params,
            vec![
                ("location0", "UK".to_string()),
                ("location1", "London".to_string())
            ]
        );
    }

    #[test]
    fn body_excerpt_masks_credentials_and_truncates() {
        let credentials = Credentials {
            app_id: "id-123".to_string(),
            app_key: "key-456".to_string(),
        };
        let body = format!("bad key key-456 for id-123 {}", "x".repeat(1_000));

        let excerpt = body_excerpt(&body, &credentials);
        assert!(!excerpt.contains("key-456"));
        assert!(!excerpt.contains("id-123"));
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), MAX_BODY_EXCERPT_CHARS + 3);
    }

    #[tokio::test]
    async fn search_sends_credentials_and_preserves_upstream_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/jobs/sg/search/1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("app_id".into(), "test-id".into()),
                Matcher::UrlEncoded("app_key".into(), "test-key".into()),
                Matcher::UrlEncoded("what".into(), "data scientist".into()),
                Matcher::UrlEncoded("results_per_page".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "count": 100,
                    "mean": 91000.5,
                    "results": [
                        {"id": "2", "title": "Senior Data Scientist", "company": {"display_name": "Tech Corp"}},
                        {"id": "1", "title": "Data Analyst", "company": {"display_name": "Finance Co"}},
                        {"id": "3", "title": "ML Engineer", "company": {"display_name": "Robots Ltd"}}
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let query = search_query(&[
            ("what", "data scientist"),
            ("country", "sg"),
            ("results_per_page", "5"),
        ]);
        let result = client.search(&query).await.expect("search succeeds");

        mock.assert_async().await;
        assert_eq!(result.count, 100);
        assert_eq!(result.returned, 3);
        assert!(result.results.len() <= 5);
        let ids = result
            .results
            .iter()
            .map(|job| job.id.clone().unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert!(result
            .results
            .iter()
            .all(|job| !job.title.is_empty() && !job.company.is_empty()));
    }

    #[tokio::test]
    async fn search_truncates_oversized_upstream_pages() {
        let mut server = Server::new_async().await;
        let jobs = (0..8)
            .map(|index| {
                json!({
                    "id": index.to_string(),
                    "title": format!("Job {index}"),
                    "company": {"display_name": "Acme"}
                })
            })
            .collect::<Vec<_>>();
        let _mock = server
            .mock("GET", "/jobs/sg/search/1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"count": 8, "results": jobs}).to_string())
            .create_async()
            .await;

        let client = client_for(&server.url());
        let query = search_query(&[("what", "anything"), ("results_per_page", "5")]);
        let result = client.search(&query).await.expect("search succeeds");

        assert_eq!(result.returned, 5);
        assert_eq!(result.results[4].title, "Job 4");
    }

    #[tokio::test]
    async fn upstream_500_is_reported_once_without_retry() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/jobs/sg/search/1")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body(r#"{"error":"Internal server error"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .search(&search_query(&[("what", "test")]))
            .await
            .expect_err("upstream failure");

        mock.assert_async().await;
        assert_eq!(err.category(), ErrorCategory::UpstreamFailure);
        match err {
            AppError::Upstream { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("Internal server error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limited_response_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/jobs/gb/categories")
            .match_query(Matcher::Any)
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .categories(&CategoriesQuery {
                country: "gb".to_string(),
            })
            .await
            .expect_err("rate limited");

        mock.assert_async().await;
        assert!(matches!(err, AppError::Upstream { status: 429, .. }));
    }

    #[test]
    fn histogram_forwards_free_text_location_as_where() {
        let request = histogram_request(&HistogramQuery {
            country: "gb".to_string(),
            what: "nurse".to_string(),
            place: Some("London".to_string()),
            location: vec![],
            category: None,
        });

        assert_eq!(request.path, "/jobs/gb/histogram");
        assert_eq!(
            request.params,
            vec![
                ("what", "nurse".to_string()),
                ("where", "London".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn redirects_are_reported_instead_of_followed() {
        let mut server = Server::new_async().await;
        let redirect = server
            .mock("GET", "/jobs/sg/categories")
            .match_query(Matcher::Any)
            .with_status(302)
            .with_header("location", "/elsewhere")
            .expect(1)
            .create_async()
            .await;
        let target = server
            .mock("GET", "/elsewhere")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .categories(&CategoriesQuery {
                country: "sg".to_string(),
            })
            .await
            .expect_err("redirect is not followed");

        redirect.assert_async().await;
        target.assert_async().await;
        assert!(matches!(err, AppError::Upstream { status: 302, .. }));
    }

    #[tokio::test]
    async fn search_skips_listings_without_title_or_company() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/jobs/sg/search/1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({"count": 3, "results": [
                    {"id": "1", "title": "Nurse", "company": {"display_name": "Clinic"}},
                    {"id": "2", "title": "Porter"},
                    {"id": "3", "company": {"display_name": "Clinic"}}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let result = client
            .search(&search_query(&[("what", "nurse")]))
            .await
            .expect("search succeeds");

        assert_eq!(result.count, 3);
        assert_eq!(result.returned, 1);
        assert_eq!(result.results[0].company, "Clinic");
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/jobs/sg/histogram")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .histogram(&HistogramQuery {
                country: "sg".to_string(),
                what: "nurse".to_string(),
                place: None,
                location: vec![],
                category: None,
            })
            .await
            .expect_err("decode failure");

        assert!(matches!(err, AppError::Decode { .. }));
        assert_eq!(err.category(), ErrorCategory::InternalError);
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_outbound_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = AdzunaClient::new(&config_for(&server.url(), false)).expect("client builds");
        assert!(!client.credentials_configured());

        let err = client.version().await.expect_err("not configured");
        mock.assert_async().await;
        match err {
            AppError::NotConfigured { missing } => {
                assert_eq!(missing, vec!["ADZUNA_APP_ID", "ADZUNA_APP_KEY"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error_without_credentials_in_message() {
        // Port 9 (discard) is reserved and closed on test hosts.
        let client = client_for("http://127.0.0.1:9");
        let err = client.version().await.expect_err("connection refused");

        assert_eq!(err.category(), ErrorCategory::Unavailable);
        let rendered = serde_json::to_string(&err.to_error_body()).expect("serialize body");
        assert!(!rendered.contains("test-key"));
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn top_companies_history_and_version_parse() {
        let mut server = Server::new_async().await;
        let _companies = server
            .mock("GET", "/jobs/sg/top_companies")
            .match_query(Matcher::UrlEncoded("location0".into(), "Singapore".into()))
            .with_status(200)
            .with_body(
                json!({"leaderboard": [
                    {"canonical_name": "tech-corp", "count": 50},
                    {"canonical_name": "finance-co", "count": 35}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let _history = server
            .mock("GET", "/jobs/sg/history")
            .match_query(Matcher::UrlEncoded("months".into(), "3".into()))
            .with_status(200)
            .with_body(json!({"month": {"2024-02": 5100.0, "2024-01": 5000.0}}).to_string())
            .create_async()
            .await;
        let _version = server
            .mock("GET", "/version")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"api_version": 1, "software_version": "1.0.0-abc"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server.url());

        let leaderboard = client
            .top_companies(&TopCompaniesQuery {
                country: "sg".to_string(),
                what: None,
                location: vec!["Singapore".to_string()],
                category: None,
            })
            .await
            .expect("top companies");
        assert_eq!(leaderboard.companies[0].name, "tech-corp");
        assert_eq!(leaderboard.companies[1].count, 35);

        let history = client
            .salary_history(&HistoryQuery {
                country: "sg".to_string(),
                location: vec![],
                category: None,
                months: 3,
            })
            .await
            .expect("history");
        assert_eq!(history.months[0].month, "2024-01");

        let version = client.version().await.expect("version");
        assert_eq!(version.api_version, "1");
        assert_eq!(version.software_version, "1.0.0-abc");
    }
}
