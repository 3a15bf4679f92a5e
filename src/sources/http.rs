use futures::{stream, StreamExt, TryStreamExt};
use log::{info, warn};
use reqwest::Client;
use url::Url;

use super::RecordSource;
use crate::auth::BearerToken;
use crate::config::AnalysisConfig;
use crate::error::{CohortLensError, Result};
use crate::retention::{AttendanceRecord, RecordPayload};

const CONCURRENCY: usize = 4;
const MAX_PAGES: u32 = 500;

pub struct AttendanceClient {
    client: Client,
    api_url: Url,
    token: Option<BearerToken>,
}

impl AttendanceClient {
    pub fn new(base_url: &str, token: Option<BearerToken>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cohortlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CohortLensError::ConfigError(format!("Failed to create HTTP client: {e}"))
            })?;

        let mut api_url = Url::parse(base_url)?;
        if api_url.cannot_be_a_base() {
            return Err(CohortLensError::ConfigError(format!(
                "Base URL cannot hold endpoint paths: {base_url}"
            )));
        }

        // Url::join replaces the last segment unless the path ends in '/'
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.api_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Fetch one page of rows from an endpoint
    pub async fn fetch_page(
        &self,
        endpoint: &str,
        page: u32,
        per_page: u32,
        config: &AnalysisConfig,
    ) -> Result<Vec<AttendanceRecord>> {
        let url = self.endpoint_url(endpoint)?;

        let mut request = self.client.get(url).query(&[
            ("page", page.to_string()),
            ("perPage", per_page.to_string()),
            ("groupBy", config.group_by.to_string()),
        ]);
        if let Some(since) = config.since {
            request = request.query(&[("startDate", since.to_string())]);
        }
        if let Some(until) = config.until {
            request = request.query(&[("endDate", until.to_string())]);
        }
        request = self.auth_request(request);

        let response = request.send().await?.error_for_status()?;
        let payload = response.json::<RecordPayload>().await?;
        Ok(payload.into_records())
    }
}

/// Pulls records from one or more REST endpoints of the platform.
pub struct HttpSource {
    client: AttendanceClient,
    endpoints: Vec<String>,
    per_page: u32,
}

impl HttpSource {
    pub fn new(client: AttendanceClient, endpoints: Vec<String>, per_page: u32) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(CohortLensError::ConfigError(
                "At least one endpoint is required".to_string(),
            ));
        }
        if per_page == 0 {
            return Err(CohortLensError::ConfigError(
                "Page size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            client,
            endpoints,
            per_page,
        })
    }

    async fn fetch_endpoint(
        &self,
        endpoint: &str,
        config: &AnalysisConfig,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut records = Vec::new();

        for page in 1..=MAX_PAGES {
            let rows = self
                .client
                .fetch_page(endpoint, page, self.per_page, config)
                .await?;
            let fetched = rows.len();
            records.extend(rows);

            // A short page is the last one
            if fetched < self.per_page as usize {
                info!("Fetched {} records from {endpoint}", records.len());
                return Ok(records);
            }
        }

        warn!("Stopped fetching {endpoint} after {MAX_PAGES} pages");
        Ok(records)
    }
}

impl RecordSource for HttpSource {
    fn describe(&self) -> String {
        let endpoints: Vec<String> = self
            .endpoints
            .iter()
            .filter_map(|endpoint| self.client.endpoint_url(endpoint).ok())
            .map(|url| url.to_string())
            .collect();
        endpoints.join(", ")
    }

    async fn load(&self, config: &AnalysisConfig) -> Result<Vec<AttendanceRecord>> {
        info!(
            "Fetching {} endpoint(s) with page size {}...",
            self.endpoints.len(),
            self.per_page
        );

        // Ordered buffering keeps the merged rows in endpoint order
        let batches: Vec<Vec<AttendanceRecord>> = stream::iter(self.endpoints.iter().cloned())
            .map(|endpoint| async move { self.fetch_endpoint(&endpoint, config).await })
            .buffered(CONCURRENCY)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupBy;
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn page_query(page: &str, per_page: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), page.into()),
            Matcher::UrlEncoded("perPage".into(), per_page.into()),
        ])
    }

    #[test]
    fn test_base_url_without_trailing_slash_keeps_its_path() {
        let client = AttendanceClient::new("https://example.com/admin/api", None).unwrap();
        let url = client.endpoint_url("/analytics/attendance").unwrap();

        assert_eq!(
            url.as_str(),
            "https://example.com/admin/api/analytics/attendance"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            AttendanceClient::new("not a url", None),
            Err(CohortLensError::UrlError(_))
        ));
        assert!(matches!(
            AttendanceClient::new("mailto:admin@example.com", None),
            Err(CohortLensError::ConfigError(_))
        ));
    }

    #[test]
    fn test_source_requires_endpoints_and_page_size() {
        let client = || AttendanceClient::new("https://example.com", None).unwrap();

        assert!(HttpSource::new(client(), vec![], 10).is_err());
        assert!(HttpSource::new(client(), vec!["a".to_string()], 0).is_err());
    }

    #[tokio::test]
    async fn test_fetch_page_sends_filters_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/attendance")
            .match_header("authorization", "Bearer secret-token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("perPage".into(), "50".into()),
                Matcher::UrlEncoded("groupBy".into(), "week".into()),
                Matcher::UrlEncoded("startDate".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("endDate".into(), "2024-03-31".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"timestamp": "2024-01-08", "participantId": 7}]}"#)
            .create_async()
            .await;

        let client = AttendanceClient::new(
            &format!("{}/api", server.url()),
            Some(BearerToken::from("secret-token")),
        )
        .unwrap();
        let config = AnalysisConfig {
            group_by: GroupBy::Week,
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            until: NaiveDate::from_ymd_opt(2024, 3, 31),
        };

        let rows = client
            .fetch_page("attendance", 1, 50, &config)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].participant_id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_load_follows_pages_until_short_page() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/attendance")
            .match_query(page_query("1", "2"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"timestamp": "2024-01-01", "participantId": "A"},
                    {"timestamp": "2024-01-02", "participantId": "B"}]"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/attendance")
            .match_query(page_query("2", "2"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"timestamp": "2024-02-01", "participantId": "A"}]"#)
            .create_async()
            .await;
        let events = server
            .mock("GET", "/events")
            .match_query(page_query("1", "2"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = AttendanceClient::new(&server.url(), None).unwrap();
        let source = HttpSource::new(
            client,
            vec!["attendance".to_string(), "events".to_string()],
            2,
        )
        .unwrap();

        let records = source.load(&AnalysisConfig::default()).await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        events.assert_async().await;
        let ids: Vec<&str> = records
            .iter()
            .filter_map(|r| r.participant_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["A", "B", "A"]);
    }

    #[tokio::test]
    async fn test_error_status_is_propagated() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/attendance")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = AttendanceClient::new(&server.url(), None).unwrap();
        let source = HttpSource::new(client, vec!["attendance".to_string()], 10).unwrap();

        let error = source.load(&AnalysisConfig::default()).await.unwrap_err();

        assert!(matches!(error, CohortLensError::NetworkError(_)));
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_collect_report_runs_through_http_source() {
        let mut server = mockito::Server::new_async().await;
        let _attendance = server
            .mock("GET", "/attendance")
            .match_query(page_query("1", "10"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"timestamp": "2024-01-03", "participantId": "A"},
                    {"timestamp": "2024-01-04", "participantId": "B"},
                    {"timestamp": "2024-02-05", "participantId": "B"}]"#,
            )
            .create_async()
            .await;
        let _events = server
            .mock("GET", "/events")
            .match_query(page_query("1", "10"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"timestamp": "2024-02-20", "participantId": "C"}]}"#)
            .create_async()
            .await;

        let client = AttendanceClient::new(&server.url(), None).unwrap();
        let source = HttpSource::new(
            client,
            vec!["attendance".to_string(), "events".to_string()],
            10,
        )
        .unwrap();
        let config = AnalysisConfig::default();

        let pending = crate::sources::collect_report(&source, &config);
        assert_send(&pending);
        let report = pending.await.unwrap();

        assert_eq!(report.total_records, 4);
        assert_eq!(report.intervals.len(), 2);
        assert_eq!(report.intervals[1].retention_rate, Some(0.5));
        assert!(report.source.contains("/attendance"));
        assert!(report.source.contains("/events"));
    }
}
