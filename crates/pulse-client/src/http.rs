use async_trait::async_trait;
use pulse_core::{
    mask_sensitive, ApiError, DashboardConfig, DateRange, FunnelQuery, FunnelReport, Project,
    ProjectKey, ReportingApi, ServiceError, ServiceResult,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

const PROJECTS_PATH: &str = "api/projects";
const FUNNEL_PATH: &str = "api/reports/funnel";
const EVENT_NAMES_PATH: &str = "api/events/names";

/// Reporting API client over HTTP
#[derive(Clone)]
pub struct HttpReportingClient {
    client: Client,
    base_url: Url,
}

impl HttpReportingClient {
    pub fn new(config: &DashboardConfig) -> ServiceResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(token) = config.api_token.as_deref() {
            debug!("Using API token {}", mask_sensitive(token));
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                ServiceError::Configuration {
                    message: format!("invalid API token: {}", e),
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(config.base_url()?),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid endpoint '{}': {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("Reporting API request: GET {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            warn!("Reporting API {} returned {}", path, status);
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// `Url::join` drops the last path segment unless it ends with a slash
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn range_params(range: &DateRange, params: &mut Vec<(&'static str, String)>) {
    if let Some(from) = range.from_param() {
        params.push(("from", from.to_string()));
    }
    if let Some(to) = range.to_param() {
        params.push(("to", to.to_string()));
    }
}

#[async_trait]
impl ReportingApi for HttpReportingClient {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json(PROJECTS_PATH, &[]).await
    }

    async fn get_funnel(&self, query: &FunnelQuery) -> Result<FunnelReport, ApiError> {
        // One `steps` pair per step, in funnel order
        let mut params = vec![("projectKey", query.project_key.to_string())];
        params.extend(query.steps.iter().map(|step| ("steps", step.clone())));
        params.push(("mode", query.mode.as_str().to_string()));
        range_params(&query.range, &mut params);
        if let Some(process_name) = &query.process_name {
            params.push(("processName", process_name.clone()));
        }

        self.get_json(FUNNEL_PATH, &params).await
    }

    async fn get_event_names(
        &self,
        project_key: &ProjectKey,
        range: &DateRange,
    ) -> Result<Vec<String>, ApiError> {
        let mut params = vec![("projectKey", project_key.to_string())];
        range_params(range, &mut params);
        self.get_json(EVENT_NAMES_PATH, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::FunnelMode;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> HttpReportingClient {
        let config = DashboardConfig {
            api_base_url: server.uri(),
            api_token: token.map(str::to_string),
            ..DashboardConfig::default()
        };
        HttpReportingClient::new(&config).unwrap()
    }

    fn funnel_query(mode: FunnelMode, process_name: Option<&str>) -> FunnelQuery {
        FunnelQuery {
            project_key: ProjectKey::new("shop"),
            steps: vec!["app_open".to_string(), "purchase".to_string()],
            range: DateRange::new("2024-01-01", ""),
            mode,
            process_name: process_name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_list_projects_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Shop", "projectKey": "shop", "isActive": true, "createdAt": "2024-01-01"},
                {"name": "Blog", "projectKey": "blog", "isActive": false}
            ])))
            .mount(&server)
            .await;

        let projects = client_for(&server, Some("secret-token"))
            .list_projects()
            .await
            .unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].project_key.as_str(), "shop");
        assert!(!projects[1].is_active);
        assert_eq!(projects[1].created_at, None);
    }

    #[tokio::test]
    async fn test_get_funnel_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reports/funnel"))
            .and(query_param("projectKey", "shop"))
            .and(query_param("steps", "app_open"))
            .and(query_param("steps", "purchase"))
            .and(query_param("mode", "user"))
            .and(query_param("from", "2024-01-01"))
            .and(query_param_is_missing("to"))
            .and(query_param_is_missing("processName"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "steps": [
                    {"eventName": "app_open", "users": 1000},
                    {"eventName": "purchase", "users": 100}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = client_for(&server, None)
            .get_funnel(&funnel_query(FunnelMode::User, None))
            .await
            .unwrap();

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[1].users, 100);
    }

    #[tokio::test]
    async fn test_get_funnel_process_mode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reports/funnel"))
            .and(query_param("mode", "process"))
            .and(query_param("processName", "checkout"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"steps": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let report = client_for(&server, None)
            .get_funnel(&funnel_query(FunnelMode::Process, Some("checkout")))
            .await
            .unwrap();
        assert!(report.steps.is_empty());
    }

    #[tokio::test]
    async fn test_http_error_keeps_body_for_banner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reports/funnel"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "Unknown event 'purchase'"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_funnel(&funnel_query(FunnelMode::User, None))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Http { status: 400, .. }));
        assert_eq!(err.user_message(), "Unknown event 'purchase'");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/events/names"))
            .and(query_param("projectKey", "shop"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .get_event_names(&ProjectKey::new("shop"), &DateRange::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_event_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/events/names"))
            .and(query_param("to", "2024-02-01"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!(["app_open", "login", "purchase"])),
            )
            .mount(&server)
            .await;

        let names = client_for(&server, None)
            .get_event_names(&ProjectKey::new("shop"), &DateRange::new("", "2024-02-01"))
            .await
            .unwrap();
        assert_eq!(names, vec!["app_open", "login", "purchase"]);
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analytics/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let config = DashboardConfig {
            api_base_url: format!("{}/analytics", server.uri()),
            ..DashboardConfig::default()
        };
        let client = HttpReportingClient::new(&config).unwrap();
        assert!(client.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_step_names_with_commas_are_sent_intact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reports/funnel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "steps": [
                    {"eventName": "checkout,step", "users": 40},
                    {"eventName": "purchase", "users": 10}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut query = funnel_query(FunnelMode::User, None);
        query.steps = vec!["checkout,step".to_string(), "purchase".to_string()];

        let report = client_for(&server, None).get_funnel(&query).await.unwrap();
        assert_eq!(report.steps[0].event_name, "checkout,step");

        let requests = server.received_requests().await.unwrap();
        let steps: Vec<String> = requests[0]
            .url
            .query_pairs()
            .filter(|(k, _)| k == "steps")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(steps, vec!["checkout,step", "purchase"]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = DashboardConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..DashboardConfig::default()
        };
        let err = HttpReportingClient::new(&config)
            .unwrap()
            .list_projects()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err
            .user_message()
            .starts_with("Could not reach the reporting API"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DashboardConfig {
            api_base_url: "ftp://example.com".to_string(),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            HttpReportingClient::new(&config),
            Err(ServiceError::Configuration { .. })
        ));
    }
}
