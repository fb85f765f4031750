use crate::api::models::{
    DeleteFilesResponse, DeleteRequest, DiskUsage, OpenSessionResponse, Secret, SecretPayload,
    StartRequest, StartResponse, UserInfo, WorkflowDiff, WorkflowList, WorkflowLogsResponse,
    WorkflowParameters, WorkflowStatusResponse, WorkspaceListing,
};
use crate::error::ApiError;
use crate::storage::config::Session;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;

const USER_AGENT: &str = concat!("reana-client/", env!("CARGO_PKG_VERSION"));

/// Query parameters of `GET /api/workflows`
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowListQuery {
    #[serde(rename = "type")]
    pub workflow_type: String,
    pub verbose: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workflow_id_or_name: String,
    pub include_progress: bool,
    pub include_workspace_size: bool,
    /// Sent as one `status` parameter per value
    #[serde(skip)]
    pub status: Vec<String>,
}

/// Query parameters of `GET /api/workflows/{w}/workspace`
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkspaceQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
}

#[derive(Debug, Clone)]
pub struct ReanaClient {
    client: Client,
    pub base_url: String,
    access_token: String,
}

impl ReanaClient {
    /// Create a client for `server_url`. Certificate verification is disabled
    /// only when `skip_tls_verify` is set.
    pub fn new(server_url: &str, access_token: &str, skip_tls_verify: bool) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(skip_tls_verify)
            .build()
            .map_err(|e| ApiError::Transport {
                endpoint: "client_init".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(ReanaClient {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn from_session(session: &Session) -> Result<Self, ApiError> {
        Self::new(
            &session.server_url,
            &session.access_token,
            session.tls_skip_verify,
        )
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .query(&[("access_token", self.access_token.as_str())])
    }

    async fn execute<T>(&self, request: RequestBuilder, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        self.handle_response(response, endpoint).await
    }

    pub async fn handle_response<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("{} responded with {}", endpoint, status.as_u16());

        let body = if text.trim().is_empty() { "null" } else { text.as_str() };

        if status.is_success() {
            serde_json::from_str::<T>(body).map_err(|e| ApiError::Decode {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })
        } else {
            let payload: Value =
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(text.clone()));
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            Err(ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message,
                payload,
            })
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!("GET {}", path);
        self.execute(self.build_request(Method::GET, path), path).await
    }

    pub async fn you(&self) -> Result<UserInfo, ApiError> {
        self.get("/api/you").await
    }

    pub async fn info(&self) -> Result<Value, ApiError> {
        self.get("/api/info").await
    }

    pub async fn list_workflows(&self, query: &WorkflowListQuery) -> Result<WorkflowList, ApiError> {
        let path = "/api/workflows";
        tracing::debug!("GET {} {:?}", path, query);
        let mut request = self.build_request(Method::GET, path).query(query);
        for status in &query.status {
            request = request.query(&[("status", status.as_str())]);
        }
        self.execute(request, path).await
    }

    pub async fn workflow_status(&self, workflow: &str) -> Result<WorkflowStatusResponse, ApiError> {
        self.get(&format!("/api/workflows/{}/status", workflow)).await
    }

    pub async fn disk_usage(
        &self,
        workflow: &str,
        summarize: bool,
        search: &str,
    ) -> Result<DiskUsage, ApiError> {
        let path = format!("/api/workflows/{}/disk_usage", workflow);
        tracing::debug!("GET {}", path);
        let mut request = self
            .build_request(Method::GET, &path)
            .query(&[("summarize", summarize.to_string())]);
        if !search.is_empty() {
            request = request.query(&[("search", search)]);
        }
        self.execute(request, &path).await
    }

    pub async fn workflow_logs(
        &self,
        workflow: &str,
        page: Option<u32>,
        size: Option<u32>,
    ) -> Result<WorkflowLogsResponse, ApiError> {
        let path = format!("/api/workflows/{}/logs", workflow);
        tracing::debug!("GET {}", path);
        let mut request = self.build_request(Method::GET, &path);
        if let Some(page) = page {
            request = request.query(&[("page", page)]);
        }
        if let Some(size) = size {
            request = request.query(&[("size", size)]);
        }
        self.execute(request, &path).await
    }

    pub async fn workspace(
        &self,
        workflow: &str,
        query: &WorkspaceQuery,
    ) -> Result<WorkspaceListing, ApiError> {
        let path = format!("/api/workflows/{}/workspace", workflow);
        tracing::debug!("GET {} {:?}", path, query);
        let request = self.build_request(Method::GET, &path).query(query);
        self.execute(request, &path).await
    }

    pub async fn diff(
        &self,
        workflow_a: &str,
        workflow_b: &str,
        brief: bool,
        context_lines: u32,
    ) -> Result<WorkflowDiff, ApiError> {
        let path = format!("/api/workflows/{}/diff/{}", workflow_a, workflow_b);
        tracing::debug!("GET {}", path);
        let request = self.build_request(Method::GET, &path).query(&[
            ("brief", brief.to_string()),
            ("context_lines", context_lines.to_string()),
        ]);
        self.execute(request, &path).await
    }

    pub async fn open_session(
        &self,
        workflow: &str,
        session_type: &str,
        image: Option<&str>,
    ) -> Result<OpenSessionResponse, ApiError> {
        let path = format!("/api/workflows/{}/open/{}", workflow, session_type);
        tracing::debug!("POST {}", path);
        let body = match image {
            Some(image) => json!({ "image": image }),
            None => json!({}),
        };
        let request = self.build_request(Method::POST, &path).json(&body);
        self.execute(request, &path).await
    }

    pub async fn close_session(&self, workflow: &str) -> Result<Value, ApiError> {
        let path = format!("/api/workflows/{}/close/", workflow);
        tracing::debug!("POST {}", path);
        self.execute(self.build_request(Method::POST, &path), &path).await
    }

    pub async fn start_workflow(
        &self,
        workflow: &str,
        request_body: &StartRequest,
    ) -> Result<StartResponse, ApiError> {
        let path = format!("/api/workflows/{}/start", workflow);
        tracing::debug!("POST {}", path);
        let request = self.build_request(Method::POST, &path).json(request_body);
        self.execute(request, &path).await
    }

    pub async fn workflow_parameters(&self, workflow: &str) -> Result<WorkflowParameters, ApiError> {
        self.get(&format!("/api/workflows/{}/parameters", workflow)).await
    }

    pub async fn delete_workflow(
        &self,
        workflow: &str,
        request_body: &DeleteRequest,
    ) -> Result<Value, ApiError> {
        let path = format!("/api/workflows/{}/status", workflow);
        tracing::debug!("PUT {} status=deleted", path);
        let request = self
            .build_request(Method::PUT, &path)
            .query(&[("status", "deleted")])
            .json(request_body);
        self.execute(request, &path).await
    }

    pub async fn delete_file(
        &self,
        workflow: &str,
        pattern: &str,
    ) -> Result<DeleteFilesResponse, ApiError> {
        let path = format!("/api/workflows/{}/workspace/{}", workflow, pattern);
        tracing::debug!("DELETE {}", path);
        self.execute(self.build_request(Method::DELETE, &path), &path).await
    }

    pub async fn move_files(
        &self,
        workflow: &str,
        source: &str,
        target: &str,
    ) -> Result<Value, ApiError> {
        let path = format!("/api/workflows/move_files/{}", workflow);
        tracing::debug!("PUT {}", path);
        let request = self
            .build_request(Method::PUT, &path)
            .query(&[("source", source), ("target", target)]);
        self.execute(request, &path).await
    }

    pub async fn add_secrets(
        &self,
        secrets: &BTreeMap<String, SecretPayload>,
        overwrite: bool,
    ) -> Result<Value, ApiError> {
        let path = "/api/secrets/";
        tracing::debug!("POST {} ({} secrets)", path, secrets.len());
        let request = self
            .build_request(Method::POST, path)
            .query(&[("overwrite", overwrite.to_string())])
            .json(secrets);
        self.execute(request, path).await
    }

    pub async fn list_secrets(&self) -> Result<Vec<Secret>, ApiError> {
        self.get("/api/secrets").await
    }

    pub async fn delete_secrets(&self, names: &[String]) -> Result<Value, ApiError> {
        let path = "/api/secrets/";
        tracing::debug!("DELETE {}", path);
        let request = self.build_request(Method::DELETE, path).json(names);
        self.execute(request, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ReanaClient::new("https://localhost:30443/", "token", false);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://localhost:30443");
    }

    #[test]
    fn test_client_creation_skip_tls_verify() {
        assert!(ReanaClient::new("https://localhost:30443", "token", true).is_ok());
    }

    #[test]
    fn test_build_request_attaches_token() {
        let client =
            ReanaClient::new("http://example.test", "secret", false).expect("client creation failed");
        let built_request = client
            .build_request(Method::GET, "/api/you")
            .build()
            .expect("Failed to build request");

        assert_eq!(
            built_request.url().as_str(),
            "http://example.test/api/you?access_token=secret"
        );
        assert_eq!(built_request.method(), Method::GET);
    }

    #[test]
    fn test_build_request_keeps_extra_query() {
        let client =
            ReanaClient::new("http://example.test", "secret", false).expect("client creation failed");
        let built_request = client
            .build_request(Method::PUT, "/api/workflows/move_files/wf")
            .query(&[("source", "a.txt"), ("target", "b.txt")])
            .build()
            .expect("Failed to build request");

        assert_eq!(
            built_request.url().query(),
            Some("access_token=secret&source=a.txt&target=b.txt")
        );
    }

    #[test]
    fn test_list_query_serialization() {
        let client =
            ReanaClient::new("http://example.test", "t", false).expect("client creation failed");
        let query = WorkflowListQuery {
            workflow_type: "batch".to_string(),
            page: Some(2),
            ..WorkflowListQuery::default()
        };
        let built_request = client
            .build_request(Method::GET, "/api/workflows")
            .query(&query)
            .build()
            .expect("Failed to build request");
        let query_string = built_request.url().query().unwrap_or_default().to_string();
        assert!(query_string.contains("type=batch"));
        assert!(query_string.contains("page=2"));
        let keys: Vec<&str> = query_string
            .split('&')
            .filter_map(|pair| pair.split('=').next())
            .collect();
        assert!(!keys.contains(&"search"));
        assert!(!keys.contains(&"size"));
        assert!(keys.contains(&"include_workspace_size"));
    }
}
