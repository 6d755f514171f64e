use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::TrackerConfig;

const USER_AGENT: &str = "rca-report-service/0.1 (issue-reporter)";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Issue payload accepted by `POST /repos/{owner}/{repo}/issues`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
}

/// Subset of the GitHub issue resource we read back
#[derive(Debug, Deserialize)]
struct IssueResponse {
    html_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("unexpected status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Client for the GitHub Issues API, bound to one repository
pub struct GitHubClient {
    client: Client,
    api_base_url: String,
    token: String,
    repo: String,
}

impl GitHubClient {
    /// Build a client when both token and repo are configured, `None` otherwise
    pub fn from_config(config: &TrackerConfig) -> Result<Option<Self>, TrackerError> {
        let Some((token, repo)) = config.credentials() else {
            return Ok(None);
        };

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TrackerError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            token: token.to_string(),
            repo: repo.to_string(),
        }))
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_base_url, self.repo)
    }

    /// Create an issue and return its browser URL.
    ///
    /// One attempt, no retry. Only 200 and 201 count as success.
    pub async fn create_issue(&self, issue: &NewIssue) -> Result<String, TrackerError> {
        let url = self.issues_url();
        debug!("Creating GitHub issue: {} -> {}", issue.title, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .json(issue)
            .send()
            .await
            .map_err(|e| {
                warn!("GitHub request failed: {:?}", e);
                TrackerError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            warn!("GitHub returned status: {}", status);
            return Err(TrackerError::Status(status.as_u16()));
        }

        let body: IssueResponse = response
            .json()
            .await
            .map_err(|e| TrackerError::MalformedResponse(e.to_string()))?;

        body.html_url
            .ok_or_else(|| TrackerError::MalformedResponse("missing html_url".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn config(api_base_url: &str) -> TrackerConfig {
        TrackerConfig {
            token: Some("tok".to_string()),
            repo: Some("acme/rca".to_string()),
            api_base_url: api_base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn issue() -> NewIssue {
        NewIssue {
            title: "Plant A - 2024-01-01 - Conveyor Jam".to_string(),
            body: "**Site:** Plant A".to_string(),
        }
    }

    #[test]
    fn test_from_config_without_credentials_is_none() {
        let mut cfg = config("http://localhost");
        cfg.token = None;
        assert!(GitHubClient::from_config(&cfg).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_issue_returns_html_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/acme/rca/issues")
            .match_header("authorization", "Bearer tok")
            .match_header("accept", GITHUB_ACCEPT)
            .match_header("user-agent", USER_AGENT)
            .match_body(Matcher::Json(json!({
                "title": "Plant A - 2024-01-01 - Conveyor Jam",
                "body": "**Site:** Plant A",
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"number": 7, "html_url": "https://github.com/acme/rca/issues/7"}"#)
            .create_async()
            .await;

        let client = GitHubClient::from_config(&config(&server.url()))
            .unwrap()
            .unwrap();
        let url = client.create_issue(&issue()).await.unwrap();

        assert_eq!(url, "https://github.com/acme/rca/issues/7");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_issue_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/repos/acme/rca/issues")
            .with_status(422)
            .with_body(r#"{"message": "Validation Failed"}"#)
            .create_async()
            .await;

        let client = GitHubClient::from_config(&config(&server.url()))
            .unwrap()
            .unwrap();
        let err = client.create_issue(&issue()).await.unwrap_err();

        assert!(matches!(err, TrackerError::Status(422)));
    }

    #[tokio::test]
    async fn test_create_issue_other_2xx_is_not_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/repos/acme/rca/issues")
            .with_status(202)
            .with_body(r#"{"html_url": "https://github.com/acme/rca/issues/8"}"#)
            .create_async()
            .await;

        let client = GitHubClient::from_config(&config(&server.url()))
            .unwrap()
            .unwrap();

        assert!(matches!(
            client.create_issue(&issue()).await,
            Err(TrackerError::Status(202))
        ));
    }

    #[tokio::test]
    async fn test_create_issue_missing_html_url_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/repos/acme/rca/issues")
            .with_status(201)
            .with_body(r#"{"number": 9}"#)
            .create_async()
            .await;

        let client = GitHubClient::from_config(&config(&server.url()))
            .unwrap()
            .unwrap();

        assert!(matches!(
            client.create_issue(&issue()).await,
            Err(TrackerError::MalformedResponse(_))
        ));
    }
}
