//! Minimal GitHub REST client.
//!
//! Covers exactly the two operations the platform needs: repository creation
//! and branch protection. The wire format is GitHub's; everything above this
//! module sees only the worker's uniform endpoints.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::GitHubConfig;

const DEFAULT_API_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("transport error calling GitHub: {0}")]
    Transport(String),
    #[error("GitHub returned status {status}: {message}")]
    Api { status: u16, message: String },
}

pub struct GitHubClient {
    api_url: String,
    token: String,
    http: Client,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("idp-execution-workers")
            .build()?;
        Ok(Self {
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: config.token.clone(),
            http,
        })
    }

    /// Creates a repository under `owner` (an organization) or under the
    /// authenticated user when `owner` is empty. Returns the provider's
    /// repository object.
    pub async fn create_repository(
        &self,
        owner: &str,
        name: &str,
        private: bool,
    ) -> Result<Value, GitHubError> {
        let path = if owner.is_empty() {
            "/user/repos".to_string()
        } else {
            format!("/orgs/{owner}/repos")
        };

        self.post_json(&path, &json!({ "name": name, "private": private }))
            .await
    }

    /// Requires at least one approving review on `branch`.
    pub async fn protect_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{owner}/{repo}/branches/{branch}/protection");
        // The protection endpoint requires all four top-level fields.
        let body = json!({
            "required_status_checks": null,
            "enforce_admins": false,
            "required_pull_request_reviews": { "required_approving_review_count": 1 },
            "restrictions": null,
        });

        let response = self
            .http
            .put(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GitHubError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(GitHubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, GitHubError> {
        let response = self
            .http
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .json(body)
            .send()
            .await
            .map_err(|e| GitHubError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GitHubError::Transport(format!("decoding GitHub response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{post, put};
    use axum::{Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(api_url: String) -> GitHubClient {
        GitHubClient::new(&GitHubConfig {
            token: "test-token".into(),
            api_url: Some(api_url),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn create_repository_targets_org_endpoint() {
        let router = Router::new().route(
            "/orgs/platform/repos",
            post(|Json(body): Json<Value>| async move {
                (
                    StatusCode::CREATED,
                    Json(json!({"full_name": format!("platform/{}", body["name"].as_str().unwrap())})),
                )
            }),
        );
        let base = serve(router).await;

        let created = client(base)
            .create_repository("platform", "appenv-ae-1", true)
            .await
            .unwrap();

        assert_eq!(created["full_name"], "platform/appenv-ae-1");
    }

    #[tokio::test]
    async fn provider_errors_carry_status_and_body() {
        let router = Router::new().route(
            "/orgs/platform/repos",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "name already exists") }),
        );
        let base = serve(router).await;

        let err = client(base)
            .create_repository("platform", "appenv-ae-1", true)
            .await
            .unwrap_err();

        match err {
            GitHubError::Api { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("name already exists"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn protect_branch_puts_protection_rules() {
        let router = Router::new().route(
            "/repos/platform/appenv-ae-1/branches/main/protection",
            put(|Json(body): Json<Value>| async move {
                assert_eq!(
                    body["required_pull_request_reviews"]["required_approving_review_count"],
                    1
                );
                StatusCode::OK
            }),
        );
        let base = serve(router).await;

        client(base)
            .protect_branch("platform", "appenv-ae-1", "main")
            .await
            .unwrap();
    }
}
