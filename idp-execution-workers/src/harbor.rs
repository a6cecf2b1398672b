//! Registry robot-token rotation client.
//!
//! `base_url` points at an endpoint that knows how to rotate the configured
//! robot account and answer `{"token": "<new-token>"}`: either the registry
//! itself or a small internal facade in front of it.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::HarborConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum HarborError {
    #[error("transport error calling registry: {0}")]
    Transport(String),
    #[error("registry returned status {0}")]
    Status(u16),
    #[error("registry response missing token field")]
    MissingToken,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

pub struct HarborClient {
    base_url: String,
    username: String,
    password: String,
    http: Client,
}

impl HarborClient {
    pub fn new(config: &HarborConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            username: config.robot_username.clone(),
            password: config.robot_password.clone(),
            http,
        })
    }

    /// Rotates the robot token and returns the new credential for immediate
    /// propagation.
    pub async fn rotate_robot_token(&self) -> Result<String, HarborError> {
        let response = self
            .http
            .post(&self.base_url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| HarborError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarborError::Status(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| HarborError::Transport(format!("decoding registry response: {e}")))?;
        if body.token.is_empty() {
            return Err(HarborError::MissingToken);
        }
        Ok(body.token)
    }
}
