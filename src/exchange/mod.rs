//! Client for the provisioning authority that hands out encrypted seeds.
//!
//! The authority receives this instance's public key and answers with the seed
//! encrypted under it. The response is passed through untouched; decryption
//! happens later through [`crate::seed::provision`].

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Upper bound for one round trip to the authority.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct SeedRequest {
    pub student_id: String,
    pub github_repo_url: String,
    pub public_key: String,
}

#[derive(Debug, Clone)]
pub struct ExchangeClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ExchangeClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST the request and return the `encrypted_seed` field verbatim.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status (the body is
    /// included), a body that is not JSON, or a missing `encrypted_seed` field.
    #[instrument(skip(self, request), fields(endpoint = %self.endpoint, student_id = %request.student_id))]
    pub async fn request_seed(&self, request: &SeedRequest) -> Result<String> {
        debug!("Requesting encrypted seed");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .context("Request to provisioning authority failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read provisioning authority response")?;

        if !status.is_success() {
            bail!("Provisioning authority returned {status}: {body}");
        }

        let encrypted_seed = extract_encrypted_seed(&body)?;
        info!("Received encrypted seed");
        Ok(encrypted_seed)
    }
}

fn extract_encrypted_seed(body: &str) -> Result<String> {
    let json: serde_json::Value =
        serde_json::from_str(body).context("Could not parse response as JSON")?;

    json.get("encrypted_seed")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("Response did not contain 'encrypted_seed': {json}"))
}
