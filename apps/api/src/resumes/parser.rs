//! Client for the third-party resume parsing API.
//!
//! The raw file is posted as an octet stream; the service answers with
//! JSON describing the candidate.
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::resume::ParsedResume;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct ResumeParserClient {
    client: Client,
    url: String,
    api_key: String,
}

impl ResumeParserClient {
    pub fn new(url: String, api_key: String) -> Result<Self, ParserError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            url,
            api_key,
        })
    }

    /// Sends the file to the parser.
    /// Retries on 429 and 5xx with exponential backoff; other failures return at once.
    pub async fn parse(&self, file: Bytes) -> Result<ParsedResume, ParserError> {
        let mut last_error: Option<ParserError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Resume parser attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.url)
                .header("content-type", "application/octet-stream")
                .header("apikey", &self.api_key)
                .body(file.clone())
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ParserError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await?;

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("Resume parser returned {}: {}", status, body);
                last_error = Some(ParserError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                return Err(ParserError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            debug!("Resume parser succeeded ({} bytes of JSON)", body.len());
            return parse_response(&body);
        }

        Err(last_error.unwrap_or(ParserError::Api {
            status: 0,
            message: format!("no response after {MAX_ATTEMPTS} attempts"),
        }))
    }
}

fn parse_response(body: &str) -> Result<ParsedResume, ParserError> {
    Ok(serde_json::from_str(body)?)
}
