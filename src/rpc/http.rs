//! reqwest-backed [`Transport`].

use super::codec::{decode_response, encode_call};
use super::value::Value;
use super::Transport;
use crate::config::ClientConfig;
use crate::error::{Result, UnoError};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::debug;

/// XML-RPC over HTTP(S) POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for the configured endpoint.
    ///
    /// The call deadline is enforced by [`crate::UnoClient`], not here, so
    /// that it applies to every transport alike.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        crate::config::validate_endpoint(&config.endpoint)?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| UnoError::Connection {
                endpoint: config.endpoint.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection_error(&self, e: reqwest::Error) -> UnoError {
        UnoError::Connection {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let body = encode_call(method, &params)?;
        debug!("POST {} {} ({} bytes)", self.endpoint, method, body.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/xml"))
            .body(body)
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UnoError::HttpStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.connection_error(e))?;
        debug!("{} response: {} bytes", method, text.len());

        decode_response(method, &text)
    }
}
