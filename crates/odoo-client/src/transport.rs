//! Remote method invocation over XML-RPC.

use std::sync::Arc;

use async_trait::async_trait;
use odoo_proto::{MethodCall, MethodResponse, Value};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};
use url::Url;

use crate::config::ClientConfig;
use crate::error::TransportError;

/// Bodies of failed HTTP responses are cut to this many bytes in errors.
const MAX_ERROR_BODY: usize = 512;

/// Performs one remote call against an endpoint path.
///
/// Implementations must not retry and must not interpret faults beyond
/// turning them into [`TransportError::Fault`]. Calls take `&self` so that
/// several can be in flight at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` with positional `params` on `path`.
    async fn call(&self, path: &str, method: &str, params: Vec<Value>)
        -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(
        &self,
        path: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, TransportError> {
        (**self).call(path, method, params).await
    }
}

/// XML-RPC over HTTP(S) using `reqwest`.
///
/// Idle connections are not kept, so every call opens a fresh connection.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the server described by `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .user_agent(concat!("odoo-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.endpoint("/"),
            http,
        })
    }

    /// Full URL of an endpoint path.
    pub fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        path: &str,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, TransportError> {
        let url = self.endpoint(path);
        let body = MethodCall::new(method, params).to_xml();
        debug!(%url, method, bytes = body.len(), "xml-rpc call");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        trace!(status = status.as_u16(), bytes = text.len(), "xml-rpc response");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(text, MAX_ERROR_BODY),
            });
        }

        match MethodResponse::from_xml(&text)? {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault(fault) => {
                debug!(method, code = fault.code, "xml-rpc fault");
                Err(TransportError::Fault(fault))
            }
        }
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push_str("...");
    }
    text
}
