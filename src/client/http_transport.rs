use async_trait::async_trait;
use futures::TryStreamExt;

use crate::client::error::{ClientError, Result};
use crate::client::secret::SecretString;
use crate::client::transport::{Transport, TransportResponse};

/// A `reqwest`-backed [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured reqwest client (proxies, timeouts, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, credential: &SecretString) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let content_length = response.content_length();
        let owned_url = url.to_string();
        let body = response
            .bytes_stream()
            .map_err(move |e| ClientError::Transport {
                url: owned_url.clone(),
                message: e.to_string(),
            });

        Ok(TransportResponse {
            status,
            content_length,
            body: Box::pin(body),
        })
    }
}
