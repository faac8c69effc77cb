//! HTTP downloads with retry

use futures::StreamExt;
use kiln_config::NetworkConfig;
use kiln_errors::{Error, NetworkError};
use kiln_hash::Hash;
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client wrapper with retry logic
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retries: u32,
    retry_delay: Duration,
}

impl HttpClient {
    /// Create a client from the `network` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn from_config(config: &NetworkConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self {
            client,
            retries: config.retries,
            retry_delay: config.retry_delay_duration(),
        })
    }

    /// Stream `url` into `dest`, hashing the bytes as they arrive
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts, the
    /// server answers with an error status, or the file cannot be written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<Hash, Error> {
        let response = self.get(url).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        let mut stream = response.bytes_stream();
        let mut hasher = blake3::Hasher::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(Hash::from_bytes(*hasher.finalize().as_bytes()))
    }

    async fn get(&self, url: &str) -> Result<Response, Error> {
        let mut last_error = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay * attempt).await;
            }

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error = NetworkError::HttpError {
                        status: status.as_u16(),
                        message: status
                            .canonical_reason()
                            .unwrap_or("unexpected status")
                            .to_string(),
                    };
                    if !Self::should_retry_status(status) {
                        return Err(error.into());
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    last_error = Some(Self::convert(url, &e));
                    if !retry {
                        break;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| NetworkError::DownloadFailed("unknown error".to_string()))
            .into())
    }

    fn convert(url: &str, error: &reqwest::Error) -> NetworkError {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string())
        } else if error.is_builder() {
            NetworkError::InvalidUrl(url.to_string())
        } else {
            NetworkError::DownloadFailed(error.to_string())
        }
    }

    /// Retry on timeout, connection errors, and server errors
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_some_and(|s| s.is_server_error())
    }

    fn should_retry_status(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }
}
