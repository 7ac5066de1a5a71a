//! AWS SSM Parameter Store source
//!
//! Fetches every parameter under a path with `GetParametersByPath`
//! (recursive, decrypted), draining `NextToken` pagination.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::retry::RetryConfig;
use aws_sdk_ssm::config::{Credentials, Region};
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::Client;
use tracing::{debug, info, warn};

use super::errors::FetchError;
use super::{Parameter, ParameterSource};
use crate::config::SsmConfig;

/// Largest page the API accepts
const PAGE_SIZE: i32 = 10;

/// Delay before each retry, the last value repeats
const BACKOFF_MS: [u64; 3] = [500, 1000, 2000];

/// SSM-backed parameter source
#[derive(Clone, Debug)]
pub struct SsmSource {
    client: Client,
    max_retries: u32,
}

impl SsmSource {
    /// Build a client from the ambient AWS configuration plus `config` overrides
    ///
    /// The SDK's own retries are disabled; failures are retried here instead.
    pub async fn connect(config: &SsmConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_ssm::config::Builder::from(&sdk_config)
            .retry_config(RetryConfig::disabled());
        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint.as_str());
        }
        if let Some((key_id, secret, session_token)) = config.static_credentials() {
            builder = builder.credentials_provider(Credentials::new(
                key_id,
                secret,
                session_token.map(str::to_string),
                None,
                "ssm-param-resolve",
            ));
        }

        let client = Client::from_conf(builder.build());
        info!(
            region = ?config.region,
            endpoint = ?config.endpoint_url,
            max_retries = config.max_retries,
            "SSM parameter source ready"
        );

        Self::from_client(client, config.max_retries)
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, max_retries: u32) -> Self {
        Self {
            client,
            max_retries,
        }
    }

    /// Fetch every page under `path` once, without retrying
    async fn fetch_all_pages(&self, path: &str) -> Result<Vec<Parameter>, FetchError> {
        let mut parameters = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            debug!(path = path, page_token = next_token.is_some(), "Listing parameters from SSM");

            let response = self
                .client
                .get_parameters_by_path()
                .path(path)
                .recursive(true)
                .with_decryption(true)
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(classify)?;

            for parameter in response.parameters() {
                match (parameter.name(), parameter.value()) {
                    (Some(name), Some(value)) => parameters.push(Parameter::new(name, value)),
                    (name, _) => warn!(path = path, name = ?name, "Skipping SSM parameter without name or value"),
                }
            }

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(path = path, count = parameters.len(), "Listed parameters from SSM");
        Ok(parameters)
    }

    /// Execute a fetch with retry logic and backoff
    async fn with_retry<F, Fut, T>(&self, operation: &str, path: &str, f: F) -> Result<T, FetchError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() || attempt >= self.max_retries => return Err(e),
                Err(e) => {
                    let delay = retry_delay(attempt);
                    attempt += 1;
                    warn!(
                        operation = operation,
                        path = path,
                        attempt = attempt,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying SSM operation"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl ParameterSource for SsmSource {
    async fn fetch_by_path(&self, path: &str) -> Result<Vec<Parameter>, FetchError> {
        self.with_retry("get_parameters_by_path", path, || self.fetch_all_pages(path))
            .await
    }
}

fn retry_delay(attempt: u32) -> Duration {
    let ms = BACKOFF_MS
        .get(attempt as usize)
        .copied()
        .unwrap_or(BACKOFF_MS[BACKOFF_MS.len() - 1]);
    Duration::from_millis(ms)
}

/// Map an SDK failure onto a FetchError
fn classify<E, R>(err: SdkError<E, R>) -> FetchError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) => FetchError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => FetchError::Timeout,
        SdkError::DispatchFailure(_) => {
            FetchError::Unavailable(DisplayErrorContext(&err).to_string())
        }
        SdkError::ServiceError(service) => {
            let inner = service.err();
            FetchError::from_code(inner.code(), inner.message().unwrap_or("no message"))
        }
        _ => FetchError::Remote(DisplayErrorContext(&err).to_string()),
    }
}
