//! Authenticated JSON calls against Google REST APIs.

use std::sync::Arc;

use grantwatch_application::CredentialProvider;
use grantwatch_core::{AppError, AppResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

const ERROR_BODY_LIMIT: usize = 512;

/// HTTP client that signs every request with the ambient credential.
#[derive(Clone)]
pub struct GoogleApiClient {
    http_client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl GoogleApiClient {
    /// Creates an API client. Timeouts are taken from `http_client`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http_client,
            credentials,
        }
    }

    /// Sends a GET and decodes the JSON response.
    pub async fn get_json<T>(&self, url: Url, operation: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.http_client.get(url), operation)
            .await?;
        decode_json(response, operation).await
    }

    /// Sends a JSON body with `method` and decodes the JSON response.
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
        operation: &str,
    ) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.http_client.request(method, url).json(body), operation)
            .await?;
        decode_json(response, operation).await
    }

    /// Sends a DELETE, ignoring the response body.
    pub async fn delete(&self, url: Url, operation: &str) -> AppResult<()> {
        self.execute(self.http_client.delete(url), operation)
            .await
            .map(|_| ())
    }

    async fn execute(&self, builder: RequestBuilder, operation: &str) -> AppResult<Response> {
        let token = self.credentials.ambient_token().await?;
        let response = builder
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|error| transport_error(&error, operation))?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(status_error(response, operation).await)
    }
}

/// Joins `path` onto `base_url` and parses the result.
pub(crate) fn api_url(base_url: &str, path: &str) -> AppResult<Url> {
    let raw = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|error| AppError::Internal(format!("invalid API url '{raw}': {error}")))
}

/// Maps a reqwest transport failure.
pub(crate) fn transport_error(error: &reqwest::Error, operation: &str) -> AppError {
    if error.is_timeout() {
        AppError::Timeout(format!("{operation} timed out"))
    } else {
        AppError::Upstream(format!("{operation} transport error: {error}"))
    }
}

/// Maps a non-success response.
pub(crate) async fn status_error(response: Response, operation: &str) -> AppError {
    let status = response.status();
    let mut body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
    if body.len() > ERROR_BODY_LIMIT {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }

    let message = format!("{operation} failed with status {status}: {body}");
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AppError::Timeout(message),
        _ => AppError::Upstream(message),
    }
}

async fn decode_json<T>(response: Response, operation: &str) -> AppResult<T>
where
    T: DeserializeOwned,
{
    response.json::<T>().await.map_err(|error| {
        if error.is_timeout() {
            AppError::Timeout(format!("{operation} timed out reading the response"))
        } else {
            AppError::Upstream(format!("{operation} returned an unreadable body: {error}"))
        }
    })
}
