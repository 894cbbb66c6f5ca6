use crate::SummarizeError;
use reqwest::{header::HeaderMap, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// A completed HTTP exchange. The body is read eagerly so the caller can
/// decide between the success and error paths.
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// POST a JSON body and read the full response as text.
/// Only transport failures are errors here; every status is returned.
pub async fn post_json<T: Serialize>(
    client: &Client,
    url: &str,
    data: &T,
    headers: HeaderMap,
    timeout: Option<Duration>,
) -> Result<RawResponse, SummarizeError> {
    let mut request = client.post(url).headers(headers).json(data);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    Ok(RawResponse { status, body })
}
