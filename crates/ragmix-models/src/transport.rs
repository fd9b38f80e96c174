use anyhow::{anyhow, bail, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub(crate) fn build_client(api_key: Option<&str>, timeout_secs: u64) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key {
        let value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| anyhow!("invalid API key: {e}"))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(Client::builder().timeout(Duration::from_secs(timeout_secs)).default_headers(headers).build()?)
}

/// POSTs `body` as JSON and decodes the JSON reply. The blocking client runs
/// on a scoped thread because it panics when driven from inside a tokio
/// runtime.
pub(crate) fn post_json<B: Serialize, R: DeserializeOwned>(client: &Client, url: &str, body: &B) -> Result<R> {
    let payload = serde_json::to_vec(body)?;
    let (status, text) = std::thread::scope(|s| {
        s.spawn(|| -> Result<(reqwest::StatusCode, String)> {
            let response = client.post(url).body(payload).send()?;
            let status = response.status();
            Ok((status, response.text()?))
        })
        .join()
    })
    .map_err(|_| anyhow!("HTTP request thread panicked"))??;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&text) {
            bail!("{url} returned {status}: {}", err.error.message);
        }
        bail!("{url} returned {status}: {text}");
    }
    serde_json::from_str(&text).map_err(|e| anyhow!("unexpected response from {url}: {e}"))
}
