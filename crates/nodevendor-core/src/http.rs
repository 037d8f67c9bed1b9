//! Blocking wrappers around `reqwest` for the synchronous collaborators.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;

const USER_AGENT: &str = concat!("nodevendor/", env!("CARGO_PKG_VERSION"));

pub(crate) fn client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Drive a future to completion on a private runtime.
pub(crate) fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    Ok(runtime.block_on(future))
}

/// GET `url` and return the body, failing on non-success status.
pub(crate) async fn fetch_bytes(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {} from {}", response.status(), url);
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))?;
    Ok(bytes.to_vec())
}
