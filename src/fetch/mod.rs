// src/fetch/mod.rs
pub mod urls;

use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

// fbref serves an error page to unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Build the shared HTTP client.
pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(Into::into)
}

/// Fetch one page as text, retrying transient failures.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => return Ok(body),
                Err(_) if attempt < MAX_RETRIES => {
                    sleep(RETRY_DELAY).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            },
            Ok(resp) => return Err(anyhow::anyhow!("HTTP error: {}", resp.status())),
            Err(_) if attempt < MAX_RETRIES => {
                sleep(RETRY_DELAY).await;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
