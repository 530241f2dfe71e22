//! Coomer API HTTP client.

use std::time::Duration;

use rand::Rng;
use reqwest::{header, Client, Proxy};
use tokio::time::sleep;

use crate::api::types::{Creator, PostsPage};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};

/// Posts returned per listing page.
pub const PAGE_SIZE: u64 = 50;

/// Build the HTTP client shared by listing requests and file transfers.
pub fn build_http_client(network: &NetworkConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&network.user_agent)
        .connect_timeout(network.transfer_timeout());

    if let Some(proxy) = &network.proxy {
        let proxy = Proxy::all(proxy)
            .map_err(|e| Error::Config(format!("Invalid proxy '{}': {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))
}

/// Listing client for one creator.
pub struct CoomerApi {
    client: Client,
    creator: Creator,
    request_timeout: Duration,
    page_delay_ms: (u64, u64),
}

impl CoomerApi {
    /// Create a listing client for a creator over a shared HTTP client.
    pub fn new(client: Client, creator: Creator, request_timeout: Duration) -> Self {
        Self {
            client,
            creator,
            request_timeout,
            page_delay_ms: (0, 0),
        }
    }

    /// Set the random delay range slept between page requests.
    pub fn with_page_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.page_delay_ms = (min_ms, max_ms.max(min_ms));
        self
    }

    /// Fetch one listing page starting at `offset`.
    pub async fn get_posts_page(&self, offset: u64) -> Result<PostsPage> {
        let url = self.creator.posts_url();
        tracing::debug!("GET {} (o={})", url, offset);

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .timeout(self.request_timeout);
        if offset > 0 {
            request = request.query(&[("o", offset)]);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(Error::HttpStatus { status, url });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(Error::MalformedResponse {
                url,
                message: "empty body".to_string(),
            });
        }

        let page: PostsPage =
            serde_json::from_str(&text).map_err(|e| Error::MalformedResponse {
                url: url.clone(),
                message: format!(
                    "{} - Response: {}",
                    e,
                    text.chars().take(200).collect::<String>()
                ),
            })?;

        if !page.is_consistent() {
            return Err(Error::MalformedResponse {
                url,
                message: format!(
                    "{} posts but {} attachment lists and {} image flags",
                    page.results.len(),
                    page.result_attachments.len(),
                    page.result_is_image.len()
                ),
            });
        }

        Ok(page)
    }

    /// Fetch every listing page for the creator.
    ///
    /// The first page is required, since it carries the total post count.
    /// Later pages that fail or do not decode are logged and skipped.
    pub async fn get_all_posts(&self) -> Result<PostsPage> {
        let mut posts = self.get_posts_page(0).await?;
        let expected = posts.props.count;

        tracing::info!(
            "Creator: {}, service: {}, posts: {}",
            self.creator.user_name,
            self.creator.service,
            expected
        );

        for page_index in 1..=expected / PAGE_SIZE {
            self.page_delay().await;

            let offset = page_index * PAGE_SIZE;
            match self.get_posts_page(offset).await {
                Ok(page) => posts.extend(page),
                Err(e) => tracing::warn!("Skipping listing page at offset {}: {}", offset, e),
            }
        }

        if posts.len() as u64 != expected {
            tracing::warn!(
                "Collected {} posts but the listing reported {}",
                posts.len(),
                expected
            );
        }

        Ok(posts)
    }

    async fn page_delay(&self) {
        let (min_ms, max_ms) = self.page_delay_ms;
        if max_ms == 0 {
            return;
        }
        let delay_ms = rand::thread_rng().gen_range(min_ms..=max_ms);
        sleep(Duration::from_millis(delay_ms)).await;
    }
}
