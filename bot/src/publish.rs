//! Durable posting of a composed thread.
//!
//! Drafts go out strictly in order, each reply anchored to the id the
//! endpoint returned for the previous draft. Transient failures retry the
//! same draft with capped exponential backoff and unbounded attempts:
//! publication either eventually succeeds or the process is terminated by
//! hand, there is no poison-pill abandonment path.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;

use crate::compose::PostDraft;
use crate::config::PublisherConfig;

/// Opaque post identifier returned by the publishing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

/// Errors from the publishing endpoint. All are treated as transient.
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP request failed before a response arrived
    #[error("publish request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("publish endpoint error: status {status}: {message}")]
    Endpoint { status: u16, message: String },
}

/// Trait for the create-post operation of the publishing endpoint.
#[async_trait]
pub trait PublishClient: Send + Sync {
    /// Submit one post, optionally as a reply, returning its id.
    ///
    /// # Errors
    /// Fails when the request fails or the endpoint answers non-success.
    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&PostId>,
        suppress_preview: bool,
    ) -> Result<PostId, PublishError>;
}

#[derive(Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to: Option<&'a str>,
    suppress_preview: bool,
}

#[derive(Deserialize)]
struct CreatePostResponse {
    id: String,
}

/// HTTP-based implementation of [`PublishClient`].
pub struct HttpPublishClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpPublishClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    /// Create a client with a custom `reqwest::Client` (for testing with
    /// custom config).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl PublishClient for HttpPublishClient {
    async fn create_post(
        &self,
        text: &str,
        reply_to: Option<&PostId>,
        suppress_preview: bool,
    ) -> Result<PostId, PublishError> {
        let url = format!("{}/posts", self.base_url);
        let body = CreatePostRequest {
            text,
            in_reply_to: reply_to.map(|id| id.0.as_str()),
            suppress_preview,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PublishError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatePostResponse = response.json().await?;
        Ok(PostId(created.id))
    }
}

/// Posts a thread's drafts in order with pacing and retry.
pub struct Publisher<'a> {
    client: &'a dyn PublishClient,
    posting_enabled: bool,
    pacing: Duration,
    initial_backoff: Duration,
    backoff_multiplier: u32,
    max_backoff: Duration,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a dyn PublishClient, config: &PublisherConfig) -> Self {
        Self {
            client,
            posting_enabled: config.posting_enabled,
            pacing: Duration::from_secs(config.rate_limit_delay_seconds),
            initial_backoff: Duration::from_secs(config.initial_backoff_seconds),
            backoff_multiplier: config.backoff_multiplier.max(1),
            max_backoff: Duration::from_secs(config.max_backoff_seconds),
        }
    }

    /// Post every draft in order, returning one id per draft.
    ///
    /// In dry-run mode (`posting_enabled = false`) the drafts are logged and
    /// the returned list is empty, which keeps the cursor from advancing
    /// downstream.
    pub async fn publish(&self, thread: &[PostDraft]) -> Vec<PostId> {
        if !self.posting_enabled {
            for (index, draft) in thread.iter().enumerate() {
                tracing::info!(
                    index,
                    reply = draft.reply_to_previous,
                    no_preview = draft.suppress_preview,
                    text = %draft.text,
                    "dry run: would post"
                );
            }
            return Vec::new();
        }

        let mut ids: Vec<PostId> = Vec::with_capacity(thread.len());
        for (index, draft) in thread.iter().enumerate() {
            if index > 0 {
                sleep(self.pacing).await;
            }
            let reply_to = if draft.reply_to_previous {
                ids.last()
            } else {
                None
            };
            let id = self.post_with_retry(draft, reply_to).await;
            ids.push(id);
        }
        ids
    }

    async fn post_with_retry(&self, draft: &PostDraft, reply_to: Option<&PostId>) -> PostId {
        let mut delay = self.initial_backoff;
        let mut attempt: u32 = 1;
        loop {
            match self
                .client
                .create_post(&draft.text, reply_to, draft.suppress_preview)
                .await
            {
                Ok(id) => {
                    tracing::info!(id = %id.0, attempt, "posted");
                    return id;
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "post failed; retrying"
                    );
                    sleep(delay).await;
                    delay = delay.saturating_mul(self.backoff_multiplier).min(self.max_backoff);
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{PostId, PublishClient, PublishError};

    /// One recorded `create_post` call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedPost {
        pub text: String,
        pub reply_to: Option<PostId>,
        pub suppress_preview: bool,
    }

    /// Mock implementation of [`PublishClient`] for unit tests.
    ///
    /// Returns sequential ids (`post-1`, `post-2`, ...) and can be told to
    /// fail a number of calls first.
    #[derive(Default)]
    pub struct MockPublishClient {
        calls: Mutex<Vec<RecordedPost>>,
        fail_remaining: Mutex<u32>,
        next_id: AtomicU64,
    }

    impl MockPublishClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `count` calls fail with a 503 before succeeding.
        pub fn fail_next(&self, count: u32) {
            *self.fail_remaining.lock().unwrap() = count;
        }

        /// Every call made so far, successful or not.
        pub fn calls(&self) -> Vec<RecordedPost> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PublishClient for MockPublishClient {
        async fn create_post(
            &self,
            text: &str,
            reply_to: Option<&PostId>,
            suppress_preview: bool,
        ) -> Result<PostId, PublishError> {
            self.calls.lock().unwrap().push(RecordedPost {
                text: text.to_string(),
                reply_to: reply_to.cloned(),
                suppress_preview,
            });

            let mut remaining = self.fail_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PublishError::Endpoint {
                    status: 503,
                    message: "simulated outage".to_string(),
                });
            }

            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(PostId(format!("post-{n}")))
        }
    }
}
