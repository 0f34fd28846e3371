//! HTTP client for the vote source API.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::types::{BillDetails, Envelope, MemberRecord, VoteRecord, VotesPayload};

/// Errors that can occur when calling the vote source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed before a response arrived
    #[error("vote source request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Source answered with a non-success status; the whole fetch aborts
    #[error("vote source unavailable: status {status}")]
    Unavailable { status: u16 },
}

/// Trait for vote source operations.
///
/// Use [`HttpVoteSource`] for real HTTP calls, or [`mock::MockVoteSource`]
/// in tests.
#[async_trait]
pub trait VoteSource: Send + Sync {
    /// Fetch all votes recorded between `start` and `end` inclusive.
    ///
    /// # Errors
    /// Fails as a whole if any underlying request fails; no partial results.
    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<VoteRecord>, SourceError>;

    /// Fetch the most recently recorded votes.
    ///
    /// # Errors
    /// Fails if the request fails or the source answers non-success.
    async fn fetch_recent(&self) -> Result<Vec<VoteRecord>, SourceError>;

    /// Resolve a legislator's social handle; `None` when they have none.
    ///
    /// # Errors
    /// Fails if the request fails or the source answers non-success.
    async fn member_handle(&self, id: &str) -> Result<Option<String>, SourceError>;

    /// Follow a bill's `api_uri` for its detail record.
    ///
    /// # Errors
    /// Fails if the request fails or the source answers non-success.
    async fn bill_details(&self, api_uri: &str) -> Result<Option<BillDetails>, SourceError>;
}

/// HTTP-based implementation of [`VoteSource`].
pub struct HttpVoteSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_window_days: i64,
}

impl HttpVoteSource {
    /// Create a new client. `max_window_days` caps the span of a single
    /// range request; longer ranges are split transparently.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_window_days: i64,
    ) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key, max_window_days)
    }

    /// Create a client with a custom `reqwest::Client` (for testing with
    /// custom config).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_window_days: i64,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            max_window_days: max_window_days.max(1),
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        tracing::debug!(url, "vote source GET");
        let response = self
            .client
            .get(url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                status: status.as_u16(),
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.results)
    }
}

#[async_trait]
impl VoteSource for HttpVoteSource {
    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<VoteRecord>, SourceError> {
        // Widen by one day so votes recorded later today are included.
        let end = end + Duration::days(1);

        let mut votes = Vec::new();
        let mut cursor = start;
        while cursor <= end {
            let window_end = (cursor + Duration::days(self.max_window_days)).min(end);
            let url = format!(
                "{}/both/votes/{}/{}.json",
                self.base_url,
                cursor.format("%Y-%m-%d"),
                window_end.format("%Y-%m-%d")
            );
            let payload: VotesPayload = self.get(&url).await?;
            votes.extend(payload.votes);
            cursor = window_end + Duration::days(1);
        }
        Ok(votes)
    }

    async fn fetch_recent(&self) -> Result<Vec<VoteRecord>, SourceError> {
        let url = format!("{}/both/votes/recent.json", self.base_url);
        let payload: VotesPayload = self.get(&url).await?;
        Ok(payload.votes)
    }

    async fn member_handle(&self, id: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}/members/{id}.json", self.base_url);
        let members: Vec<MemberRecord> = self.get(&url).await?;
        Ok(members
            .into_iter()
            .next()
            .and_then(|m| m.twitter_account)
            .filter(|handle| !handle.is_empty()))
    }

    async fn bill_details(&self, api_uri: &str) -> Result<Option<BillDetails>, SourceError> {
        let details: Vec<BillDetails> = self.get(api_uri).await?;
        Ok(details.into_iter().next())
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

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::{BillDetails, SourceError, VoteRecord, VoteSource};

    /// Mock implementation of [`VoteSource`] for unit tests.
    ///
    /// Queue responses with the `push_*` methods and verify requests with
    /// the `*_calls` methods. An exhausted queue yields an empty result.
    #[derive(Default)]
    pub struct MockVoteSource {
        fetch_results: Mutex<VecDeque<Result<Vec<VoteRecord>, SourceError>>>,
        member_handles: Mutex<VecDeque<Result<Option<String>, SourceError>>>,
        bill_results: Mutex<VecDeque<Result<Option<BillDetails>, SourceError>>>,
        fetch_range_calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
        member_calls: Mutex<Vec<String>>,
        bill_calls: Mutex<Vec<String>>,
    }

    impl MockVoteSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a result for the next `fetch_range`/`fetch_recent` call.
        pub fn push_votes(&self, result: Result<Vec<VoteRecord>, SourceError>) {
            self.fetch_results.lock().unwrap().push_back(result);
        }

        /// Queue a result for the next `member_handle` call.
        pub fn push_member_handle(&self, result: Result<Option<String>, SourceError>) {
            self.member_handles.lock().unwrap().push_back(result);
        }

        /// Queue a result for the next `bill_details` call.
        pub fn push_bill_details(&self, result: Result<Option<BillDetails>, SourceError>) {
            self.bill_results.lock().unwrap().push_back(result);
        }

        /// Ranges passed to `fetch_range`.
        pub fn fetch_range_calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
            self.fetch_range_calls.lock().unwrap().clone()
        }

        /// Member IDs passed to `member_handle`.
        pub fn member_calls(&self) -> Vec<String> {
            self.member_calls.lock().unwrap().clone()
        }

        /// URIs passed to `bill_details`.
        pub fn bill_calls(&self) -> Vec<String> {
            self.bill_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VoteSource for MockVoteSource {
        async fn fetch_range(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<VoteRecord>, SourceError> {
            self.fetch_range_calls.lock().unwrap().push((start, end));
            self.fetch_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn fetch_recent(&self) -> Result<Vec<VoteRecord>, SourceError> {
            self.fetch_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn member_handle(&self, id: &str) -> Result<Option<String>, SourceError> {
            self.member_calls.lock().unwrap().push(id.to_string());
            self.member_handles
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(None))
        }

        async fn bill_details(&self, api_uri: &str) -> Result<Option<BillDetails>, SourceError> {
            self.bill_calls.lock().unwrap().push(api_uri.to_string());
            self.bill_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(None))
        }
    }
}
