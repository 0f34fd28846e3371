//! The poll loop: fetch, select, compose, publish, advance.
//!
//! Execution is strictly sequential. One vote's thread is fully drained
//! before the next vote is touched, and the cursor is written once per vote
//! immediately after that vote's thread completes. A crash mid-batch
//! therefore resumes at the first unpublished vote; a crash mid-thread
//! reissues that one vote's whole thread (accepted duplicate risk, see the
//! cursor module).

use std::time::Duration;

use chrono::Local;

use crate::clips::ClipResolver;
use crate::compose::Composer;
use crate::config::Config;
use crate::cursor::{CursorError, CursorStore};
use crate::delta;
use crate::publish::{PublishClient, Publisher};
use crate::votes::VoteSource;

/// Wires the pipeline together and drives it on a fixed interval.
pub struct Runner<'a> {
    config: &'a Config,
    source: &'a dyn VoteSource,
    clips: &'a dyn ClipResolver,
    publisher: Publisher<'a>,
    cursor: CursorStore,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn VoteSource,
        clips: &'a dyn ClipResolver,
        publish_client: &'a dyn PublishClient,
        cursor: CursorStore,
    ) -> Self {
        Self {
            config,
            source,
            clips,
            publisher: Publisher::new(publish_client, &config.publisher),
            cursor,
        }
    }

    /// Run one poll cycle; returns how many votes were fully published.
    ///
    /// A source outage skips the cycle without touching the cursor. A vote
    /// the composer cannot handle stops the cycle before it, again without
    /// advancing the cursor, so the gap stays visible until resolved.
    ///
    /// # Errors
    /// Only cursor-store I/O failures surface; they make the at-most-once
    /// guarantee unverifiable, so the loop must stop.
    pub async fn run_cycle(&self) -> Result<usize, CursorError> {
        let cursor = self.cursor.load()?;
        tracing::debug!(cursor = %cursor, "cycle start");

        let today = Local::now().date_naive();
        let votes = match self.source.fetch_range(cursor.date(), today).await {
            Ok(votes) => votes,
            Err(err) => {
                tracing::warn!(error = %err, "vote source unavailable; skipping cycle");
                return Ok(0);
            }
        };

        let fresh = delta::select_new(cursor, votes);
        if fresh.is_empty() {
            tracing::debug!("no new votes since cursor");
            return Ok(0);
        }
        tracing::info!(count = fresh.len(), "new votes since last publication");

        let composer = Composer::new(self.source, self.clips);
        let mut published = 0;
        for vote in &fresh {
            let thread = match composer.compose(vote).await {
                Ok(thread) => thread,
                Err(err) => {
                    tracing::error!(
                        vote = %vote.key(),
                        chamber = %vote.chamber,
                        congress = vote.congress,
                        roll_call = vote.roll_call,
                        error = %err,
                        "cannot compose vote; stopping cycle before it"
                    );
                    return Ok(published);
                }
            };

            tracing::info!(vote = %vote.key(), posts = thread.len(), "publishing thread");
            let ids = self.publisher.publish(&thread).await;
            if ids.is_empty() {
                // Dry run produced no ids, so there is nothing to advance past.
                continue;
            }

            if let Some(timestamp) = vote.timestamp() {
                self.cursor.save(timestamp + chrono::Duration::seconds(1))?;
            }
            published += 1;
        }

        Ok(published)
    }

    /// Poll forever on the configured interval.
    ///
    /// # Errors
    /// Propagates cursor-store failures from [`Self::run_cycle`]; all other
    /// errors are handled inside the cycle.
    pub async fn run(&self) -> Result<(), CursorError> {
        let interval = Duration::from_secs(self.config.poll.interval_seconds);
        loop {
            match self.run_cycle().await {
                Ok(0) => tracing::debug!("cycle complete; nothing published"),
                Ok(count) => tracing::info!(count, "cycle complete"),
                Err(err) => return Err(err),
            }
            tokio::time::sleep(interval).await;
        }
    }
}
