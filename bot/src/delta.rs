//! Selects which fetched votes still need publishing.

use chrono::NaiveDateTime;

use crate::votes::VoteRecord;

/// Keep only votes strictly newer than `cursor`, oldest first.
///
/// The source returns newest-first; this normalizes to ascending publication
/// order. The sort is stable, so votes sharing a timestamp keep their source
/// order. Votes whose date/time fields do not parse cannot be cursored and
/// are dropped here, each with a warning naming the vote.
#[must_use]
pub fn select_new(cursor: NaiveDateTime, votes: Vec<VoteRecord>) -> Vec<VoteRecord> {
    let mut fresh: Vec<(NaiveDateTime, VoteRecord)> = votes
        .into_iter()
        .filter_map(|vote| match vote.timestamp() {
            Some(ts) => Some((ts, vote)),
            None => {
                tracing::warn!(
                    vote = %vote.key(),
                    date = %vote.date,
                    time = %vote.time,
                    "vote timestamp does not parse; dropping from selection"
                );
                None
            }
        })
        .filter(|(ts, _)| *ts > cursor)
        .collect();
    fresh.sort_by_key(|(ts, _)| *ts);
    fresh.into_iter().map(|(_, vote)| vote).collect()
}
