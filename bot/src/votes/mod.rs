//! Vote source client module.
//!
//! Provides the HTTP adapter over the legislative-data API, split the way
//! the bot consumes it:
//!
//! - [`VoteSource`] - trait defining the source operations
//! - [`HttpVoteSource`] - real HTTP implementation using reqwest, including
//!   transparent splitting of long date ranges into bounded sub-windows
//! - [`mock::MockVoteSource`] - mock for unit tests (behind `test-utils`)
//!
//! Every payload arrives in a JSON envelope whose `results` field holds the
//! data; any non-success status aborts the whole fetch so a partially
//! fetched window can never masquerade as a complete one.

mod client;
mod types;

pub use client::{HttpVoteSource, SourceError, VoteSource};
pub use types::{
    AmendmentRef, BillDetails, BillRef, Chamber, Envelope, MemberRecord, NominationRef,
    VoteRecord, VoteTally, VoteTotals, VotesPayload,
};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;
