//! Data types for vote source API responses.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::cursor::TIMESTAMP_FORMAT;

/// Legislative chamber that held the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Chamber {
    #[serde(alias = "house")]
    House,
    #[serde(alias = "senate")]
    Senate,
}

impl Chamber {
    /// URL path segment used by the vote source and link builders.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Senate => "senate",
        }
    }

    /// One-letter chamber code used by the vote aggregator links.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::House => 'h',
            Self::Senate => 's',
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::House => write!(f, "House"),
            Self::Senate => write!(f, "Senate"),
        }
    }
}

/// Per-position counts, used both for the overall total and per-party splits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct VoteTotals {
    pub yes: u32,
    pub no: u32,
    #[serde(default)]
    pub present: u32,
    #[serde(default)]
    pub not_voting: u32,
}

impl VoteTotals {
    /// True when no member of the group cast or withheld a vote.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.yes == 0 && self.no == 0 && self.present == 0 && self.not_voting == 0
    }
}

/// Overall tally of a roll call.
///
/// Ordinary votes carry fixed yes/no/present/not-voting counters. Leadership
/// elections (e.g. the Speaker election) instead report an open-ended
/// candidate-to-count map, which deserializes into the `Election` variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VoteTally {
    Standard(VoteTotals),
    Election(BTreeMap<String, u32>),
}

/// Bill reference attached to a vote. The source emits an empty object when
/// no bill is involved, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BillRef {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub api_uri: Option<String>,
}

/// Amendment reference attached to a vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AmendmentRef {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub sponsor_id: Option<String>,
    #[serde(default)]
    pub sponsor_party: Option<String>,
    #[serde(default)]
    pub sponsor_state: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Nomination reference attached to a vote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NominationRef {
    #[serde(default)]
    pub number: Option<String>,
}

/// One recorded roll-call vote, taken verbatim from the source and never
/// mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteRecord {
    pub congress: u16,
    pub session: u8,
    pub chamber: Chamber,
    pub roll_call: u32,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub bill: Option<BillRef>,
    #[serde(default)]
    pub amendment: Option<AmendmentRef>,
    #[serde(default)]
    pub nomination: Option<NominationRef>,
    pub total: VoteTally,
    #[serde(default)]
    pub democratic: Option<VoteTotals>,
    #[serde(default)]
    pub republican: Option<VoteTotals>,
    #[serde(default)]
    pub independent: Option<VoteTotals>,
}

impl VoteRecord {
    /// Combined date+time of the roll call, `None` when the source fields
    /// do not parse.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(
            &format!("{} {}", self.date, self.time),
            TIMESTAMP_FORMAT,
        )
        .ok()
    }

    /// Identifying key for log lines: chamber, congress, session, roll call.
    #[must_use]
    pub fn key(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.chamber.path(),
            self.congress,
            self.session,
            self.roll_call
        )
    }

    /// The bill reference, but only when a bill is actually attached (the
    /// source sends an empty object otherwise).
    #[must_use]
    pub fn attached_bill(&self) -> Option<&BillRef> {
        self.bill
            .as_ref()
            .filter(|b| b.number.as_deref().is_some_and(|n| !n.is_empty()))
    }

    /// The amendment reference, when one with a number is attached.
    #[must_use]
    pub fn attached_amendment(&self) -> Option<&AmendmentRef> {
        self.amendment
            .as_ref()
            .filter(|a| a.number.as_deref().is_some_and(|n| !n.is_empty()))
    }

    /// The nomination number, when the vote concerns a nomination.
    #[must_use]
    pub fn nomination_number(&self) -> Option<&str> {
        self.nomination
            .as_ref()
            .and_then(|n| n.number.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// Detail payload fetched from a bill's `api_uri` when a vote carries a bill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BillDetails {
    #[serde(default)]
    pub congressdotgov_url: Option<String>,
    #[serde(default)]
    pub sponsor_title: Option<String>,
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub sponsor_id: Option<String>,
    #[serde(default)]
    pub govtrack_url: Option<String>,
}

/// Member payload from the member endpoint; only the social handle matters
/// to the bot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberRecord {
    #[serde(default)]
    pub twitter_account: Option<String>,
}

/// Every source payload sits under a JSON `results` field.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub results: T,
}

/// Payload of the votes endpoints.
#[derive(Debug, Deserialize)]
pub struct VotesPayload {
    pub votes: Vec<VoteRecord>,
}
