//! Turns one vote record into an ordered thread of post drafts.
//!
//! Composition is deterministic: the same record and the same resolver
//! answers always yield byte-identical drafts. All network lookups go
//! through the injected [`VoteSource`] and [`ClipResolver`], and every
//! lookup failure degrades to an omitted line or post; the only hard
//! failure is a record missing a field the root post cannot exist without.

pub mod links;

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::clips::ClipResolver;
use crate::votes::{AmendmentRef, BillDetails, BillRef, VoteRecord, VoteSource, VoteTally, VoteTotals};

/// Hard ceiling on the rendered length of any single post.
pub const POST_MAX_CHARS: usize = 255;

/// Descriptions get pre-trimmed to this before the whole-post fit pass.
const DESCRIPTION_MAX_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Boilerplate lead-ins dropped before hard truncation kicks in.
const SHORTENINGS: &[(&str, &str)] = &[
    ("Providing for consideration of the bill ", ""),
    ("Providing for consideration of ", ""),
    ("A bill to ", "To "),
    ("An act to ", "To "),
    ("To amend ", "Amend "),
];

/// One not-yet-submitted unit of outgoing content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    /// Submit as a reply to the previous draft's post id.
    pub reply_to_previous: bool,
    /// Ask the endpoint not to expand link previews.
    pub suppress_preview: bool,
}

/// Ordered drafts sharing one logical root.
pub type Thread = Vec<PostDraft>;

/// Errors that make a vote impossible to publish.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The record lacks a field the root post cannot be built without
    #[error("vote {key} is missing required field `{field}`")]
    MissingField { key: String, field: &'static str },
}

fn missing(vote: &VoteRecord, field: &'static str) -> ComposeError {
    ComposeError::MissingField {
        key: vote.key(),
        field,
    }
}

/// Maps a [`VoteRecord`] to its [`Thread`].
pub struct Composer<'a> {
    source: &'a dyn VoteSource,
    clips: &'a dyn ClipResolver,
}

impl<'a> Composer<'a> {
    pub fn new(source: &'a dyn VoteSource, clips: &'a dyn ClipResolver) -> Self {
        Self { source, clips }
    }

    /// Build the ordered thread for one vote.
    ///
    /// # Errors
    /// Returns [`ComposeError::MissingField`] when the record lacks a
    /// timestamp, question, result, or any usable description.
    pub async fn compose(&self, vote: &VoteRecord) -> Result<Thread, ComposeError> {
        let timestamp = vote.timestamp().ok_or_else(|| missing(vote, "date/time"))?;

        let mut thread = vec![root_post(vote)?];

        // Leadership elections already carried their tally in the root.
        if matches!(vote.total, VoteTally::Standard(_)) {
            thread.push(breakdown_post(vote));
        }

        thread.push(self.links_post(vote, timestamp.date()).await);

        if let Some(number) = vote.nomination_number() {
            thread.push(nomination_post(vote.congress, number));
        }

        if let Some(amendment) = vote.attached_amendment() {
            thread.push(self.amendment_post(vote, amendment).await);
        }

        if let Some(bill) = vote.attached_bill() {
            if let Some(details) = self.fetch_bill_details(vote, bill).await {
                if let Some(post) = self.bill_post(vote, &details).await {
                    thread.push(post);
                }
                thread.push(bill_links_post(vote.congress, bill, &details));
            }
        }

        Ok(thread)
    }

    async fn links_post(&self, vote: &VoteRecord, date: NaiveDate) -> PostDraft {
        let mut text = String::from("Vote Links");
        if let Some(clip) = self
            .clips
            .resolve(vote.chamber, vote.congress, vote.roll_call, date)
            .await
        {
            text.push_str(&format!("\nC-SPAN Clip: {clip}"));
        }
        text.push_str(&format!(
            "\nProPublica: {}",
            links::propublica_vote(vote.congress, vote.chamber, vote.session, vote.roll_call)
        ));
        text.push_str(&format!(
            "\nGovTrack: {}",
            links::govtrack_vote(vote.congress, date.year(), vote.chamber, vote.roll_call)
        ));
        draft(text, true, true)
    }

    async fn amendment_post(&self, vote: &VoteRecord, amendment: &AmendmentRef) -> PostDraft {
        let number = amendment.number.as_deref().unwrap_or_default();
        let mut text = format!("Amendment {number}");

        let sponsor = match self.resolve_handle(vote, amendment.sponsor_id.as_deref()).await {
            Some(handle) => Some(format!("Sponsor: @{handle}")),
            None => amendment
                .sponsor
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(|name| {
                    let mut parts = vec![name.to_string()];
                    for extra in [&amendment.sponsor_party, &amendment.sponsor_state] {
                        if let Some(value) = extra.as_deref().filter(|v| !v.is_empty()) {
                            parts.push(value.to_string());
                        }
                    }
                    format!("Sponsor: {}", parts.join(", "))
                }),
        };
        if let Some(line) = sponsor {
            text.push('\n');
            text.push_str(&line);
        }

        let description = amendment
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&vote.description);
        if !description.is_empty() {
            text.push('\n');
            text.push_str(description);
        }

        draft(text, true, false)
    }

    async fn bill_post(&self, vote: &VoteRecord, details: &BillDetails) -> Option<PostDraft> {
        let mut text = String::new();

        match self.resolve_handle(vote, details.sponsor_id.as_deref()).await {
            // Leading dot keeps the mention visible to all followers.
            Some(handle) => text.push_str(&format!("Sponsor: .@{handle}\n")),
            None => {
                if let Some(name) = details.sponsor.as_deref().filter(|s| !s.is_empty()) {
                    let title = details.sponsor_title.as_deref().unwrap_or_default();
                    if title.is_empty() {
                        text.push_str(&format!("Sponsor: {name}\n"));
                    } else {
                        text.push_str(&format!("Sponsor: {title} {name}\n"));
                    }
                }
            }
        }

        if let Some(url) = details.congressdotgov_url.as_deref().filter(|u| !u.is_empty()) {
            text.push_str(&format!("Bill Details: {url}"));
        }

        let text = text.trim_end().to_string();
        if text.is_empty() {
            None
        } else {
            Some(draft(text, true, false))
        }
    }

    async fn fetch_bill_details(&self, vote: &VoteRecord, bill: &BillRef) -> Option<BillDetails> {
        let uri = bill.api_uri.as_deref().filter(|u| !u.is_empty())?;
        match self.source.bill_details(uri).await {
            Ok(Some(details)) => Some(details),
            Ok(None) => {
                tracing::warn!(vote = %vote.key(), "bill detail lookup returned no record");
                None
            }
            Err(err) => {
                tracing::warn!(
                    vote = %vote.key(),
                    error = %err,
                    "bill detail lookup failed; dropping bill posts"
                );
                None
            }
        }
    }

    async fn resolve_handle(&self, vote: &VoteRecord, member_id: Option<&str>) -> Option<String> {
        let id = member_id?.trim();
        if id.is_empty() {
            return None;
        }
        match self.source.member_handle(id).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(
                    vote = %vote.key(),
                    member = id,
                    error = %err,
                    "sponsor handle lookup failed; falling back to name"
                );
                None
            }
        }
    }
}

fn root_post(vote: &VoteRecord) -> Result<PostDraft, ComposeError> {
    if vote.question.is_empty() {
        return Err(missing(vote, "question"));
    }
    if vote.result.is_empty() {
        return Err(missing(vote, "result"));
    }

    let header = format!("{} Vote {}", vote.chamber, vote.roll_call);
    let description = root_description(vote).ok_or_else(|| missing(vote, "description"))?;
    let description = truncate_with_ellipsis(&description, DESCRIPTION_MAX_CHARS);

    let question = vote
        .attached_amendment()
        .and_then(|a| a.number.as_deref())
        .map_or_else(
            || vote.question.clone(),
            |number| format!("{} (Amendment {number})", vote.question),
        );

    let tally = match &vote.total {
        VoteTally::Standard(totals) => standard_tally_line(&vote.result, totals),
        VoteTally::Election(counts) => election_tally_lines(&vote.result, counts),
    };

    let assemble =
        |description: &str| format!("{header}\n{description}\n\n{question}\n{tally}");

    let mut text = assemble(&description);
    if text.chars().count() > POST_MAX_CHARS {
        // Only the description shrinks; header, question and result stay whole.
        let fixed = text.chars().count() - description.chars().count();
        let trimmed =
            truncate_with_ellipsis(&description, POST_MAX_CHARS.saturating_sub(fixed));
        text = assemble(&trimmed);
    }

    Ok(draft(text, false, false))
}

/// What the root post says the vote was about: the bill headline when a
/// bill is attached, else the vote's own description, else the attached
/// amendment's description.
fn root_description(vote: &VoteRecord) -> Option<String> {
    if let Some(bill) = vote.attached_bill() {
        let number = bill.number.as_deref().unwrap_or_default();
        let headline = match bill.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("Bill {number}: {title}"),
            None => format!("Bill {number}"),
        };
        return Some(headline);
    }
    if !vote.description.is_empty() {
        return Some(vote.description.clone());
    }
    vote.attached_amendment()
        .and_then(|a| a.description.as_deref())
        .filter(|d| !d.is_empty())
        .map(ToString::to_string)
}

fn standard_tally_line(result: &str, totals: &VoteTotals) -> String {
    let mut line = format!("{result}: Y-{}, N-{}", totals.yes, totals.no);
    if totals.present > 0 {
        line.push_str(&format!(", P-{}", totals.present));
    }
    if totals.not_voting > 0 {
        line.push_str(&format!(", NV-{}", totals.not_voting));
    }
    line
}

fn election_tally_lines(result: &str, counts: &BTreeMap<String, u32>) -> String {
    let mut lines = format!("{result}:");
    for (candidate, count) in counts {
        lines.push_str(&format!("\n{candidate}: {count}"));
    }
    lines
}

fn breakdown_post(vote: &VoteRecord) -> PostDraft {
    let mut text = format!(
        "Vote Breakdown:\n{}\n{}",
        party_line("Dem", vote.democratic.unwrap_or_default()),
        party_line("Rep", vote.republican.unwrap_or_default()),
    );
    if let Some(independent) = vote.independent {
        if !independent.is_empty() {
            text.push('\n');
            text.push_str(&party_line("Ind", independent));
        }
    }
    text.push_str(&format!("\n\nDetails:\n{}", vote.url));
    draft(text, true, false)
}

fn party_line(label: &str, totals: VoteTotals) -> String {
    format!(
        "{label}: Y-{}, N-{}, P-{}, NV-{}",
        totals.yes, totals.no, totals.present, totals.not_voting
    )
}

fn nomination_post(congress: u16, number: &str) -> PostDraft {
    let text = format!(
        "Nomination {number}\n{}",
        links::congress_nomination(congress, number)
    );
    draft(text, true, false)
}

fn bill_links_post(congress: u16, bill: &BillRef, details: &BillDetails) -> PostDraft {
    let number = bill.number.as_deref().unwrap_or_default();
    let mut text = format!(
        "Bill Links\nC-SPAN: {}\nProPublica: {}",
        links::cspan_bill(congress, number),
        links::propublica_bill(congress, number)
    );
    if let Some(url) = details.govtrack_url.as_deref().filter(|u| !u.is_empty()) {
        text.push_str(&format!("\nGovTrack: {url}"));
    }
    draft(text, true, true)
}

fn draft(text: String, reply_to_previous: bool, suppress_preview: bool) -> PostDraft {
    PostDraft {
        text: fit_to_limit(&text),
        reply_to_previous,
        suppress_preview,
    }
}

/// Final length guard: shorten boilerplate first, hard-truncate last.
fn fit_to_limit(text: &str) -> String {
    if text.chars().count() <= POST_MAX_CHARS {
        return text.to_string();
    }
    let mut shortened = text.to_string();
    for (long, short) in SHORTENINGS {
        shortened = shortened.replace(long, short);
        if shortened.chars().count() <= POST_MAX_CHARS {
            return shortened;
        }
    }
    truncate_with_ellipsis(&shortened, POST_MAX_CHARS)
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text_unchanged() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let text = "ääääää";
        let out = truncate_with_ellipsis(text, 5);
        assert_eq!(out, "ää...");
        assert_eq!(out.chars().count(), 5);
    }

    #[test]
    fn fit_applies_shortenings_before_truncating() {
        let filler = "x".repeat(POST_MAX_CHARS - 5);
        let text = format!("A bill to {filler}");
        let fitted = fit_to_limit(&text);
        assert!(fitted.starts_with("To x"));
        assert!(fitted.chars().count() <= POST_MAX_CHARS);
        assert!(!fitted.ends_with(ELLIPSIS));
    }

    #[test]
    fn fit_hard_truncates_as_a_last_resort() {
        let text = "y".repeat(POST_MAX_CHARS + 40);
        let fitted = fit_to_limit(&text);
        assert_eq!(fitted.chars().count(), POST_MAX_CHARS);
        assert!(fitted.ends_with(ELLIPSIS));
    }

    #[test]
    fn tally_line_omits_zero_present_and_not_voting() {
        let totals = VoteTotals {
            yes: 220,
            no: 210,
            present: 0,
            not_voting: 3,
        };
        assert_eq!(
            standard_tally_line("Passed", &totals),
            "Passed: Y-220, N-210, NV-3"
        );
    }

    #[test]
    fn tally_line_includes_present_when_nonzero() {
        let totals = VoteTotals {
            yes: 51,
            no: 48,
            present: 1,
            not_voting: 0,
        };
        assert_eq!(
            standard_tally_line("Confirmed", &totals),
            "Confirmed: Y-51, N-48, P-1"
        );
    }

    #[test]
    fn election_lines_render_candidates_in_map_order() {
        let mut counts = BTreeMap::new();
        counts.insert("McCarthy".to_string(), 216);
        counts.insert("Jeffries".to_string(), 212);
        assert_eq!(
            election_tally_lines("Elected", &counts),
            "Elected:\nJeffries: 212\nMcCarthy: 216"
        );
    }

    #[test]
    fn party_line_always_shows_all_four_counters() {
        let totals = VoteTotals {
            yes: 210,
            no: 2,
            present: 0,
            not_voting: 8,
        };
        assert_eq!(party_line("Dem", totals), "Dem: Y-210, N-2, P-0, NV-8");
    }
}
