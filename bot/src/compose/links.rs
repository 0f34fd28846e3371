//! Deterministic reference-link builders.
//!
//! These never touch the network; anything that needs a lookup (clips,
//! handles, bill details) lives behind a resolver trait instead.

use crate::votes::Chamber;

/// Permalink to the source's own record of the vote.
#[must_use]
pub fn propublica_vote(congress: u16, chamber: Chamber, session: u8, roll_call: u32) -> String {
    format!(
        "https://projects.propublica.org/represent/votes/{congress}/{}/{session}/{roll_call}",
        chamber.path()
    )
}

/// Third-party aggregator link for the vote.
#[must_use]
pub fn govtrack_vote(congress: u16, year: i32, chamber: Chamber, roll_call: u32) -> String {
    format!(
        "https://www.govtrack.us/congress/votes/{congress}-{year}/{}{roll_call}",
        chamber.code()
    )
}

/// C-SPAN's bill page; bill numbers are lowercased with dots stripped.
#[must_use]
pub fn cspan_bill(congress: u16, bill_number: &str) -> String {
    format!(
        "https://www.c-span.org/congress/bills/bill/?{congress}/{}",
        slug(bill_number)
    )
}

/// Source aggregator's bill page.
#[must_use]
pub fn propublica_bill(congress: u16, bill_number: &str) -> String {
    format!(
        "https://projects.propublica.org/represent/bills/{congress}/{}",
        slug(bill_number)
    )
}

/// congress.gov page for a nomination; numbers arrive as `PN123`.
#[must_use]
pub fn congress_nomination(congress: u16, nomination_number: &str) -> String {
    let number = nomination_number
        .trim_start_matches("PN")
        .trim_start_matches("pn");
    format!("https://www.congress.gov/nomination/{congress}th-congress/{number}")
}

fn slug(bill_number: &str) -> String {
    bill_number.replace('.', "").to_lowercase()
}
