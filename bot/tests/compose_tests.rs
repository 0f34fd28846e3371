//! Thread composition tests against mocked resolvers.

use async_trait::async_trait;
use chrono::NaiveDate;
use rollcall_bot::clips::{ClipResolver, NoClips};
use rollcall_bot::compose::{ComposeError, Composer, POST_MAX_CHARS};
use rollcall_bot::votes::{mock::MockVoteSource, BillDetails, Chamber, SourceError, VoteRecord};
use serde_json::json;

/// Clip resolver that always finds the same clip.
struct FixedClip(&'static str);

#[async_trait]
impl ClipResolver for FixedClip {
    async fn resolve(
        &self,
        _chamber: Chamber,
        _congress: u16,
        _roll_call: u32,
        _date: NaiveDate,
    ) -> Option<String> {
        Some(self.0.to_string())
    }
}

fn vote(value: serde_json::Value) -> VoteRecord {
    serde_json::from_value(value).expect("valid vote json")
}

fn standard_vote() -> serde_json::Value {
    json!({
        "congress": 118,
        "session": 2,
        "chamber": "House",
        "roll_call": 399,
        "date": "2024-03-05",
        "time": "14:22:31",
        "question": "On Passage",
        "description": "Honoring our veterans",
        "result": "Passed",
        "url": "https://example.org/rollcall/399",
        "total": {"yes": 220, "no": 210, "present": 0, "not_voting": 3},
        "democratic": {"yes": 210, "no": 2, "present": 0, "not_voting": 8},
        "republican": {"yes": 10, "no": 208, "present": 0, "not_voting": 5},
        "independent": {"yes": 0, "no": 0, "present": 0, "not_voting": 0}
    })
}

#[tokio::test]
async fn standard_vote_yields_root_breakdown_links() {
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let thread = composer
        .compose(&vote(standard_vote()))
        .await
        .expect("should compose");

    assert_eq!(thread.len(), 3);

    assert_eq!(
        thread[0].text,
        "House Vote 399\nHonoring our veterans\n\nOn Passage\nPassed: Y-220, N-210, NV-3"
    );
    assert!(!thread[0].reply_to_previous);
    assert!(!thread[0].suppress_preview);

    // Zero-across-the-board independents are omitted from the breakdown.
    assert_eq!(
        thread[1].text,
        "Vote Breakdown:\nDem: Y-210, N-2, P-0, NV-8\nRep: Y-10, N-208, P-0, NV-5\n\nDetails:\nhttps://example.org/rollcall/399"
    );
    assert!(thread[1].reply_to_previous);

    assert_eq!(
        thread[2].text,
        "Vote Links\nProPublica: https://projects.propublica.org/represent/votes/118/house/2/399\nGovTrack: https://www.govtrack.us/congress/votes/118-2024/h399"
    );
    assert!(thread[2].reply_to_previous);
    assert!(thread[2].suppress_preview);
}

#[tokio::test]
async fn nonzero_independent_tally_gets_a_line() {
    let mut value = standard_vote();
    value["independent"] = json!({"yes": 2, "no": 1, "present": 0, "not_voting": 0});
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    assert!(thread[1].text.contains("\nInd: Y-2, N-1, P-0, NV-0"));
}

#[tokio::test]
async fn resolved_clip_leads_the_links_post() {
    let source = MockVoteSource::new();
    let clips = FixedClip("www.c-span.org/video/?c510&vod");
    let composer = Composer::new(&source, &clips);

    let thread = composer
        .compose(&vote(standard_vote()))
        .await
        .expect("should compose");

    assert!(thread[2]
        .text
        .starts_with("Vote Links\nC-SPAN Clip: www.c-span.org/video/?c510&vod\nProPublica:"));
}

#[tokio::test]
async fn election_vote_skips_the_breakdown() {
    let mut value = standard_vote();
    value["question"] = json!("Election of the Speaker");
    value["result"] = json!("Elected");
    value["total"] = json!({"Jeffries": 212, "McCarthy": 216});
    value["democratic"] = json!(null);
    value["republican"] = json!(null);
    value["independent"] = json!(null);

    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    // Candidate tally lives in the root; the links post moves up to second.
    assert_eq!(thread.len(), 2);
    assert!(thread[0].text.ends_with("Elected:\nJeffries: 212\nMcCarthy: 216"));
    assert!(thread[1].text.starts_with("Vote Links"));
}

#[tokio::test]
async fn amendment_sponsor_prefers_the_resolved_handle() {
    let mut value = standard_vote();
    value["amendment"] = json!({
        "number": "S.Amdt.2137",
        "sponsor": "Rand Paul",
        "sponsor_id": "P000603",
        "sponsor_party": "R",
        "sponsor_state": "KY",
        "description": "To require reporting"
    });
    let source = MockVoteSource::new();
    source.push_member_handle(Ok(Some("RandPaul".to_string())));
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    let amendment = &thread[3];
    assert_eq!(
        amendment.text,
        "Amendment S.Amdt.2137\nSponsor: @RandPaul\nTo require reporting"
    );
    assert_eq!(source.member_calls(), vec!["P000603".to_string()]);
}

#[tokio::test]
async fn amendment_sponsor_falls_back_to_name_party_state() {
    let mut value = standard_vote();
    value["amendment"] = json!({
        "number": "S.Amdt.2137",
        "sponsor": "Rand Paul",
        "sponsor_id": "P000603",
        "sponsor_party": "R",
        "sponsor_state": "KY"
    });
    let source = MockVoteSource::new();
    source.push_member_handle(Err(SourceError::Unavailable { status: 500 }));
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    assert!(thread[3].text.contains("Sponsor: Rand Paul, R, KY"));
    // No amendment description of its own, so the vote's stands in.
    assert!(thread[3].text.ends_with("Honoring our veterans"));
}

#[tokio::test]
async fn amendment_description_stands_in_for_an_empty_vote_description() {
    let mut value = standard_vote();
    value["chamber"] = json!("Senate");
    value["roll_call"] = json!(91);
    value["description"] = json!("");
    value["amendment"] = json!({
        "number": "S.Amdt.2137",
        "description": "To require reporting on misuse of funds"
    });
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    assert!(thread[0]
        .text
        .starts_with("Senate Vote 91\nTo require reporting on misuse of funds"));
}

#[tokio::test]
async fn nomination_vote_gets_a_nomination_post() {
    let mut value = standard_vote();
    value["nomination"] = json!({"number": "PN164"});
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    assert_eq!(thread.len(), 4);
    assert_eq!(
        thread[3].text,
        "Nomination PN164\nhttps://www.congress.gov/nomination/118th-congress/164"
    );
}

fn bill_vote() -> serde_json::Value {
    let mut value = standard_vote();
    value["bill"] = json!({
        "number": "H.R.82",
        "title": "Social Security Fairness Act",
        "api_uri": "https://api.example.org/118/bills/hr82.json"
    });
    value
}

#[tokio::test]
async fn bill_vote_adds_detail_and_links_posts() {
    let source = MockVoteSource::new();
    source.push_bill_details(Ok(Some(BillDetails {
        congressdotgov_url: Some(
            "https://www.congress.gov/bill/118th-congress/house-bill/82".to_string(),
        ),
        sponsor_title: Some("Rep.".to_string()),
        sponsor: Some("Garret Graves".to_string()),
        sponsor_id: Some("G000577".to_string()),
        govtrack_url: Some("https://www.govtrack.us/congress/bills/118/hr82".to_string()),
    })));
    source.push_member_handle(Ok(Some("RepGarretGraves".to_string())));
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(bill_vote())).await.expect("should compose");

    assert_eq!(thread.len(), 5);

    assert!(thread[0]
        .text
        .starts_with("House Vote 399\nBill H.R.82: Social Security Fairness Act"));

    assert_eq!(
        thread[3].text,
        "Sponsor: .@RepGarretGraves\nBill Details: https://www.congress.gov/bill/118th-congress/house-bill/82"
    );

    assert_eq!(
        thread[4].text,
        "Bill Links\nC-SPAN: https://www.c-span.org/congress/bills/bill/?118/hr82\nProPublica: https://projects.propublica.org/represent/bills/118/hr82\nGovTrack: https://www.govtrack.us/congress/bills/118/hr82"
    );
    assert!(thread[4].suppress_preview);

    assert_eq!(
        source.bill_calls(),
        vec!["https://api.example.org/118/bills/hr82.json".to_string()]
    );
}

#[tokio::test]
async fn failed_bill_detail_fetch_drops_the_bill_posts() {
    let source = MockVoteSource::new();
    source.push_bill_details(Err(SourceError::Unavailable { status: 500 }));
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(bill_vote())).await.expect("should compose");

    // Root, breakdown, links; the bill posts degrade away.
    assert_eq!(thread.len(), 3);
}

#[tokio::test]
async fn composition_is_deterministic() {
    let source = MockVoteSource::new();
    source.push_bill_details(Ok(Some(BillDetails {
        congressdotgov_url: Some("https://www.congress.gov/bill/x".to_string()),
        sponsor_id: Some("G000577".to_string()),
        ..BillDetails::default()
    })));
    source.push_member_handle(Ok(Some("RepX".to_string())));
    source.push_bill_details(Ok(Some(BillDetails {
        congressdotgov_url: Some("https://www.congress.gov/bill/x".to_string()),
        sponsor_id: Some("G000577".to_string()),
        ..BillDetails::default()
    })));
    source.push_member_handle(Ok(Some("RepX".to_string())));

    let composer = Composer::new(&source, &NoClips);
    let record = vote(bill_vote());

    let first = composer.compose(&record).await.expect("should compose");
    let second = composer.compose(&record).await.expect("should compose");

    assert_eq!(first, second);
}

#[tokio::test]
async fn long_description_is_truncated_not_fatal() {
    let mut value = standard_vote();
    value["description"] = json!("x".repeat(400));
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let thread = composer.compose(&vote(value)).await.expect("should compose");

    for draft in &thread {
        assert!(draft.text.chars().count() <= POST_MAX_CHARS);
    }
    // Header, question and result survive the squeeze intact.
    assert!(thread[0].text.starts_with("House Vote 399\n"));
    assert!(thread[0].text.ends_with("Passed: Y-220, N-210, NV-3"));
    assert!(thread[0].text.contains("..."));
}

#[tokio::test]
async fn missing_question_is_a_composition_error() {
    let mut value = standard_vote();
    value["question"] = json!("");
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let result = composer.compose(&vote(value)).await;

    assert!(matches!(
        result,
        Err(ComposeError::MissingField { field: "question", .. })
    ));
}

#[tokio::test]
async fn missing_description_everywhere_is_a_composition_error() {
    let mut value = standard_vote();
    value["description"] = json!("");
    let source = MockVoteSource::new();
    let composer = Composer::new(&source, &NoClips);

    let result = composer.compose(&vote(value)).await;

    assert!(matches!(
        result,
        Err(ComposeError::MissingField { field: "description", .. })
    ));
}
