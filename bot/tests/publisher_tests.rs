//! Publisher ordering, pacing, retry and dry-run behavior.

use rollcall_bot::compose::PostDraft;
use rollcall_bot::config::PublisherConfig;
use rollcall_bot::publish::{mock::MockPublishClient, PostId, Publisher};

fn posting_config() -> PublisherConfig {
    PublisherConfig {
        posting_enabled: true,
        rate_limit_delay_seconds: 5,
        initial_backoff_seconds: 2,
        backoff_multiplier: 2,
        max_backoff_seconds: 300,
        ..PublisherConfig::default()
    }
}

fn thread_of(texts: &[&str]) -> Vec<PostDraft> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| PostDraft {
            text: (*text).to_string(),
            reply_to_previous: i > 0,
            suppress_preview: false,
        })
        .collect()
}

/// Draft i replies to the id returned for draft i-1; the root to nothing.
#[tokio::test(start_paused = true)]
async fn drafts_chain_to_the_previous_post_id() {
    let client = MockPublishClient::new();
    let publisher = Publisher::new(&client, &posting_config());

    let ids = publisher.publish(&thread_of(&["root", "first reply", "second reply"])).await;

    assert_eq!(
        ids,
        vec![
            PostId("post-1".to_string()),
            PostId("post-2".to_string()),
            PostId("post-3".to_string())
        ]
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].reply_to, None);
    assert_eq!(calls[1].reply_to, Some(PostId("post-1".to_string())));
    assert_eq!(calls[2].reply_to, Some(PostId("post-2".to_string())));
}

#[tokio::test(start_paused = true)]
async fn suppress_preview_flag_reaches_the_client() {
    let client = MockPublishClient::new();
    let publisher = Publisher::new(&client, &posting_config());

    let thread = vec![
        PostDraft {
            text: "root".to_string(),
            reply_to_previous: false,
            suppress_preview: false,
        },
        PostDraft {
            text: "links".to_string(),
            reply_to_previous: true,
            suppress_preview: true,
        },
    ];

    publisher.publish(&thread).await;

    let calls = client.calls();
    assert!(!calls[0].suppress_preview);
    assert!(calls[1].suppress_preview);
}

/// A failing draft is retried in place, never skipped or reordered.
#[tokio::test(start_paused = true)]
async fn transient_failures_retry_the_same_draft() {
    let client = MockPublishClient::new();
    client.fail_next(3);
    let publisher = Publisher::new(&client, &posting_config());

    let ids = publisher.publish(&thread_of(&["root", "reply"])).await;

    assert_eq!(ids.len(), 2);

    let calls = client.calls();
    // Three failures plus the success for the root, then one for the reply.
    assert_eq!(calls.len(), 5);
    for call in &calls[..4] {
        assert_eq!(call.text, "root");
        assert_eq!(call.reply_to, None);
    }
    assert_eq!(calls[4].text, "reply");
    assert_eq!(calls[4].reply_to, Some(PostId("post-1".to_string())));
}

#[tokio::test]
async fn dry_run_submits_nothing() {
    let client = MockPublishClient::new();
    let config = PublisherConfig::default();
    assert!(!config.posting_enabled);
    let publisher = Publisher::new(&client, &config);

    let ids = publisher.publish(&thread_of(&["root", "reply"])).await;

    assert!(ids.is_empty());
    assert!(client.calls().is_empty());
}
