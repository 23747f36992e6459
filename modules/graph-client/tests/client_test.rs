//! GraphClient behaviour against canned Graph API responses.

use std::sync::Arc;

use graph_client::testing::{MockAlertSink, MockTransport};
use graph_client::{GraphClient, GraphClientConfig, GraphError};
use serde_json::json;

const BASE: &str = "https://graph.test";
const ACCOUNTS_URL: &str = "https://graph.test/v19.0/me/accounts";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config() -> GraphClientConfig {
    let mut config = GraphClientConfig::new("user-token".to_string());
    config.base_url = BASE.to_string();
    config.recipients = vec!["ops@example.com".to_string()];
    config
}

fn client(transport: &Arc<MockTransport>, alerts: &Arc<MockAlertSink>) -> GraphClient {
    GraphClient::new(config(), transport.clone(), alerts.clone())
}

fn node_url(id: &str) -> String {
    format!("{BASE}/v19.0/{id}")
}

fn next_url(n: usize) -> String {
    format!("{BASE}/cursor/videos/{n}")
}

/// Page `n` (1-based) of a video chain of `total` pages, one video per page.
fn video_page(n: usize, total: usize) -> serde_json::Value {
    let paging = if n < total {
        json!({"next": next_url(n + 1)})
    } else {
        json!({})
    };
    json!({"data": [{"id": format!("v{n}"), "views": n}], "paging": paging})
}

/// Transport serving one account (id "1") whose video listing has `total` pages.
fn video_chain(total: usize) -> MockTransport {
    let mut transport = MockTransport::new()
        .on(ACCOUNTS_URL, json!({"data": [{"id": "1", "name": "Page1"}]}))
        .on(&node_url("1"), json!({"id": "1", "videos": video_page(1, total)}));
    for n in 2..=total {
        transport = transport.on(&next_url(n), video_page(n, total));
    }
    transport
}

// ---------------------------------------------------------------------------
// Account directory
// ---------------------------------------------------------------------------

#[tokio::test]
async fn directory_listing_builds_accounts() {
    let transport = Arc::new(
        MockTransport::new().on(ACCOUNTS_URL, json!({"data": [{"id": "1", "name": "Page1"}]})),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    let accounts = client.fetch_accounts().await.unwrap();

    assert_eq!(accounts.len(), 1);
    let account = &accounts[0];
    assert_eq!(account.id.as_deref(), Some("1"));
    assert_eq!(account.name.as_deref(), Some("Page1"));
    assert!(account.posts.is_empty());
    assert!(account.ig_posts.is_empty());
    assert_eq!(account.ig_id, None);

    let fetched = transport.fetched();
    assert_eq!(
        fetched[0],
        "https://graph.test/v19.0/me/accounts?access_token=user-token&fields=access_token,name,id,instagram_business_account"
    );
}

#[tokio::test]
async fn repeated_directory_fetch_appends_until_reset() {
    let transport = Arc::new(
        MockTransport::new().on(ACCOUNTS_URL, json!({"data": [{"id": "1", "name": "Page1"}]})),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    client.fetch_accounts().await.unwrap();
    assert_eq!(client.accounts().len(), 2);

    client.reset();
    assert!(client.accounts().is_empty());
}

// ---------------------------------------------------------------------------
// Video posts and pagination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_page_video_listing() {
    let transport = Arc::new(
        MockTransport::new()
            .on(ACCOUNTS_URL, json!({"data": [{"id": "1", "name": "Page1"}]}))
            .on(
                &node_url("1"),
                json!({"videos": {"data": [{"id": "v1", "views": 10}], "paging": {}}}),
            ),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    let accounts = client.fetch_video_posts(5).await.unwrap();

    let posts = &accounts[0].posts;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post_id.as_deref(), Some("v1"));
    assert_eq!(posts[0].views, 10);
    assert_eq!(posts[0].comments_count, 0);
    assert_eq!(posts[0].shares, 0);
    // Directory + first video page, no cursor to follow.
    assert_eq!(transport.fetch_count(), 2);
}

#[tokio::test]
async fn walk_fetches_min_of_remaining_pages_and_budget() {
    for (total, budget) in [(4, 5), (4, 3), (4, 2), (7, 5), (1, 5)] {
        let transport = Arc::new(video_chain(total));
        let alerts = Arc::new(MockAlertSink::new());
        let mut client = client(&transport, &alerts);

        client.fetch_accounts().await.unwrap();
        client.fetch_video_posts(budget).await.unwrap();

        let expected_extra = (total - 1).min(budget as usize);
        assert_eq!(
            transport.fetch_count() - 2,
            expected_extra,
            "chain of {total} pages with budget {budget}"
        );
        assert_eq!(client.accounts()[0].posts.len(), 1 + expected_extra);
    }
}

#[tokio::test]
async fn zero_budget_stops_before_pending_cursor() {
    let transport = Arc::new(video_chain(3));
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    client.fetch_video_posts(0).await.unwrap();

    assert_eq!(transport.fetch_count(), 2);
    assert_eq!(client.accounts()[0].posts.len(), 1);
    assert!(transport.fetched().iter().all(|url| !url.contains("/cursor/")));
}

#[tokio::test]
async fn pages_are_appended_in_cursor_order() {
    let transport = Arc::new(video_chain(3));
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    client.fetch_video_posts(5).await.unwrap();

    let ids: Vec<_> = client.accounts()[0]
        .posts
        .iter()
        .map(|p| p.post_id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["v1", "v2", "v3"]);
}

#[tokio::test]
async fn missing_videos_subtree_skips_account() {
    let transport = Arc::new(
        MockTransport::new()
            .on(
                ACCOUNTS_URL,
                json!({"data": [{"id": "1", "name": "Quiet"}, {"id": "2", "name": "Busy"}]}),
            )
            .on(&node_url("1"), json!({"id": "1"}))
            .on(
                &node_url("2"),
                json!({"videos": {"data": [{"id": "v7"}], "paging": {}}}),
            ),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    client.fetch_video_posts(5).await.unwrap();

    assert!(client.accounts()[0].posts.is_empty());
    assert_eq!(client.accounts()[1].posts.len(), 1);
    assert!(alerts.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Remote errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn error_document_aborts_and_notifies_once() {
    let error_doc = json!({"error": {"message": "(#4) Application request limit reached", "code": 4}});
    let transport = Arc::new(
        MockTransport::new()
            .on(ACCOUNTS_URL, json!({"data": [{"id": "1", "name": "Page1"}]}))
            .on(&node_url("1"), error_doc.clone()),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    let err = client.fetch_video_posts(5).await.unwrap_err();

    match err {
        GraphError::RemoteApi { payload } => assert_eq!(payload, error_doc),
        other => panic!("expected RemoteApi, got {other:?}"),
    }
    assert!(client.accounts()[0].posts.is_empty());

    let calls = alerts.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, error_doc);
    assert_eq!(calls[0].1, vec!["ops@example.com".to_string()]);
}

#[tokio::test]
async fn error_mid_walk_keeps_earlier_results() {
    let transport = Arc::new(
        MockTransport::new()
            .on(
                ACCOUNTS_URL,
                json!({"data": [{"id": "1", "name": "First"}, {"id": "2", "name": "Second"}]}),
            )
            .on(
                &node_url("1"),
                json!({"videos": {"data": [{"id": "a1"}], "paging": {}}}),
            )
            .on(
                &node_url("2"),
                json!({"videos": {"data": [{"id": "b1"}], "paging": {"next": next_url(2)}}}),
            )
            .on(&next_url(2), json!({"error": {"message": "cursor expired"}})),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    let result = client.fetch_video_posts(5).await;

    assert!(matches!(result, Err(GraphError::RemoteApi { .. })));
    assert_eq!(client.accounts()[0].posts.len(), 1);
    // First page of the failing account stays; no rollback.
    assert_eq!(client.accounts()[1].posts.len(), 1);
    assert_eq!(alerts.calls().len(), 1);
}

#[tokio::test]
async fn failed_notification_does_not_mask_remote_error() {
    let transport = Arc::new(
        MockTransport::new().on(ACCOUNTS_URL, json!({"error": {"message": "bad token"}})),
    );
    let alerts = Arc::new(MockAlertSink::failing());
    let mut client = client(&transport, &alerts);

    let err = client.fetch_accounts().await.unwrap_err();

    assert!(matches!(err, GraphError::RemoteApi { .. }));
    assert_eq!(alerts.calls().len(), 1);
}

#[tokio::test]
async fn transport_failure_aborts_without_alert() {
    // Nothing is served for account 2, so its fetch fails at the network layer.
    let transport = Arc::new(
        MockTransport::new()
            .on(
                ACCOUNTS_URL,
                json!({"data": [{"id": "1", "name": "First"}, {"id": "2", "name": "Second"}]}),
            )
            .on(
                &node_url("1"),
                json!({"videos": {"data": [{"id": "a1"}], "paging": {}}}),
            ),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    let result = client.fetch_video_posts(5).await;

    assert!(matches!(result, Err(GraphError::Transport(_))));
    assert_eq!(client.accounts()[0].posts.len(), 1);
    assert!(client.accounts()[1].posts.is_empty());
    assert!(alerts.calls().is_empty());
}

#[tokio::test]
async fn malformed_response_is_fatal() {
    let transport = Arc::new(MockTransport::new().on_raw(ACCOUNTS_URL, "<html>502</html>"));
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    let err = client.fetch_accounts().await.unwrap_err();

    assert!(matches!(err, GraphError::MalformedDocument(_)));
    assert!(alerts.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Story posts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn story_posts_require_linked_instagram_account() {
    let media_page_2 = format!("{BASE}/cursor/media/2");
    let transport = Arc::new(
        MockTransport::new()
            .on(
                ACCOUNTS_URL,
                json!({"data": [
                    {"id": "1", "name": "Linked", "instagram_business_account": {"id": "ig-1"}},
                    {"id": "2", "name": "Unlinked"}
                ]}),
            )
            .on(
                &node_url("ig-1"),
                json!({"media": {
                    "data": [{
                        "id": "m1",
                        "media_type": "IMAGE",
                        "caption": "Opening day",
                        "insights": {"data": [{"name": "likes", "values": [{"value": 12}]}]}
                    }],
                    "paging": {"next": media_page_2}
                }}),
            )
            .on(
                &media_page_2,
                json!({"data": [{"id": "m2", "media_type": "VIDEO"}], "paging": {}}),
            ),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    let accounts = client.fetch_story_posts(5).await.unwrap();

    assert_eq!(accounts[0].ig_posts.len(), 2);
    assert_eq!(accounts[0].ig_posts[0].likes, 12);
    assert_eq!(accounts[0].ig_posts[1].id.as_deref(), Some("m2"));
    assert!(accounts[1].ig_posts.is_empty());
    assert!(transport
        .fetched()
        .iter()
        .all(|url| !url.starts_with("https://graph.test/v19.0/2?")));
}

#[tokio::test]
async fn missing_media_subtree_is_not_an_error() {
    let transport = Arc::new(
        MockTransport::new()
            .on(
                ACCOUNTS_URL,
                json!({"data": [{"id": "1", "instagram_business_account": {"id": "ig-1"}}]}),
            )
            .on(&node_url("ig-1"), json!({"id": "ig-1"})),
    );
    let alerts = Arc::new(MockAlertSink::new());
    let mut client = client(&transport, &alerts);

    client.fetch_accounts().await.unwrap();
    client.fetch_story_posts(5).await.unwrap();

    assert!(client.accounts()[0].ig_posts.is_empty());
}
