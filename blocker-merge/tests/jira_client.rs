//! JIRA client behavior against a mock HTTP server.

mod common;

use blocker_merge::{
    find_issue_key, CommentOutcome, IssueKey, IssueTracker, JiraClient, LookupOutcome, RetryPolicy,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::time::Duration;

fn client(server: &Server) -> JiraClient {
    common::install_crypto_provider();
    JiraClient::new(
        &server.url(),
        "jira-secret",
        RetryPolicy::new(3, Duration::ZERO),
    )
    .unwrap()
}

fn key(text: &str) -> IssueKey {
    find_issue_key(text).unwrap()
}

#[tokio::test]
async fn lookup_reads_priority_with_bearer_auth() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/2/issue/PROJ-1")
        .match_header("authorization", "Bearer jira-secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "key": "PROJ-1",
                "fields": {
                    "priority": { "name": "Blocker" },
                    "issuetype": { "name": "Bug" },
                    "summary": "Crash on start"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let outcome = client(&server).lookup(&key("PROJ-1")).await;

    mock.assert_async().await;
    match outcome {
        LookupOutcome::Found(issue) => {
            assert_eq!(issue.priority.as_deref(), Some("Blocker"));
            assert_eq!(issue.issue_type.as_deref(), Some("Bug"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/2/issue/PROJ-404")
        .with_status(404)
        .with_body(r#"{"errorMessages":["Issue Does Not Exist"]}"#)
        .expect(1)
        .create_async()
        .await;

    let outcome = client(&server).lookup(&key("PROJ-404")).await;

    mock.assert_async().await;
    assert_eq!(outcome, LookupOutcome::NotFound);
}

#[tokio::test]
async fn forbidden_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/2/issue/SEC-9")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;

    let outcome = client(&server).lookup(&key("SEC-9")).await;

    mock.assert_async().await;
    assert_eq!(outcome, LookupOutcome::Forbidden);
}

#[tokio::test]
async fn server_errors_are_retried_until_attempts_run_out() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/api/2/issue/PROJ-2")
        .with_status(503)
        .with_body("maintenance")
        .expect(3)
        .create_async()
        .await;

    let outcome = client(&server).lookup(&key("PROJ-2")).await;

    mock.assert_async().await;
    match outcome {
        LookupOutcome::Unavailable { attempts, error } => {
            assert_eq!(attempts, 3);
            assert!(error.contains("503"), "{error}");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn comment_is_posted_as_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/api/2/issue/PROJ-1/comment")
        .match_header("authorization", "Bearer jira-secret")
        .match_body(Matcher::Json(json!({
            "body": "Merged: https://github.com/acme/widgets/pull/7"
        })))
        .with_status(201)
        .with_body(r#"{"id":"10000"}"#)
        .expect(1)
        .create_async()
        .await;

    let outcome = client(&server)
        .comment(&key("PROJ-1"), "Merged: https://github.com/acme/widgets/pull/7")
        .await;

    mock.assert_async().await;
    assert_eq!(outcome, CommentOutcome::Posted);
}

#[tokio::test]
async fn failed_comment_is_retried_then_abandoned() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/api/2/issue/PROJ-1/comment")
        .with_status(404)
        .expect(3)
        .create_async()
        .await;

    let outcome = client(&server).comment(&key("PROJ-1"), "merged").await;

    mock.assert_async().await;
    assert!(matches!(
        outcome,
        CommentOutcome::Abandoned { attempts: 3, .. }
    ));
}
