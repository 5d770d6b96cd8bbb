use std::time::Duration as StdDuration;

use httpmock::prelude::*;
use planner_heatmap_lib::error::AppError;
use planner_heatmap_lib::models::activity::ActivitySource;
use planner_heatmap_lib::services::contribution_client::{
    ContributionFeed, GitHubClient, LeetCodeClient,
};
use serde_json::json;

const TIMEOUT: StdDuration = StdDuration::from_secs(2);

#[tokio::test]
async fn github_client_sends_bearer_token_and_login() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/graphql")
                .header("authorization", "Bearer ghp_secret")
                .json_body_partial(r#"{ "variables": { "login": "octocat" } }"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "data": { "user": null } }));
        })
        .await;

    let client = GitHubClient::new(
        server.url("/graphql"),
        Some("ghp_secret".to_string()),
        TIMEOUT,
    )
    .expect("client");
    let payload = client.fetch("octocat").await.expect("payload");

    mock.assert_async().await;
    assert_eq!(payload, json!({ "data": { "user": null } }));
}

#[tokio::test]
async fn leetcode_client_sends_browser_user_agent() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/graphql")
                .header_exists("user-agent")
                .json_body_partial(r#"{ "variables": { "username": "solver" } }"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": { "matchedUser": { "submissionCalendar": "{}" } }
                }));
        })
        .await;

    let client = LeetCodeClient::new(server.url("/graphql"), TIMEOUT).expect("client");
    let payload = client.fetch("solver").await.expect("payload");

    mock.assert_async().await;
    assert_eq!(payload["data"]["matchedUser"]["submissionCalendar"], "{}");
}

#[tokio::test]
async fn not_found_and_rate_limits_map_to_source_errors() {
    let server = MockServer::start_async().await;

    let _missing = server
        .mock_async(|when, then| {
            when.method(POST).path("/leetcode");
            then.status(404);
        })
        .await;
    let _limited = server
        .mock_async(|when, then| {
            when.method(POST).path("/github");
            then.status(403);
        })
        .await;

    let leetcode = LeetCodeClient::new(server.url("/leetcode"), TIMEOUT).expect("client");
    let error = leetcode.fetch("ghost").await.expect_err("404 should fail");
    assert_eq!(error.to_string(), "LeetCode: user not found");
    assert!(matches!(
        error,
        AppError::Source {
            origin: ActivitySource::LeetCode,
            status: Some(404),
            ..
        }
    ));

    let github =
        GitHubClient::new(server.url("/github"), Some("t".to_string()), TIMEOUT).expect("client");
    let error = github.fetch("octocat").await.expect_err("403 should fail");
    assert_eq!(error.to_string(), "GitHub: API rate limit exceeded");
}

#[tokio::test]
async fn slow_upstream_is_reported_as_timeout() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200)
                .delay(StdDuration::from_millis(500))
                .header("content-type", "application/json")
                .json_body(json!({ "data": {} }));
        })
        .await;

    let client = LeetCodeClient::new(server.url("/graphql"), StdDuration::from_millis(100))
        .expect("client");
    let error = client.fetch("solver").await.expect_err("should time out");

    assert!(matches!(
        error,
        AppError::Timeout {
            origin: ActivitySource::LeetCode
        }
    ));
    assert!(error.allows_cache_fallback());
}

#[tokio::test]
async fn undecodable_body_is_a_source_error() {
    let server = MockServer::start_async().await;

    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/graphql");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html>maintenance</html>");
        })
        .await;

    let client = GitHubClient::new(server.url("/graphql"), Some("t".to_string()), TIMEOUT)
        .expect("client");
    let error = client.fetch("octocat").await.expect_err("should fail");

    assert!(matches!(
        error,
        AppError::Source {
            origin: ActivitySource::GitHub,
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let client = LeetCodeClient::new("http://127.0.0.1:1/graphql", TIMEOUT).expect("client");
    let error = client.fetch("solver").await.expect_err("should fail");

    assert!(matches!(
        error,
        AppError::Network {
            origin: ActivitySource::LeetCode,
            ..
        }
    ));
}
