//! End-to-end tests for the `fetchkit` binary against a local mock server.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetchkit() -> Command {
    let mut cmd = Command::cargo_bin("fetchkit").expect("binary should build");
    cmd.env_remove("FETCHKIT_PROXY")
        .env_remove("FETCHKIT_TIMEOUT")
        .env_remove("FETCHKIT_USER_AGENT")
        .env_remove("RUST_LOG")
        .env("NO_PROXY", "*");
    cmd
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.output())
        .await
        .expect("command thread panicked")
        .expect("failed to spawn fetchkit")
        .assert()
}

#[test]
fn test_help() {
    fetchkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("post"));
}

#[test]
fn test_unsupported_method_exit_code() {
    fetchkit()
        .args(["request", "PUT", "http://127.0.0.1:9/"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("unsupported HTTP method: PUT"));
}

#[test]
fn test_post_without_body_exit_code() {
    fetchkit()
        .args(["post", "http://127.0.0.1:9/"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("POST requires a JSON or form body"));
}

#[test]
fn test_invalid_proxy_exit_code() {
    fetchkit()
        .args(["get", "http://127.0.0.1:9/", "--proxy", "not a proxy"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("invalid proxy URL"));
}

#[test]
fn test_connection_refused_exit_code() {
    fetchkit()
        .args(["get", "http://127.0.0.1:9/"])
        .assert()
        .code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_prints_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("page", "1"))
        .and(header("x-name", "fetchkit"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/get", server.uri());
    let mut cmd = fetchkit();
    cmd.args(["get", url.as_str(), "-p", "page=1", "-H", "X-Name: fetchkit"]);

    run(cmd).await.success().stdout("hello\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pretty_output() {
    let server = MockServer::start().await;
    Mock::given(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": 1})))
        .mount(&server)
        .await;

    let url = format!("{}/json", server.uri());
    let mut cmd = fetchkit();
    cmd.args(["get", url.as_str(), "--output", "pretty"]);

    run(cmd).await.success().stdout("{\n  \"a\": 1\n}\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/post"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("name=form"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/post", server.uri());
    let mut cmd = fetchkit();
    cmd.args([
        "post",
        url.as_str(),
        "-f",
        "name=form",
        "-o",
        "status",
    ]);

    run(cmd).await.success().stdout("201\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_user_agent_from_env() {
    let server = MockServer::start().await;
    Mock::given(header("user-agent", "env-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ua ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = fetchkit();
    cmd.env("FETCHKIT_USER_AGENT", "env-agent")
        .args(["get", server.uri().as_str()]);

    run(cmd).await.success().stdout("ua ok\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_output_of_non_json_body_fails() {
    let server = MockServer::start().await;
    Mock::given(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
        .mount(&server)
        .await;

    let url = format!("{}/text", server.uri());
    let mut cmd = fetchkit();
    cmd.args(["get", url.as_str(), "-o", "json"]);

    run(cmd)
        .await
        .code(1)
        .stderr(predicate::str::contains("failed to decode JSON object"));
}
