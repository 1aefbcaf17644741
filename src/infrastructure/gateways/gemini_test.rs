use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use futures::TryStreamExt;
use mockito::Matcher;
use serde_json::json;
use test_utils::gemini_completion_fixture;
use test_utils::gemini_sse_fixture;

use super::parse_event;
use super::to_contents;
use super::Gemini;
use super::GatewayConfig;
use crate::domain::models::Gateway;
use crate::domain::models::Message;

impl Gemini {
    fn with_url(url: String) -> Gemini {
        return Gemini {
            url,
            token: "abc".to_string(),
            timeout: "200".to_string(),
            config: GatewayConfig {
                model_id: "model-1".to_string(),
                system_instruction: "You sell spider pools.".to_string(),
                request_timeout: Some(Duration::from_secs(5)),
            },
        };
    }
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(200)
        .create();

    let gateway = Gemini::with_url(server.url());
    let res = gateway.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1beta/models/model-1?key=abc")
        .with_status(500)
        .create();

    let gateway = Gemini::with_url(server.url());
    let res = gateway.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks_without_a_token() {
    let mut gateway = Gemini::with_url("http://localhost:1".to_string());
    gateway.token = "".to_string();

    let res = gateway.health_check().await;

    assert_eq!(res.unwrap_err().to_string(), "Gemini token is not defined");
}

#[tokio::test]
async fn it_streams_fragments() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:streamGenerateContent?alt=sse&key=abc")
        .match_body(Matcher::Json(json!({
            "contents": [
                { "role": "model", "parts": [{ "text": "Hello!" }] },
                { "role": "user", "parts": [{ "text": "Say hi to the world" }] }
            ],
            "systemInstruction": { "parts": [{ "text": "You sell spider pools." }] }
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(gemini_sse_fixture(&["Hello ", "", "World"]))
        .create();

    let gateway = Gemini::with_url(server.url());
    let history = vec![
        Message::assistant("Hello!"),
        Message::user("Say hi to the world"),
    ];
    let fragments = gateway
        .stream_converse(history, "Say hi to the world".to_string())
        .await?
        .try_collect::<Vec<String>>()
        .await?;

    mock.assert();
    assert_eq!(fragments, vec!["Hello ".to_string(), "World".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_fails_streaming_on_error_status() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:streamGenerateContent?alt=sse&key=abc")
        .with_status(429)
        .create();

    let gateway = Gemini::with_url(server.url());
    let res = gateway
        .stream_converse(vec![Message::user("hi")], "hi".to_string())
        .await;

    mock.assert();
    assert_eq!(
        res.err().map(|err| return err.to_string()),
        Some("Failed to make request to Gemini, 429".to_string())
    );
}

#[tokio::test]
async fn it_ends_the_stream_after_a_malformed_event() -> Result<()> {
    let mut server = mockito::Server::new();
    let body = format!(
        "{}data: {{not json}}\r\n\r\n{}",
        gemini_sse_fixture(&["Hi"]),
        gemini_sse_fixture(&["never"])
    );
    let mock = server
        .mock("POST", "/v1beta/models/model-1:streamGenerateContent?alt=sse&key=abc")
        .with_status(200)
        .with_body(body)
        .create();

    let gateway = Gemini::with_url(server.url());
    let items = gateway
        .stream_converse(vec![Message::user("hi")], "hi".to_string())
        .await?
        .collect::<Vec<_>>()
        .await;

    mock.assert();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Ok("Hi".to_string()));
    assert!(items[1].is_err());

    return Ok(());
}

#[tokio::test]
async fn it_generates_a_completion() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .match_body(Matcher::Json(json!({
            "contents": [
                { "role": "user", "parts": [{ "text": "Write five titles" }] }
            ]
        })))
        .with_status(200)
        .with_body(gemini_completion_fixture("1. Get indexed today"))
        .create();

    let gateway = Gemini::with_url(server.url());
    let res = gateway.generate("Write five titles".to_string()).await?;

    mock.assert();
    assert_eq!(res, "1. Get indexed today");

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_an_empty_completion() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .with_status(200)
        .with_body(r#"{"candidates": []}"#)
        .create();

    let gateway = Gemini::with_url(server.url());
    let res = gateway.generate("Write five titles".to_string()).await;

    mock.assert();
    assert!(res.is_err());
}

#[tokio::test]
async fn it_fails_generation_on_error_status() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/model-1:generateContent?key=abc")
        .with_status(500)
        .create();

    let gateway = Gemini::with_url(server.url());
    let res = gateway.generate("Write five titles".to_string()).await;

    mock.assert();
    assert!(res.is_err());
}

#[test]
fn it_does_not_repeat_the_new_message() {
    let history = vec![Message::assistant("Hello!"), Message::user("hi")];

    let contents = to_contents(&history, "hi");

    assert_eq!(contents.len(), 2);
    assert_eq!(contents[1].role, "user");
    assert_eq!(contents[1].parts[0].text, "hi");
}

#[test]
fn it_appends_the_new_message_when_history_lacks_it() {
    let contents = to_contents(&[Message::assistant("Hello!")], "hi");

    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].role, "model");
    assert_eq!(contents[1].parts[0].text, "hi");
}

#[test]
fn it_merges_user_turns_left_around_an_empty_reply() {
    let history = vec![
        Message::assistant("Hello!"),
        Message::user("first"),
        Message::assistant(""),
        Message::user("second"),
    ];

    let contents = to_contents(&history, "second");

    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].role, "model");
    assert_eq!(contents[1].role, "user");
    let texts = contents[1]
        .parts
        .iter()
        .map(|part| return part.text.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(texts, vec!["first", "second"]);
}

#[test]
fn it_merges_a_new_message_into_a_trailing_user_turn() {
    let contents = to_contents(&[Message::user("first")], "second");

    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].parts.len(), 2);
    assert_eq!(contents[0].parts[1].text, "second");
}

#[test]
fn it_parses_stream_events() -> Result<()> {
    assert_eq!(parse_event("")?, None);
    assert_eq!(parse_event(": keep-alive")?, None);
    assert_eq!(
        parse_event(r#"data: {"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#)?,
        Some("ab".to_string())
    );
    assert_eq!(parse_event(r#"data: {"candidates":[]}"#)?, None);
    assert!(parse_event("data: nope").is_err());

    return Ok(());
}
