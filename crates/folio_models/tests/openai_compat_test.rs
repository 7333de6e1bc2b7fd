mod test_utils;

use folio_core::{MemoryHandle, ProviderSession};
use folio_error::ProviderErrorKind;
use folio_interface::ProviderAdapter;
use folio_models::OpenAICompatibleClient;
use folio_rate_limit::CallPolicy;
use test_utils::{MockServer, chat_body};

fn client(server: &MockServer, attempts: usize) -> OpenAICompatibleClient {
    OpenAICompatibleClient::new("local", "test-key", "test-model")
        .with_base_url(format!("{}/v1", server.url))
        .with_policy(CallPolicy::immediate(attempts))
}

#[tokio::test]
async fn test_generate_returns_trimmed_text() -> anyhow::Result<()> {
    let server = MockServer::start(vec![(200, chat_body("  The cave was dark.\n"))]).await;
    let text = client(&server, 1).generate("Begin.", 1).await?;
    assert_eq!(text, "The cave was dark.");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].line.starts_with("POST /v1/chat/completions"));
    assert!(requests[0].headers.contains("authorization: bearer test-key"));
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retried() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        (503, "{}".to_string()),
        (200, chat_body("Recovered.")),
    ])
    .await;
    let text = client(&server, 3).generate("Begin.", 1).await?;
    assert_eq!(text, "Recovered.");
    assert_eq!(server.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_completion_exhausts_as_malformed() {
    let server = MockServer::start(vec![(200, chat_body("   "))]).await;
    let err = client(&server, 2).generate("Begin.", 1).await.unwrap_err();
    let provider = err.as_provider().unwrap();
    assert!(provider.kind.is_malformed());
    assert!(matches!(
        provider.kind,
        ProviderErrorKind::RetriesExhausted { attempts: 2, .. }
    ));
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start(vec![(401, r#"{"error": "bad key"}"#.to_string())]).await;
    let err = client(&server, 5).generate("Begin.", 1).await.unwrap_err();
    assert!(matches!(
        err.as_provider().unwrap().kind,
        ProviderErrorKind::Http { status: 401, .. }
    ));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_memory_sends_reference_and_transcript() -> anyhow::Result<()> {
    let server = MockServer::start(vec![(200, chat_body("Next part."))]).await;
    let adapter = client(&server, 1);

    let mut session = adapter.open_session("Outline:\nA cave.").await?;
    assert_eq!(session.handle(), &MemoryHandle::Transcript);
    session.append_transcript("[Fragment 1]\nThe cave was dark.\n\n");

    adapter.generate_with_memory("Continue.", &session).await?;

    let body: serde_json::Value = serde_json::from_str(&server.requests()[0].body)?;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], "Outline:\nA cave.");
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["content"], "[Fragment 1]\nThe cave was dark.");
    assert_eq!(messages[3]["content"], "Continue.");
    adapter.close_session(&session).await?;
    Ok(())
}

#[tokio::test]
async fn test_scan_retries_unparseable_reply() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        (200, chat_body("I could not find anything.")),
        (
            200,
            chat_body(r#"```json
[{"match": "heart raced", "sentence": "Her heart raced.", "sentence_index": 4}]
```"#),
        ),
    ])
    .await;
    let findings = client(&server, 2).scan_patterns("Find it.").await?;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].as_finding().unwrap().sentence_index(), 4);
    Ok(())
}

#[tokio::test]
async fn test_fresh_session_is_not_expired() -> anyhow::Result<()> {
    let server = MockServer::start(vec![(200, chat_body("x"))]).await;
    let session: ProviderSession = client(&server, 1).open_session("ref").await?;
    assert!(session.expires_at().is_none());
    assert!(session.transcript().is_empty());
    Ok(())
}
