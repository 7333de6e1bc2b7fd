mod test_utils;

use folio_core::MemoryHandle;
use folio_interface::ProviderAdapter;
use folio_models::GeminiClient;
use folio_rate_limit::CallPolicy;
use serde_json::json;
use test_utils::MockServer;

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key", "gemini-1.5-flash-001")
        .with_base_url(format!("{}/v1beta", server.url))
        .with_policy(CallPolicy::immediate(1))
}

fn reply(text: &str) -> (u16, String) {
    (
        200,
        json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
            "usageMetadata": {"promptTokenCount": 100, "candidatesTokenCount": 20}
        })
        .to_string(),
    )
}

#[tokio::test]
async fn test_session_uses_context_cache() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        (
            200,
            json!({"name": "cachedContents/abc", "expireTime": "2099-01-01T00:00:00Z"})
                .to_string(),
        ),
        reply("The cave was dark."),
        (200, "{}".to_string()),
    ])
    .await;
    let adapter = client(&server);

    let session = adapter.open_session("Outline:\nA cave.").await?;
    assert_eq!(
        session.handle(),
        &MemoryHandle::Cache {
            name: "cachedContents/abc".to_string()
        }
    );
    assert!(session.expires_at().is_some());

    let text = adapter.generate_with_memory("Begin.", &session).await?;
    assert_eq!(text, "The cave was dark.");
    adapter.close_session(&session).await?;

    let requests = server.requests();
    let create: serde_json::Value = serde_json::from_str(&requests[0].body)?;
    assert_eq!(create["model"], "models/gemini-1.5-flash-001");
    assert_eq!(create["ttl"], "3600s");

    let generate: serde_json::Value = serde_json::from_str(&requests[1].body)?;
    assert_eq!(generate["cachedContent"], "cachedContents/abc");
    assert!(generate.get("systemInstruction").is_none());
    assert!(requests[1].headers.contains("x-goog-api-key: test-key"));

    assert!(requests[2].line.starts_with("DELETE /v1beta/cachedContents/abc"));
    Ok(())
}

#[tokio::test]
async fn test_cache_failure_falls_back_to_inline_reference() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        (400, json!({"error": {"message": "too small"}}).to_string()),
        reply("Fine."),
    ])
    .await;
    let adapter = client(&server);

    let session = adapter.open_session("Outline:\nA cave.").await?;
    assert_eq!(session.handle(), &MemoryHandle::Transcript);

    adapter.generate_with_memory("Begin.", &session).await?;
    let generate: serde_json::Value = serde_json::from_str(&server.requests()[1].body)?;
    assert_eq!(
        generate["systemInstruction"]["parts"][0]["text"],
        "Outline:\nA cave."
    );
    assert!(generate.get("cachedContent").is_none());

    // Nothing to delete for a transcript session
    adapter.close_session(&session).await?;
    assert_eq!(server.requests().len(), 2);
    Ok(())
}
