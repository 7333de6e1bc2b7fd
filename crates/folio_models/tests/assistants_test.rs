mod test_utils;

use folio_core::MemoryHandle;
use folio_error::ProviderErrorKind;
use folio_interface::ProviderAdapter;
use folio_models::AssistantsClient;
use folio_rate_limit::{CallPolicy, PollPolicy};
use serde_json::json;
use test_utils::MockServer;

fn client(server: &MockServer) -> AssistantsClient {
    AssistantsClient::new("test-key", "gpt-4o-mini")
        .with_base_url(format!("{}/v1", server.url))
        .with_policy(CallPolicy::immediate(1))
        .with_poll(PollPolicy::immediate(5))
}

fn ok(value: serde_json::Value) -> (u16, String) {
    (200, value.to_string())
}

#[tokio::test]
async fn test_thread_turn_polls_until_completed() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        ok(json!({"id": "thread_1"})),
        ok(json!({"id": "asst_1"})),
        ok(json!({"id": "msg_1"})),
        ok(json!({"id": "run_1", "status": "queued"})),
        ok(json!({"id": "run_1", "status": "in_progress"})),
        ok(json!({"id": "run_1", "status": "completed",
                  "usage": {"prompt_tokens": 40, "completion_tokens": 12}})),
        ok(json!({"data": [{"role": "assistant",
                  "content": [{"type": "text", "text": {"value": "The cave was dark."}}]}]})),
        ok(json!({"id": "thread_1", "deleted": true})),
    ])
    .await;
    let adapter = client(&server);
    assert!(adapter.needs_persistent_context());

    let session = adapter.open_session("Outline:\nA cave.").await?;
    assert_eq!(
        session.handle(),
        &MemoryHandle::Thread {
            id: "thread_1".to_string()
        }
    );

    let text = adapter.generate_with_memory("Begin.", &session).await?;
    assert_eq!(text, "The cave was dark.");
    adapter.close_session(&session).await?;

    let requests = server.requests();
    assert_eq!(requests.len(), 8);
    assert!(requests[0].body.contains("Outline:"));
    assert!(requests[0].headers.contains("openai-beta: assistants=v2"));
    assert!(requests[3].line.starts_with("POST /v1/threads/thread_1/runs"));
    assert!(requests[4].line.starts_with("GET /v1/threads/thread_1/runs/run_1"));
    assert!(requests[6].line.contains("order=desc"));
    assert!(requests[7].line.starts_with("DELETE /v1/threads/thread_1"));
    Ok(())
}

#[tokio::test]
async fn test_failed_run_is_reported() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        ok(json!({"id": "thread_1"})),
        ok(json!({"id": "msg_1"})),
        ok(json!({"id": "run_1", "status": "queued"})),
        ok(json!({"id": "run_1", "status": "failed"})),
    ])
    .await;
    let adapter = client(&server).with_assistant_id("asst_existing");

    let session = adapter.open_session("ref").await?;
    let err = adapter
        .generate_with_memory("Begin.", &session)
        .await
        .unwrap_err();
    assert!(matches!(
        &err.as_provider().unwrap().kind,
        ProviderErrorKind::JobFailed { status } if status == "failed"
    ));
    assert!(server.requests()[2].body.contains("asst_existing"));
    Ok(())
}

#[tokio::test]
async fn test_poll_gives_up_after_max_polls() -> anyhow::Result<()> {
    let server = MockServer::start(vec![
        ok(json!({"id": "thread_1"})),
        ok(json!({"id": "msg_1"})),
        ok(json!({"id": "run_1", "status": "queued"})),
        ok(json!({"id": "run_1", "status": "in_progress"})),
    ])
    .await;
    let adapter = client(&server).with_assistant_id("asst_1");
    let session = adapter.open_session("ref").await?;
    let err = adapter
        .generate_with_memory("Begin.", &session)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_provider().unwrap().kind,
        ProviderErrorKind::PollTimeout { polls: 5 }
    ));
    Ok(())
}
