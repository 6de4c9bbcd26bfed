use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures_util::stream;
use murmur_agent::{AgentClient, AgentError, AgentRuntime, CompletionEvent, CompletionStream};
use murmur_server::{app, orchestrator::Orchestrator, AppState};
use murmur_session::{
    AnalysisRequest, AnalysisTrigger, SessionError, SessionFinisher, SessionMerger, StoreMerger,
    SummaryLocation,
};
use murmur_storage::{LogStore, MemoryObjectStore, ObjectStore, UrlSigner};
use murmur_types::{LogRecord, SessionId, MANUAL_LOG_REPLY};
use murmur_voice::{
    SpeechSynthesizer, SynthesisConfig, SynthesisEndpoint, SynthesisRequest, VoiceError,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const BUCKET: &str = "conversation-logs";

/// Replies with fixed text split into small chunks.
struct EchoAgent {
    reply: &'static str,
}

#[async_trait]
impl AgentRuntime for EchoAgent {
    async fn invoke(
        &self,
        _session_id: &SessionId,
        _input_text: &str,
    ) -> Result<CompletionStream, AgentError> {
        let events: Vec<Result<CompletionEvent, AgentError>> = self
            .reply
            .as_bytes()
            .chunks(2)
            .map(|c| Ok(CompletionEvent::Chunk(c.to_vec())))
            .collect();
        Ok(Box::pin(stream::iter(events)))
    }
}

struct FailingAgent;

#[async_trait]
impl AgentRuntime for FailingAgent {
    async fn invoke(
        &self,
        _session_id: &SessionId,
        _input_text: &str,
    ) -> Result<CompletionStream, AgentError> {
        Err(AgentError::Status {
            status: 503,
            body: "agent unavailable".to_string(),
        })
    }
}

struct StubSynthesis {
    fail: bool,
}

#[async_trait]
impl SynthesisEndpoint for StubSynthesis {
    async fn invoke(&self, _request: &SynthesisRequest) -> Result<Value, VoiceError> {
        if self.fail {
            return Err(VoiceError::Tts("endpoint timed out".to_string()));
        }
        Ok(json!({"status": "ok"}))
    }
}

type Events = Arc<Mutex<Vec<&'static str>>>;

/// Delegates to a real merger while recording that it ran.
struct RecordingMerger {
    inner: StoreMerger,
    events: Events,
}

#[async_trait]
impl SessionMerger for RecordingMerger {
    async fn merge(&self, session_id: &SessionId) -> Result<SummaryLocation, SessionError> {
        let location = self.inner.merge(session_id).await?;
        self.events.lock().unwrap().push("merge");
        Ok(location)
    }
}

struct RecordingTrigger {
    events: Events,
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

#[async_trait]
impl AnalysisTrigger for RecordingTrigger {
    async fn trigger(&self, request: &AnalysisRequest) -> Result<(), SessionError> {
        self.events.lock().unwrap().push("analyze");
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

struct Harness {
    app: Router,
    store: MemoryObjectStore,
    events: Events,
    analysis_requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

fn harness(agent: Arc<dyn AgentRuntime>, synthesis_fails: bool) -> Harness {
    let store = MemoryObjectStore::new();
    let objects: Arc<dyn ObjectStore> = Arc::new(store.clone());
    let signer = Arc::new(UrlSigner::new("test-secret", "http://localhost:3000").unwrap());
    let logs = LogStore::new(objects.clone(), BUCKET);

    let events: Events = Arc::default();
    let analysis_requests: Arc<Mutex<Vec<AnalysisRequest>>> = Arc::default();
    let finisher = SessionFinisher::new(
        Arc::new(RecordingMerger {
            inner: StoreMerger::new(logs.clone()),
            events: events.clone(),
        }),
        Arc::new(RecordingTrigger {
            events: events.clone(),
            requests: analysis_requests.clone(),
        }),
    );
    let synthesizer = SpeechSynthesizer::new(
        Arc::new(StubSynthesis {
            fail: synthesis_fails,
        }),
        signer.clone(),
        SynthesisConfig::default(),
    );

    let state = AppState {
        orchestrator: Orchestrator::new(AgentClient::new(agent), synthesizer, logs, finisher),
        signer,
        objects,
    };

    Harness {
        app: app(state),
        store,
        events,
        analysis_requests,
    }
}

fn default_harness() -> Harness {
    harness(Arc::new(EchoAgent { reply: "你好！I am here." }), false)
}

async fn post_action(app: &Router, body: Value) -> (StatusCode, Value) {
    post_raw(app, body.to_string()).await
}

async fn post_raw(app: &Router, body: String) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/actions")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn seed_logs(store: &MemoryObjectStore, session: &str, n: usize) {
    let logs = LogStore::new(Arc::new(store.clone()), BUCKET);
    let sid = SessionId::parse(session).unwrap();
    for i in 0..n {
        logs.append(&LogRecord::new(sid.clone(), format!("turn {}", i), "ok"))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn health_check_returns_ok() {
    let h = default_harness();
    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let h = default_harness();
    let (status, body) = post_action(&h.app, json!({"action": "reboot", "sessionId": "s1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Unknown action"}));

    let (status, body) = post_action(&h.app, json!({"sessionId": "s1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action");
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let h = default_harness();

    let (status, _) = post_raw(&h.app, "not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_action(&h.app, json!({"action": "log_conversation", "sessionId": "../etc"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_action(&h.app, json!({"action": "invoke_agent", "sessionId": "s1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("message is required"));

    assert!(h.store.keys(BUCKET, "").await.is_empty());
}

#[tokio::test]
async fn log_conversation_writes_one_record() {
    let h = default_harness();
    let (status, body) = post_action(
        &h.app,
        json!({"action": "log_conversation", "sessionId": "s1", "message": "hello"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Conversation logged."}));

    let keys = h.store.keys(BUCKET, "logs/s1/").await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(".json"));

    let object = h.store.get_object(BUCKET, &keys[0]).await.unwrap();
    let record: Value = serde_json::from_slice(&object.body).unwrap();
    assert_eq!(record["userInput"], "hello");
    assert_eq!(record["agentReply"], MANUAL_LOG_REPLY);
    assert_eq!(record["sessionId"], "s1");
}

#[tokio::test]
async fn action_name_is_case_insensitive_and_envelope_is_unwrapped() {
    let h = default_harness();
    let inner = json!({"action": "  Log_Conversation ", "sessionId": "s2", "message": "hi"});
    let (status, _) = post_action(&h.app, json!({"body": inner.to_string()})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.store.keys(BUCKET, "logs/s2/").await.len(), 1);
}

#[tokio::test]
async fn invoke_agent_returns_reply_audio_and_logs_turn() {
    let h = default_harness();
    let (status, body) = post_action(
        &h.app,
        json!({"action": "invoke_agent", "sessionId": "s1", "message": "hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "你好！I am here.");
    assert_eq!(body["sessionId"], "s1");
    assert_eq!(body["audioStatus"], "success");
    let url = body["audioUrl"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:3000/objects/f5tts-output-wav/audio/s1/"));

    let keys = h.store.keys(BUCKET, "logs/s1/").await;
    assert_eq!(keys.len(), 1);
    let object = h.store.get_object(BUCKET, &keys[0]).await.unwrap();
    let record: Value = serde_json::from_slice(&object.body).unwrap();
    assert_eq!(record["userInput"], "hello");
    assert_eq!(record["agentReply"], "你好！I am here.");
}

#[tokio::test]
async fn invoke_agent_generates_session_id_when_missing() {
    let h = default_harness();
    let (status, body) =
        post_action(&h.app, json!({"action": "invoke_agent", "message": "hello"})).await;
    assert_eq!(status, StatusCode::OK);

    let sid = body["sessionId"].as_str().unwrap();
    assert_eq!(sid.len(), 36);
    assert_eq!(h.store.keys(BUCKET, &format!("logs/{}/", sid)).await.len(), 1);
}

#[tokio::test]
async fn synthesis_failure_still_returns_reply() {
    let h = harness(Arc::new(EchoAgent { reply: "plain text" }), true);
    let (status, body) = post_action(
        &h.app,
        json!({"action": "invoke_agent", "sessionId": "s1", "message": "hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "plain text");
    assert!(body["audioUrl"].is_null());
    assert_eq!(body["audioStatus"], "error");
}

#[tokio::test]
async fn agent_failure_is_internal_error() {
    let h = harness(Arc::new(FailingAgent), false);
    let (status, body) = post_action(
        &h.app,
        json!({"action": "invoke_agent", "sessionId": "s1", "message": "hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("agent unavailable"));
    assert!(h.store.keys(BUCKET, "logs/s1/").await.is_empty());
}

#[tokio::test]
async fn delete_session_removes_more_than_one_page() {
    let h = default_harness();
    seed_logs(&h.store, "s1", 1500).await;
    seed_logs(&h.store, "s10", 3).await;

    let (status, body) =
        post_action(&h.app, json!({"action": "delete_session", "sessionId": "s1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Session S3 logs deleted."}));

    assert!(h.store.keys(BUCKET, "logs/s1/").await.is_empty());
    assert_eq!(h.store.keys(BUCKET, "logs/s10/").await.len(), 3);
}

#[tokio::test]
async fn delete_session_without_logs_succeeds() {
    let h = default_harness();
    let (status, body) =
        post_action(&h.app, json!({"action": "delete_session", "sessionId": "nobody"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session S3 logs deleted.");
}

#[tokio::test]
async fn end_session_merges_before_analysis() {
    let h = default_harness();
    seed_logs(&h.store, "s1", 3).await;

    let (status, body) =
        post_action(&h.app, json!({"action": "end_session", "sessionId": "s1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Session ended, logs merged and analyzed."}));

    assert_eq!(*h.events.lock().unwrap(), vec!["merge", "analyze"]);

    let requests = h.analysis_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].summary_key, "summaries/s1/summary.json");
    assert_eq!(requests[0].summary_bucket, BUCKET);

    let summary = h
        .store
        .get_object(BUCKET, "summaries/s1/summary.json")
        .await
        .unwrap();
    let summary: Value = serde_json::from_slice(&summary.body).unwrap();
    assert_eq!(summary["turnCount"], 3);

    // Ending a session keeps its logs.
    assert_eq!(h.store.keys(BUCKET, "logs/s1/").await.len(), 3);
}

#[tokio::test]
async fn oversized_body_gets_json_error() {
    let h = default_harness();
    let padding = "x".repeat(3 * 1024 * 1024);
    let body = json!({"action": "log_conversation", "sessionId": "s1", "message": padding});

    let (status, body) = post_action(&h.app, body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().is_some());
    assert!(h.store.keys(BUCKET, "logs/s1/").await.is_empty());
}
