use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use futures_util::stream;
use murmur_agent::{
    AgentClient, AgentConfig, AgentError, AgentRuntime, CompletionEvent, CompletionStream,
    HttpAgentRuntime,
};
use murmur_types::SessionId;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Replays a fixed list of events.
struct ScriptedRuntime {
    events: Vec<Result<CompletionEvent, String>>,
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn invoke(
        &self,
        _session_id: &SessionId,
        _input_text: &str,
    ) -> Result<CompletionStream, AgentError> {
        let events: Vec<Result<CompletionEvent, AgentError>> = self
            .events
            .iter()
            .cloned()
            .map(|e| {
                e.map_err(|message| AgentError::Remote {
                    kind: "scriptedException".to_string(),
                    message,
                })
            })
            .collect();
        Ok(Box::pin(stream::iter(events)))
    }
}

fn sid(id: &str) -> SessionId {
    SessionId::parse(id).unwrap()
}

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn concatenates_chunks_in_order_across_split_characters() {
    let text = "你好, world";
    let bytes = text.as_bytes();
    // Split inside the first three-byte character.
    let runtime = ScriptedRuntime {
        events: vec![
            Ok(CompletionEvent::Chunk(bytes[..1].to_vec())),
            Ok(CompletionEvent::Other {
                kind: "trace".to_string(),
                payload: json!({"trace": {}}),
            }),
            Ok(CompletionEvent::Chunk(bytes[1..5].to_vec())),
            Ok(CompletionEvent::Chunk(bytes[5..].to_vec())),
        ],
    };

    let client = AgentClient::new(Arc::new(runtime));
    let reply = client.ask(&sid("s1"), "hi").await.unwrap();
    assert_eq!(reply, text);
}

#[tokio::test]
async fn empty_stream_yields_empty_reply() {
    let client = AgentClient::new(Arc::new(ScriptedRuntime { events: vec![] }));
    assert_eq!(client.ask(&sid("s1"), "hi").await.unwrap(), "");
}

#[tokio::test]
async fn stream_error_propagates() {
    let runtime = ScriptedRuntime {
        events: vec![
            Ok(CompletionEvent::Chunk(b"partial".to_vec())),
            Err("stream broke".to_string()),
        ],
    };
    let client = AgentClient::new(Arc::new(runtime));
    let err = client.ask(&sid("s1"), "hi").await.unwrap_err();
    assert!(err.to_string().contains("stream broke"));
}

#[tokio::test]
async fn invalid_utf8_reply_is_an_error() {
    let runtime = ScriptedRuntime {
        events: vec![Ok(CompletionEvent::Chunk(vec![0xff, 0xfe]))],
    };
    let client = AgentClient::new(Arc::new(runtime));
    assert!(matches!(
        client.ask(&sid("s1"), "hi").await,
        Err(AgentError::InvalidUtf8(_))
    ));
}

type Captured = Arc<Mutex<Vec<(String, String, String, Value)>>>;

async fn agent_handler(
    State(captured): State<Captured>,
    Path((agent, alias, session)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    captured
        .lock()
        .unwrap()
        .push((agent, alias, session.clone(), body));

    if session == "fail" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "agent exploded".to_string());
    }

    let body = format!(
        "{{\"chunk\":{{\"bytes\":\"{}\"}}}}\n{{\"trace\":{{}}}}\n{{\"chunk\":{{\"bytes\":\"{}\"}}}}",
        b64(b"Hello, "),
        b64(b"traveller")
    );
    (StatusCode::OK, body)
}

async fn spawn_agent() -> (SocketAddr, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/agents/{agent}/agentAliases/{alias}/sessions/{session}/text",
            post(agent_handler),
        )
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

#[tokio::test]
async fn http_runtime_streams_reply() {
    let (addr, captured) = spawn_agent().await;
    let config = AgentConfig::new(format!("http://{}", addr), "AGENT", "ALIAS");
    let client = AgentClient::new(Arc::new(HttpAgentRuntime::new(config).unwrap()));

    let reply = client.ask(&sid("s1"), "where am I?").await.unwrap();
    assert_eq!(reply, "Hello, traveller");

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (agent, alias, session, body) = &requests[0];
    assert_eq!(agent, "AGENT");
    assert_eq!(alias, "ALIAS");
    assert_eq!(session, "s1");
    assert_eq!(body["inputText"], "where am I?");
}

#[tokio::test]
async fn http_runtime_reports_error_status() {
    let (addr, _captured) = spawn_agent().await;
    let config = AgentConfig::new(format!("http://{}", addr), "AGENT", "ALIAS");
    let client = AgentClient::new(Arc::new(HttpAgentRuntime::new(config).unwrap()));

    match client.ask(&sid("fail"), "hi").await {
        Err(AgentError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "agent exploded");
        }
        other => panic!("expected Status error, got {:?}", other),
    }
}

#[test]
fn config_from_toml_uses_default_timeout() {
    let config: AgentConfig = toml::from_str(
        r#"
        endpoint = "http://agent.internal"
        agent_id = "XGLFHI6VPO"
        agent_alias_id = "BDCPIDGFEK"
        api_key = "secret-token"
    "#,
    )
    .expect("parse TOML");

    assert_eq!(config.timeout_secs, 120);
    assert_eq!(config.api_key, "secret-token");
    assert!(!format!("{:?}", config).contains("secret-token"));
}
