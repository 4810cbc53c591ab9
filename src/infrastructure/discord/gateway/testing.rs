//! In-memory gateway transport fed from a script.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::connection::GatewayConnection;
use super::error::{GatewayError, GatewayResult};
use super::payloads::GatewayPayload;
use crate::domain::entities::AuthToken;
use crate::domain::ports::HttpResponse;
use crate::domain::ports::mocks::MockHttpBackend;
use crate::infrastructure::discord::DiscordClient;
use crate::infrastructure::discord::http::HttpClient;

type Frame = GatewayResult<GatewayPayload>;

/// Yields pushed frames in order and records everything sent. `receive`
/// pends while the script is empty and reports a closed connection once
/// the [`ScriptHandle`] is dropped.
pub struct ScriptedConnection {
    inbound: mpsc::UnboundedReceiver<Frame>,
    sent: Arc<Mutex<Vec<GatewayPayload>>>,
    urls: Arc<Mutex<Vec<String>>>,
    connected: bool,
}

#[derive(Clone)]
pub struct ScriptHandle {
    frames: mpsc::UnboundedSender<Frame>,
    sent: Arc<Mutex<Vec<GatewayPayload>>>,
    urls: Arc<Mutex<Vec<String>>>,
}

pub fn scripted() -> (ScriptedConnection, ScriptHandle) {
    let (frames, inbound) = mpsc::unbounded_channel();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let urls = Arc::new(Mutex::new(Vec::new()));

    let connection = ScriptedConnection {
        inbound,
        sent: Arc::clone(&sent),
        urls: Arc::clone(&urls),
        connected: false,
    };

    (connection, ScriptHandle { frames, sent, urls })
}

impl ScriptHandle {
    pub fn push(&self, frame: Frame) {
        let _ = self.frames.send(frame);
    }

    pub fn frame(&self, op: u8, d: Value, s: Option<u64>, t: Option<&str>) {
        self.push(Ok(GatewayPayload {
            op,
            d,
            s,
            t: t.map(String::from),
        }));
    }

    pub fn hello(&self, interval_ms: u64) {
        self.frame(10, json!({"heartbeat_interval": interval_ms}), None, None);
    }

    pub fn dispatch(&self, event: &str, sequence: u64, d: Value) {
        self.frame(0, d, Some(sequence), Some(event));
    }

    pub fn close(&self, code: u16) {
        self.push(Err(GatewayError::ConnectionClosed {
            code,
            reason: "closed by script".to_string(),
        }));
    }

    pub fn sent(&self) -> Vec<GatewayPayload> {
        self.sent.lock().clone()
    }

    pub fn sent_opcodes(&self) -> Vec<u8> {
        self.sent.lock().iter().map(|p| p.op).collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

/// REST client whose `/gateway/bot` lookup resolves to `wss://gateway.test`.
pub fn gateway_rest(token: &AuthToken) -> DiscordClient {
    let mut backend = MockHttpBackend::new();
    backend.expect_execute().returning(|_| {
        Ok(HttpResponse::new(
            200,
            r#"{"url": "wss://gateway.test", "shards": 1}"#,
        ))
    });

    DiscordClient::new(Arc::new(HttpClient::new(
        Arc::new(backend),
        "https://discord.test/api",
        token.clone(),
    )))
}

pub fn ready_payload(session_id: &str) -> Value {
    json!({
        "session_id": session_id,
        "user": {"id": "1", "username": "bot", "discriminator": "0001", "bot": true},
        "guilds": [{"id": "2", "unavailable": true}]
    })
}

pub fn message_payload(content: &str) -> Value {
    json!({
        "id": "334385199974967042",
        "channel_id": "290926798999357250",
        "author": {"id": "53908099506183680", "username": "Mason", "discriminator": "9999"},
        "content": content,
        "timestamp": "2017-07-11T17:27:07.299000+00:00"
    })
}

#[async_trait]
impl GatewayConnection for ScriptedConnection {
    async fn connect(&mut self, url: &str) -> GatewayResult<()> {
        self.urls.lock().push(url.to_string());
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        self.sent.lock().push(payload.clone());
        Ok(())
    }

    async fn receive(&mut self) -> GatewayResult<GatewayPayload> {
        match self.inbound.recv().await {
            Some(frame) => frame,
            None => {
                self.connected = false;
                Err(GatewayError::ConnectionClosed {
                    code: 1000,
                    reason: "script ended".to_string(),
                })
            }
        }
    }

    async fn close(&mut self) -> GatewayResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
