use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use super::codec::{EventParser, GatewayCodec};
use super::constants::CONNECTION_TIMEOUT;
use super::error::{GatewayError, GatewayResult};
use super::payloads::GatewayPayload;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

/// Frame-level transport under the session manager.
///
/// `receive` yields one decoded envelope per call. A malformed frame is
/// reported as [`GatewayError::Decode`] and leaves the transport usable;
/// closure is reported as [`GatewayError::ConnectionClosed`].
#[async_trait]
pub trait GatewayConnection: Send {
    async fn connect(&mut self, url: &str) -> GatewayResult<()>;
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;
    async fn receive(&mut self) -> GatewayResult<GatewayPayload>;
    async fn close(&mut self) -> GatewayResult<()>;
    fn is_connected(&self) -> bool;
}

pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    codec: Option<GatewayCodec>,
    connected: bool,
}

impl WebSocketConnection {
    /// With `compress` set, binary frames are inflated as one `zlib-stream`.
    #[must_use]
    pub fn new(compress: bool) -> Self {
        Self {
            writer: None,
            reader: None,
            codec: compress.then(GatewayCodec::new),
            connected: false,
        }
    }

    fn decode_binary(&mut self, data: &[u8]) -> GatewayResult<Option<GatewayPayload>> {
        match self.codec.as_mut() {
            Some(codec) => match codec.decode_binary(data)? {
                Some(json) => EventParser::parse_frame(&json).map(Some),
                None => Ok(None),
            },
            None => {
                let json = std::str::from_utf8(data)
                    .map_err(|e| GatewayError::decode(format!("invalid UTF-8: {e}")))?;
                EventParser::parse_frame(json).map(Some)
            }
        }
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, url: &str) -> GatewayResult<()> {
        if self.connected {
            return Err(GatewayError::AlreadyConnected);
        }

        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(url))
            .await
            .map_err(|_| GatewayError::timeout("connection"))?
            .map_err(|e| GatewayError::connection_failed(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.connected = true;
        if let Some(codec) = self.codec.as_mut() {
            codec.reset();
        }

        debug!(url, "WebSocket connected");
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or(GatewayError::NotConnected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::serialization(e.to_string()))?;

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::websocket(e.to_string()))?;

        trace!(op = payload.op, "Frame sent");
        Ok(())
    }

    async fn receive(&mut self) -> GatewayResult<GatewayPayload> {
        loop {
            let reader = self.reader.as_mut().ok_or(GatewayError::NotConnected)?;

            match reader.next().await {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Some(payload) = self.decode_binary(&data)? {
                        return Ok(payload);
                    }
                }
                Some(Ok(WsMessage::Text(text))) => {
                    return EventParser::parse_frame(&text);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.connected = false;
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );

                    return Err(GatewayError::ConnectionClosed { code, reason });
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if let Some(writer) = self.writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(GatewayError::websocket(e.to_string()));
                }
                None => {
                    self.connected = false;
                    return Err(GatewayError::ConnectionClosed {
                        code: 1000,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }

    async fn close(&mut self) -> GatewayResult<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.connected = false;
        if let Some(codec) = self.codec.as_mut() {
            codec.reset();
        }
        debug!("WebSocket connection closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
