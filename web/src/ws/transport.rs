use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use log::*;
use relay::{Transport, TransportError};
use std::borrow::Cow;
use tokio::sync::Mutex;

/// The sending half of a client WebSocket. The relay and the close path may
/// write concurrently, so the sink sits behind an async mutex.
pub(crate) struct WebSocketTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketTransport {
    pub(crate) fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Sends a close frame. Failures are ignored: the peer is leaving either way.
    pub(crate) async fn close(&self, code: u16, reason: &'static str) {
        let frame = CloseFrame {
            code,
            reason: Cow::Borrowed(reason),
        };

        if let Err(e) = self.sink.lock().await.send(Message::Close(Some(frame))).await {
            debug!("Failed to send close frame: {e}");
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, payload: String) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(Message::Text(payload))
            .await
            .map_err(|e| TransportError::Other(e.to_string()))
    }
}
