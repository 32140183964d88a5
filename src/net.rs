//! Hub connection manager for native clients.
//!
//! DESIGN
//! ======
//! One `HubClient` value owns one live websocket. It is created by
//! `connect` (or `connect_and_join`), passed around explicitly, and torn
//! down by `disconnect` — there is no ambient shared socket anywhere.
//! A dropped connection simply loses whatever was in flight; the engine
//! accepts eventual, not guaranteed, convergence.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::warn;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::SessionUser;

#[derive(Debug, thiserror::Error)]
pub enum HubClientError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket send failed: {0}")]
    Send(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("message encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An owned, live connection to the collaboration hub.
pub struct HubClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl HubClient {
    /// Open a websocket to the hub.
    ///
    /// # Errors
    ///
    /// Returns [`HubClientError::Connect`] when the handshake fails.
    pub async fn connect(url: &str) -> Result<Self, HubClientError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| HubClientError::Connect(Box::new(e)))?;
        Ok(Self { stream })
    }

    /// Connect and immediately announce the user to a board room.
    ///
    /// # Errors
    ///
    /// Returns a connect or send error; either way no connection value
    /// escapes, so there is nothing half-joined to clean up.
    pub async fn connect_and_join(
        url: &str,
        board_id: &str,
        user: &SessionUser,
    ) -> Result<Self, HubClientError> {
        let mut client = Self::connect(url).await?;
        client
            .send(&ClientMessage::JoinBoard {
                board_id: board_id.to_string(),
                user_id: user.user_id.clone(),
                name: user.name.clone(),
            })
            .await?;
        Ok(client)
    }

    /// Send one message to the hub.
    ///
    /// # Errors
    ///
    /// Returns [`HubClientError::Send`] when the socket rejects the frame.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), HubClientError> {
        let json = serde_json::to_string(message)?;
        self.stream
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| HubClientError::Send(Box::new(e)))
    }

    /// Receive the next hub message. `None` when the connection is gone.
    /// Frames that do not decode are skipped, not fatal.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        loop {
            let msg = self.stream.next().await?.ok()?;
            match msg {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(message) => return Some(message),
                    Err(e) => {
                        warn!(error = %e, "skipping undecodable hub frame");
                    }
                },
                Message::Close(_) => return None,
                _ => {}
            }
        }
    }

    /// Close the connection. Consumes the client — the explicit end of the
    /// lifecycle that began with `connect`.
    pub async fn disconnect(mut self) {
        let _ = self.stream.close(None).await;
    }
}
