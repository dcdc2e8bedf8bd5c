use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::ws::transport::WebSocketTransport;
use crate::AppState;
use axum::extract::ws::{close_code, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use events::Identity;
use futures::StreamExt;
use log::*;
use relay::ConnectionRegistry;
use std::sync::Arc;

/// Upgrades an authenticated request to the live event socket.
/// One socket per user; a second one is closed right after the upgrade.
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switching to the WebSocket protocol"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub(crate) async fn ws_handler(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    debug!("Upgrading to WebSocket for user {}", user.id);

    let identity = domain::user::identity(&user);
    let registry = Arc::clone(&app_state.connection_registry);

    ws.on_upgrade(move |socket| handle_socket(socket, identity, registry))
}

async fn handle_socket(socket: WebSocket, identity: Identity, registry: Arc<ConnectionRegistry>) {
    let (sink, mut stream) = socket.split();
    let transport = Arc::new(WebSocketTransport::new(sink));

    if !registry.register(identity.clone(), transport.clone()) {
        info!(
            "Closing second WebSocket for user {}, one is already open",
            identity.username
        );
        // The rejected socket was never registered, so there is nothing to unregister.
        transport
            .close(close_code::POLICY, "connection already open")
            .await;
        return;
    }

    // Client messages carry no meaning; reading only detects the disconnect.
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) => break,
            Ok(_) => trace!("Ignoring message from {}", identity.username),
            Err(e) => {
                debug!("WebSocket error for {}: {e}", identity.username);
                break;
            }
        }
    }

    registry.unregister(&identity);
    debug!("WebSocket closed for user {}", identity.username);
}
