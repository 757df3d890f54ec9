//! Signal channel over WebSocket.
//!
//! Each connection owns one subscription, opened before the upgrade
//! completes and released when the socket closes. Signals emitted while no
//! connection is open are not replayed.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};

use crate::api::dto::SignalFrame;
use crate::services::SignalSubscription;
use crate::state::AppState;

pub fn signal_routes() -> Router<AppState> {
    Router::new().route("/signals", get(signal_socket))
}

async fn signal_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let subscription = state.provider.subscribe();
    ws.on_upgrade(move |socket| stream_signals(socket, subscription))
}

async fn stream_signals(socket: WebSocket, mut subscription: SignalSubscription) {
    tracing::debug!("Signal subscriber connected");
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            signal = subscription.recv() => {
                let Ok(signal) = signal else { break };
                let text = match serde_json::to_string(&SignalFrame::Signal(signal)) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode signal frame");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    subscription.unsubscribe();
    tracing::debug!("Signal subscriber disconnected");
}
