//! HTTP + websocket server for the piano overlay

use super::{DisplayEvent, DisplayHub};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Build the display router
pub fn build_router(hub: Arc<DisplayHub>) -> Router {
    Router::new()
        .route("/", get(serve_html))
        .route("/ws/piano", get(piano_ws))
        .route("/api/health", get(health_check))
        .with_state(hub)
}

/// GET / - Piano overlay page
async fn serve_html() -> impl IntoResponse {
    Html(include_str!("../../static/piano.html"))
}

/// GET /ws/piano - WebSocket stream of key events
async fn piano_ws(ws: WebSocketUpgrade, State(hub): State<Arc<DisplayHub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let (snapshot, rx) = hub.subscribe();
        handle_websocket(socket, snapshot, rx)
    })
}

async fn send_event(socket: &mut WebSocket, event: &DisplayEvent) -> bool {
    let msg = match serde_json::to_string(event) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to serialize display event: {}", e);
            return true;
        }
    };
    socket.send(Message::Text(msg)).await.is_ok()
}

/// Forward display events to one websocket client
async fn handle_websocket(
    mut socket: WebSocket,
    snapshot: DisplayEvent,
    mut rx: broadcast::Receiver<DisplayEvent>,
) {
    debug!("Display client connected");

    // Bring the client up to date with notes already held
    if !send_event(&mut socket, &snapshot).await {
        debug!("Display client disconnected");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            debug!("Display client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Display channel closed");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Display client lagged by {} messages", n);
                    }
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Display client closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Display websocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}

/// GET /api/health - Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Start the display server
pub async fn start_server(hub: Arc<DisplayHub>, addr: SocketAddr) -> Result<()> {
    let router = build_router(hub);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind display server on {}", addr))?;
    info!("Piano display available at http://{}", addr);

    axum::serve(listener, router)
        .await
        .context("Display server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures_util::StreamExt;
    use tokio_tungstenite::tungstenite;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_and_page() {
        let router = build_router(Arc::new(DisplayHub::new()));

        let response = router
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_page_applies_batched_updates_as_changes() {
        let router = build_router(Arc::new(DisplayHub::new()));

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();

        let handler_start = page.find(r#"case "KeyboardUpdate":"#).unwrap();
        let handler = &page[handler_start..];
        let handler = &handler[..handler.find("break;").unwrap()];
        assert!(handler.contains("keyChanges"));
        // Held keys are only cleared when a connection opens
        assert!(!handler.contains("classList.remove"));
        assert!(page.contains("ws.onopen"));
    }

    async fn next_json(
        ws: &mut tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    ) -> serde_json::Value {
        loop {
            match ws.next().await.unwrap().unwrap() {
                tungstenite::Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_websocket_receives_snapshot_and_events() {
        let hub = Arc::new(DisplayHub::new());
        hub.publish(DisplayEvent::KeyDown { key: 55 });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(hub.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/piano", addr))
            .await
            .unwrap();

        let snapshot = next_json(&mut ws).await;
        assert_eq!(
            snapshot,
            serde_json::json!({"type": "KeyboardUpdate", "keyChanges": [{"num": 55, "on": true}]})
        );

        hub.publish(DisplayEvent::KeyUp { key: 55 });
        hub.publish(DisplayEvent::KeyDown { key: 60 });

        assert_eq!(
            next_json(&mut ws).await,
            serde_json::json!({"type": "KeyUp", "key": 55})
        );
        assert_eq!(
            next_json(&mut ws).await,
            serde_json::json!({"type": "KeyDown", "key": 60})
        );
    }
}
