use actix_web::web::Bytes;
use actix_web::{get, web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_ws::{Message, ProtocolError};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Only forward events of this run.
    execution_id: Option<String>,
}

/// What to do with one read from the client side of the socket.
#[derive(Debug, PartialEq)]
enum ClientFrame {
    Pong(Bytes),
    Ignore,
    Disconnect,
}

impl ClientFrame {
    /// A closed stream, a protocol error and a close frame all end the session.
    fn from_read(read: Option<Result<Message, ProtocolError>>) -> Self {
        match read {
            Some(Ok(Message::Ping(bytes))) => ClientFrame::Pong(bytes),
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => ClientFrame::Disconnect,
            Some(Ok(_)) => ClientFrame::Ignore,
        }
    }
}

/// WebSocket endpoint for real-time run events
#[get("/api/events")]
pub async fn websocket_events(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<AppState>,
    filter: web::Query<EventFilter>,
) -> ActixResult<HttpResponse> {
    let (res, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;
    let only = filter.into_inner().execution_id;

    info!("WebSocket client connected");
    let mut events = data.runtime.subscribe_events();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if only.as_deref().is_some_and(|id| id != event.execution_id()) {
                                continue;
                            }
                            if let Ok(json) = serde_json::to_string(&event) {
                                if session.text(json).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("WebSocket client lagged, {} events dropped", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                read = msg_stream.recv() => {
                    match ClientFrame::from_read(read) {
                        ClientFrame::Pong(bytes) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        ClientFrame::Ignore => {}
                        ClientFrame::Disconnect => break,
                    }
                }
            }
        }

        info!("WebSocket client disconnected");
        let _ = session.close(None).await;
    });

    Ok(res)
}
