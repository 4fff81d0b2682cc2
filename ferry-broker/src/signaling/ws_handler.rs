use crate::error::ProtocolError;
use crate::signaling::Broker;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::time::{Instant, interval_at, timeout};
use tracing::{debug, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(broker): State<Broker>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, broker))
}

/// Runs one signaling connection until either side gives up.
///
/// The write half drains the outbound queue and pings on a timer; the read
/// half dispatches frames and enforces the read deadline. Whichever ends
/// first, the connection leaves its room before this returns.
async fn handle_socket(socket: WebSocket, broker: Broker) {
    let (mut conn, mut outbound_rx) = broker.connect();
    let conn_id = conn.id();
    info!("New signaling connection: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let ping_interval = broker.config().ping_interval;
    let read_timeout = broker.config().read_timeout;
    let handle = conn.handle().clone();

    let mut send_task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);
        loop {
            tokio::select! {
                msg = outbound_rx.recv() => {
                    let Some(text) = msg else {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let broker = broker.clone();
        let handle = handle.clone();

        async move {
            loop {
                let next = tokio::select! {
                    _ = handle.closed() => {
                        warn!("Closing connection {} on request", conn_id);
                        break;
                    }
                    next = timeout(read_timeout, receiver.next()) => next,
                };

                let msg = match next {
                    Ok(Some(Ok(msg))) => msg,
                    Ok(Some(Err(e))) => {
                        debug!("Read error on {}: {}", conn_id, e);
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        info!("Connection {} missed its read deadline", conn_id);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => broker.dispatch_frame(&mut conn, text.as_str()).await,
                    Message::Binary(_) => conn.reply_error(&ProtocolError::BinaryFrame),
                    Message::Close(_) => break,
                    // Pings and pongs only refresh the deadline.
                    _ => {}
                }
            }

            broker.leave(&mut conn).await;
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            handle.close();
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("Signaling connection closed: {}", conn_id);
}
