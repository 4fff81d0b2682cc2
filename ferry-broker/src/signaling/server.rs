use crate::config::BrokerConfig;
use crate::signaling::{Broker, ws_handler};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(broker: Broker) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/", get(banner))
        .with_state(broker)
}

async fn banner() -> &'static str {
    "ferry signaling server is running\n"
}

/// Binds the configured address and serves until the process stops.
pub async fn serve(config: BrokerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.socket_addr()).await?;
    serve_on(listener, Broker::new(config)).await
}

pub async fn serve_on(listener: TcpListener, broker: Broker) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("Signaling server listening on ws://{}/ws", addr);
    axum::serve(listener, router(broker)).await
}
