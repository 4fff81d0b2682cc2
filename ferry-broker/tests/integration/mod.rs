pub mod connection_tests;
pub mod relay_tests;

use ferry_broker::{Broker, BrokerConfig, serve_on};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Starts a broker on an ephemeral loopback port.
pub async fn start_broker(config: BrokerConfig) -> (SocketAddr, Broker) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let broker = Broker::new(config);

    tokio::spawn(serve_on(listener, broker.clone()));

    (addr, broker)
}

/// Polls until the broker holds `expected` rooms or the wait runs out.
pub async fn wait_for_room_count(broker: &Broker, expected: usize) -> bool {
    for _ in 0..100 {
        if broker.room_count().await == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
