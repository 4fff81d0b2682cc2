mod test_transfer_via_broker;

use ferry_broker::{Broker, BrokerConfig, serve_on};
use ferry_peer::{BrokerExchange, SignalingClient};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Starts a broker on an ephemeral local port.
pub async fn start_broker() -> (SocketAddr, Broker) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let broker = Broker::new(BrokerConfig::default());
    tokio::spawn(serve_on(listener, broker.clone()));
    (addr, broker)
}

pub async fn exchange_for(addr: SocketAddr, room_id: &str) -> BrokerExchange {
    let client = SignalingClient::connect(&format!("ws://{addr}/ws"))
        .await
        .unwrap();
    BrokerExchange::new(client, room_id)
}

/// Polls until the broker holds `count` rooms.
pub async fn wait_for_rooms(broker: &Broker, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while broker.room_count().await != count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("broker never reached the expected room count");
}
