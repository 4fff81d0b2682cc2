use ferry_broker::BrokerConfig;
use std::time::Duration;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::{init_tracing, start_broker};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_pinged_connection_outlives_read_deadline() {
    init_tracing();
    let config = BrokerConfig {
        ping_interval: Duration::from_millis(100),
        read_timeout: Duration::from_millis(400),
        ..Default::default()
    };
    let (addr, broker) = start_broker(config).await;

    let mut client = WsTestClient::create_room(addr, "r1").await.unwrap();

    // Reading lets the client answer every ping with a pong, which is all
    // the broker hears for three read deadlines.
    let until = Instant::now() + Duration::from_millis(1200);
    let mut pings = 0;
    while Instant::now() < until {
        match client.next_frame().await.unwrap() {
            Message::Ping(_) => pings += 1,
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    assert!(pings >= 5, "only {pings} pings in 1.2s");
    assert_eq!(broker.room_count().await, 1);
}
