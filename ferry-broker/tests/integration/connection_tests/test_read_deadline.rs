use ferry_broker::BrokerConfig;
use std::time::Duration;

use crate::integration::{init_tracing, start_broker, wait_for_room_count};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_silent_connection_is_dropped_and_room_collected() {
    init_tracing();
    let config = BrokerConfig {
        read_timeout: Duration::from_millis(300),
        ping_interval: Duration::from_secs(30),
        ..Default::default()
    };
    let (addr, broker) = start_broker(config).await;

    // Created, then never touched again: no frames, no pongs.
    let _idle = WsTestClient::create_room(addr, "r1").await.unwrap();
    assert_eq!(broker.room_count().await, 1);

    assert!(
        wait_for_room_count(&broker, 0).await,
        "idle connection was not dropped"
    );
}
