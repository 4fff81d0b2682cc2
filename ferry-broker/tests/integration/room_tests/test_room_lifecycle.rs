use ferry_broker::BrokerConfig;

use crate::integration::{init_tracing, start_broker, wait_for_room_count};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_room_id_is_reusable_after_room_empties() {
    init_tracing();
    let (addr, broker) = start_broker(BrokerConfig::default()).await;

    let sender = WsTestClient::create_room(addr, "r1").await.unwrap();
    let receiver = WsTestClient::join_room(addr, "r1").await.unwrap();

    sender.close().await.unwrap();
    receiver.close().await.unwrap();
    assert!(wait_for_room_count(&broker, 0).await, "room was not removed");

    let _again = WsTestClient::create_room(addr, "r1").await.unwrap();
    assert_eq!(broker.room_count().await, 1);
}

#[tokio::test]
async fn test_independent_rooms_do_not_interfere() {
    init_tracing();
    let (addr, broker) = start_broker(BrokerConfig::default()).await;

    let mut a = WsTestClient::create_room(addr, "a").await.unwrap();
    let mut b = WsTestClient::create_room(addr, "b").await.unwrap();
    let _joiner = WsTestClient::join_room(addr, "a").await.unwrap();

    a.expect(ferry_core::MessageType::PeerJoined).await.unwrap();
    b.expect_silence().await.unwrap();
    assert_eq!(broker.room_count().await, 2);
}
