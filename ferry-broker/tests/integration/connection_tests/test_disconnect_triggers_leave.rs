use ferry_broker::BrokerConfig;
use ferry_core::MessageType;

use crate::integration::{init_tracing, start_broker, wait_for_room_count};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_receiver_disconnect_sends_peer_left() {
    init_tracing();
    let (addr, broker) = start_broker(BrokerConfig::default()).await;

    let mut sender = WsTestClient::create_room(addr, "r1").await.unwrap();
    let receiver = WsTestClient::join_room(addr, "r1").await.unwrap();
    sender.expect(MessageType::PeerJoined).await.unwrap();

    receiver.close().await.unwrap();

    let left = sender.expect(MessageType::PeerLeft).await.unwrap();
    assert_eq!(left.room_id, "r1");
    assert_eq!(broker.room_count().await, 1);
}

#[tokio::test]
async fn test_lone_sender_disconnect_removes_room() {
    init_tracing();
    let (addr, broker) = start_broker(BrokerConfig::default()).await;

    let sender = WsTestClient::create_room(addr, "r1").await.unwrap();
    assert_eq!(broker.room_count().await, 1);

    drop(sender);
    assert!(wait_for_room_count(&broker, 0).await, "room was not removed");
}
