use ferry_broker::BrokerConfig;
use ferry_core::{MessageType, SignalMessage};

use crate::integration::{init_tracing, start_broker};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_receiver_join_notifies_sender_once() {
    init_tracing();
    let (addr, broker) = start_broker(BrokerConfig::default()).await;

    let mut sender = WsTestClient::create_room(addr, "r1").await.unwrap();
    let mut receiver = WsTestClient::join_room(addr, "r1").await.unwrap();

    let joined = sender.expect(MessageType::PeerJoined).await.unwrap();
    assert_eq!(joined.room_id, "r1");
    sender.expect_silence().await.unwrap();
    receiver.expect_silence().await.unwrap();

    assert_eq!(broker.registry().room_ids().await, vec!["r1".to_string()]);
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    init_tracing();
    let (addr, broker) = start_broker(BrokerConfig::default()).await;

    let mut client = WsTestClient::connect(addr).await.unwrap();
    client.send(&SignalMessage::join_room("ghost")).await.unwrap();

    let reply = client.expect(MessageType::Error).await.unwrap();
    assert_eq!(reply.error, "room ghost does not exist");
    assert_eq!(broker.room_count().await, 0);
}

#[tokio::test]
async fn test_second_create_with_same_id_fails() {
    init_tracing();
    let (addr, _broker) = start_broker(BrokerConfig::default()).await;

    let _owner = WsTestClient::create_room(addr, "r1").await.unwrap();

    let mut intruder = WsTestClient::connect(addr).await.unwrap();
    intruder.send(&SignalMessage::create_room("r1")).await.unwrap();
    let reply = intruder.expect(MessageType::Error).await.unwrap();
    assert_eq!(reply.error, "room r1 already exists");
}
