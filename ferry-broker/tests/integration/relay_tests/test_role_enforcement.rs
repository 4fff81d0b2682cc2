use ferry_broker::BrokerConfig;
use ferry_core::{MessageType, SignalMessage};

use crate::integration::{init_tracing, start_broker};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_receiver_cannot_offer_and_sender_cannot_answer() {
    init_tracing();
    let (addr, _broker) = start_broker(BrokerConfig::default()).await;

    let mut sender = WsTestClient::create_room(addr, "r1").await.unwrap();
    let mut receiver = WsTestClient::join_room(addr, "r1").await.unwrap();
    sender.expect(MessageType::PeerJoined).await.unwrap();

    receiver
        .send(&SignalMessage::offer("r1", "f1", "x"))
        .await
        .unwrap();
    let err = receiver.expect(MessageType::Error).await.unwrap();
    assert_eq!(err.error, "only the sender may send offer");

    sender.send(&SignalMessage::answer("r1", "x")).await.unwrap();
    let err = sender.expect(MessageType::Error).await.unwrap();
    assert_eq!(err.error, "only the receiver may send answer");

    // Neither rejected message leaked to the other side.
    sender.expect_silence().await.unwrap();
    receiver.expect_silence().await.unwrap();
}
