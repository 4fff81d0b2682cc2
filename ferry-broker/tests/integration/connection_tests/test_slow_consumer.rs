use ferry_broker::BrokerConfig;
use ferry_core::{MessageType, SignalMessage};
use std::time::Duration;

use crate::integration::{init_tracing, start_broker, wait_for_room_count};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_stalled_receiver_is_dropped_and_sender_notified() {
    init_tracing();
    let config = BrokerConfig {
        outbound_capacity: 4,
        ..Default::default()
    };
    let (addr, broker) = start_broker(config).await;

    let mut sender = WsTestClient::create_room(addr, "r1").await.unwrap();
    // Joins, then never reads again.
    let stalled = WsTestClient::join_room(addr, "r1").await.unwrap();
    sender.expect(MessageType::PeerJoined).await.unwrap();
    let room = broker.registry().get_room("r1").await.unwrap();

    // Large offers back up the stalled socket until its queue overflows.
    let sdp = "x".repeat(512 * 1024);
    for _ in 0..400 {
        sender
            .send(&SignalMessage::offer("r1", "f1", sdp.as_str()))
            .await
            .unwrap();
        if room.len().await == 1 {
            break;
        }
    }

    let mut dropped = false;
    for _ in 0..100 {
        if room.len().await == 1 {
            dropped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(dropped, "stalled receiver was never dropped");

    let left = sender.expect(MessageType::PeerLeft).await.unwrap();
    assert_eq!(left.room_id, "r1");
    assert_eq!(broker.room_count().await, 1);

    drop(stalled);
    sender.close().await.unwrap();
    assert!(
        wait_for_room_count(&broker, 0).await,
        "emptied room was not removed"
    );
}
