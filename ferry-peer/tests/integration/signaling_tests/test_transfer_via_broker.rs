use ferry_peer::FileSource;

use super::{exchange_for, start_broker, wait_for_rooms};
use crate::integration::{init_tracing, receiver_into, sender_for, write_sample};
use crate::utils::loopback_pair;

#[tokio::test]
async fn test_file_moves_through_a_broker_room() {
    init_tracing();
    let (addr, broker) = start_broker().await;
    let src_dir = tempfile::tempdir().unwrap();
    let dst_dir = tempfile::tempdir().unwrap();
    let (path, data) = write_sample(src_dir.path(), "notes.txt", 70_000);

    let ((tx_transport, tx_events), (rx_transport, rx_events)) = loopback_pair();
    let sender = sender_for(&path, "a1b2c3d4e5f60718");
    let receiver = receiver_into(dst_dir.path(), "a1b2c3d4e5f60718");
    let source = FileSource::open(&path).await.unwrap();

    let mut tx_exchange = exchange_for(addr, sender.file_id())
        .await
        .with_file_id(sender.file_id());

    let (sent, received) = tokio::join!(
        sender.send_over(source, &tx_transport, tx_events, &mut tx_exchange),
        async {
            // Only join once the sender's room exists.
            wait_for_rooms(&broker, 1).await;
            let mut rx_exchange = exchange_for(addr, receiver.file_id()).await;
            receiver
                .receive_over(&rx_transport, rx_events, &mut rx_exchange)
                .await
        },
    );

    assert!(sent.unwrap().acknowledged);
    let out = received.unwrap().path.unwrap();
    assert_eq!(std::fs::read(out).unwrap(), data);

    // Both sides hang up on the broker after negotiating.
    wait_for_rooms(&broker, 0).await;
}
