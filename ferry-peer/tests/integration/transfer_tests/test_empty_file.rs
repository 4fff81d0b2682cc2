use ferry_peer::{FileSource, PeerTransport};

use crate::integration::{init_tracing, receiver_into, sender_for, write_sample};
use crate::utils::{exchange_pair, loopback_pair};

#[tokio::test]
async fn test_empty_file_ends_when_sender_closes() {
    init_tracing();
    let src_dir = tempfile::tempdir().unwrap();
    let dst_dir = tempfile::tempdir().unwrap();
    let (path, _) = write_sample(src_dir.path(), "empty.txt", 0);

    let ((tx_transport, tx_events), (rx_transport, rx_events)) = loopback_pair();
    let (mut tx_exchange, mut rx_exchange) = exchange_pair("e0");

    let sender = sender_for(&path, "e0");
    let receiver = receiver_into(dst_dir.path(), "e0");
    let source = FileSource::open(&path).await.unwrap();

    let (sent, received) = tokio::join!(
        async {
            let sent = sender
                .send_over(source, &tx_transport, tx_events, &mut tx_exchange)
                .await;
            tx_transport.close().await.unwrap();
            sent
        },
        receiver.receive_over(&rx_transport, rx_events, &mut rx_exchange),
    );

    let sent = sent.unwrap();
    assert_eq!(sent.bytes, 0);
    assert!(!sent.acknowledged);
    assert_eq!(tx_transport.channel().sent_sizes().len(), 2);

    let received = received.unwrap();
    assert_eq!(received.bytes, 0);
    let out = received.path.unwrap();
    assert_eq!(std::fs::metadata(&out).unwrap().len(), 0);

    // Streaming transfers are never acknowledged.
    assert!(rx_transport.channel().sent_sizes().is_empty());
}
