use bytes::Bytes;
use ferry_core::FileMetadata;
use ferry_peer::{
    EventQueue, FileDestination, LENGTH_PREFIX_LEN, Progress, ProgressReporter, SaveLocation,
    TransferError, TransportEvent, encode_header, receive_file,
};
use tokio::sync::{mpsc, watch};

use crate::integration::init_tracing;
use crate::utils::loopback_pair;

fn header(name: &str, size: u64) -> (Bytes, Bytes) {
    let header = encode_header(&FileMetadata::new(name, size)).unwrap();
    (
        header.slice(..LENGTH_PREFIX_LEN),
        header.slice(LENGTH_PREFIX_LEN..),
    )
}

#[tokio::test]
async fn test_short_transfer_is_reported_on_close() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let ((transport, _), _) = loopback_pair();
    let channel = transport.channel();

    let (tx, rx) = mpsc::channel(16);
    let (prefix, body) = header("part.bin", 100);
    tx.send(TransportEvent::Message(prefix)).await.unwrap();
    tx.send(TransportEvent::Message(body)).await.unwrap();
    tx.send(TransportEvent::Message(Bytes::from(vec![7u8; 40])))
        .await
        .unwrap();
    tx.send(TransportEvent::ChannelClosed).await.unwrap();

    let mut events = EventQueue::new(rx);
    let mut dest = FileDestination::new(SaveLocation::new(dir.path()));
    let (progress_tx, progress_rx) = watch::channel(Progress::default());
    let mut progress = ProgressReporter::new(&progress_tx);

    let err = receive_file(channel.as_ref(), &mut events, &mut dest, &mut progress)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::ChannelClosed {
            received: 40,
            expected: 100
        }
    ));
    assert_eq!(progress_rx.borrow().transferred, 40);
    assert!(channel.sent_sizes().is_empty());
}

#[tokio::test]
async fn test_close_before_metadata_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ((transport, _), _) = loopback_pair();
    let channel = transport.channel();

    let (tx, rx) = mpsc::channel(4);
    tx.send(TransportEvent::Message(Bytes::from_static(&[0, 0])))
        .await
        .unwrap();
    drop(tx);

    let mut events = EventQueue::new(rx);
    let mut dest = FileDestination::new(SaveLocation::new(dir.path()));
    let (progress_tx, _progress_rx) = watch::channel(Progress::default());
    let mut progress = ProgressReporter::new(&progress_tx);

    let err = receive_file(channel.as_ref(), &mut events, &mut dest, &mut progress)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::NoMetadata));
}

#[tokio::test]
async fn test_completed_transfer_sends_ack() {
    let dir = tempfile::tempdir().unwrap();
    let ((transport, _), _) = loopback_pair();
    let channel = transport.channel();

    let (tx, rx) = mpsc::channel(16);
    let (prefix, body) = header("whole.bin", 6);
    // The whole header and payload may arrive in a single message.
    let mut joined = prefix.to_vec();
    joined.extend_from_slice(&body);
    joined.extend_from_slice(b"abcdef");
    tx.send(TransportEvent::Message(Bytes::from(joined)))
        .await
        .unwrap();

    let mut events = EventQueue::new(rx);
    let mut dest = FileDestination::new(SaveLocation::new(dir.path()));
    let (progress_tx, _progress_rx) = watch::channel(Progress::default());
    let mut progress = ProgressReporter::new(&progress_tx);

    let summary = receive_file(channel.as_ref(), &mut events, &mut dest, &mut progress)
        .await
        .unwrap();
    assert_eq!(summary.file_name, "whole.bin");
    assert_eq!(summary.bytes, 6);
    assert_eq!(
        std::fs::read(dir.path().join("whole.bin")).unwrap(),
        b"abcdef"
    );
    assert_eq!(
        channel.sent_sizes(),
        vec![br#"{"type":"file_received"}"#.len()]
    );
}
