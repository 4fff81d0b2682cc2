use crate::codec::{Destination, FeedStatus, ProgressReporter, ReceiveSession, TransferSummary};
use crate::error::TransferError;
use crate::transport::{DataChannel, EventQueue, TransportEvent};
use bytes::Bytes;
use ferry_core::{FileMetadata, TransferAck};
use std::path::Path;
use tracing::{debug, info, warn};

/// Receives one file from `channel` into `dest`.
///
/// Messages are fed through a [`ReceiveSession`] until the declared size is
/// reached, at which point the acknowledgment is sent back on the same
/// channel. A streaming transfer ends when the channel closes instead.
pub async fn receive_file<D: Destination + ?Sized>(
    channel: &dyn DataChannel,
    events: &mut EventQueue,
    dest: &mut D,
    progress: &mut ProgressReporter<'_>,
) -> Result<TransferSummary, TransferError> {
    let mut session = ReceiveSession::new();
    let mut started = false;

    let closed = loop {
        match events.next().await {
            Some(TransportEvent::Message(data)) => {
                let status = session.feed(&data, dest).await?;
                if !started && session.metadata().is_some() {
                    progress.start(session.metadata().and_then(FileMetadata::expected_len));
                    started = true;
                }
                progress.update(session.received());
                if status == FeedStatus::Complete {
                    break false;
                }
            }
            Some(TransportEvent::ChannelClosed) | None => break true,
            Some(TransportEvent::Connectivity(state)) if state.is_fatal() => {
                info!("Connection {} during transfer", state);
                break true;
            }
            Some(other) => debug!("Ignoring {:?} during transfer", other),
        }
    };

    if closed {
        session.close(dest).await?;
    }

    let elapsed = progress.elapsed();
    let bytes = session.received();
    info!("Received {} bytes in {:?}", bytes, elapsed);

    if !closed {
        send_ack(channel).await;
    }

    Ok(TransferSummary {
        file_name: session
            .metadata()
            .map(|m| m.file_name.clone())
            .unwrap_or_default(),
        bytes,
        elapsed,
        path: dest.path().map(Path::to_path_buf),
        acknowledged: false,
    })
}

async fn send_ack(channel: &dyn DataChannel) {
    let ack = match serde_json::to_vec(&TransferAck::file_received()) {
        Ok(ack) => ack,
        Err(e) => {
            warn!("Failed to encode acknowledgment: {}", e);
            return;
        }
    };
    match channel.send(Bytes::from(ack)).await {
        Ok(()) => info!("Acknowledgment sent"),
        Err(e) => warn!("Failed to send acknowledgment: {}", e),
    }
}
