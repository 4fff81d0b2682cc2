use crate::codec::{FALLBACK_FILE_NAME, LENGTH_PREFIX_LEN, MAX_METADATA_LEN, ProgressReporter, TransferSummary};
use crate::config::ChunkSize;
use crate::error::TransferError;
use crate::transport::{DataChannel, EventQueue, TransportEvent};
use bytes::{BufMut, Bytes, BytesMut};
use ferry_core::{FileMetadata, TransferAck};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

/// Sending pauses while more than this many bytes are queued on the channel.
pub const HIGH_WATER_MARK: usize = 1024 * 1024;
/// ...and resumes once the queue has drained to this.
pub const LOW_WATER_MARK: usize = 256 * 1024;

/// Serialises `metadata` behind its 4-byte big-endian length.
pub fn encode_header(metadata: &FileMetadata) -> Result<Bytes, TransferError> {
    let json = serde_json::to_vec(metadata).map_err(TransferError::Metadata)?;
    let len = u32::try_from(json.len()).unwrap_or(u32::MAX);
    if len > MAX_METADATA_LEN {
        return Err(TransferError::MetadataLength(len));
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + json.len());
    buf.put_u32(len);
    buf.put_slice(&json);
    Ok(buf.freeze())
}

/// A local file opened for sending.
pub struct FileSource {
    file: File,
    path: PathBuf,
    metadata: FileMetadata,
    size: u64,
}

impl FileSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        let info = file.metadata().await?;
        if !info.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_owned());
        let size = info.len();
        Ok(Self {
            file,
            path: path.to_path_buf(),
            metadata: FileMetadata::new(name, size),
            size,
        })
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Streams `source` over `channel`.
///
/// The header goes out as two messages (prefix, body), the payload as
/// chunks of at most `chunk_size` bytes in file order. The returned summary
/// is never marked acknowledged; see [`wait_for_ack`]. Empty files are sent
/// with size 0 and return once the channel has drained.
pub async fn send_file(
    channel: &dyn DataChannel,
    source: FileSource,
    chunk_size: ChunkSize,
    progress: &mut ProgressReporter<'_>,
) -> Result<TransferSummary, TransferError> {
    let FileSource {
        file,
        path,
        metadata,
        size,
    } = source;

    let header = encode_header(&metadata)?;
    channel.send(header.slice(..LENGTH_PREFIX_LEN)).await?;
    channel.send(header.slice(LENGTH_PREFIX_LEN..)).await?;
    info!(
        "Sending {} ({} bytes) from {}",
        metadata.file_name,
        size,
        path.display()
    );

    progress.start(Some(size));
    let mut reader = file.take(size);
    let mut buf = vec![0u8; chunk_size.get()];
    let mut sent = 0u64;

    loop {
        let n = read_chunk(&mut reader, &mut buf).await?;
        if n == 0 {
            break;
        }
        if channel.buffered_amount().await > HIGH_WATER_MARK {
            debug!("Channel buffer above {} bytes, waiting", HIGH_WATER_MARK);
            channel.wait_buffered_below(LOW_WATER_MARK).await;
        }
        channel.send(Bytes::copy_from_slice(&buf[..n])).await?;
        sent += n as u64;
        progress.update(sent);
    }

    if sent < size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{} shrank while being sent", path.display()),
        )
        .into());
    }

    let elapsed = progress.elapsed();
    info!("Sent {} bytes in {:?}", sent, elapsed);

    if size == 0 {
        channel.wait_buffered_below(0).await;
    }

    Ok(TransferSummary {
        file_name: metadata.file_name,
        bytes: sent,
        elapsed,
        path: None,
        acknowledged: false,
    })
}

/// Fills `buf` as far as the reader allows. Returns 0 only at end of input.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Waits up to `limit` for the receiver's `file_received` message.
///
/// Returns false when the channel closes or the limit passes first; both are
/// logged, neither is an error since the bytes have already been sent.
pub async fn wait_for_ack(events: &mut EventQueue, limit: Duration) -> bool {
    let wait = async {
        while let Some(event) = events.next().await {
            match event {
                TransportEvent::Message(data) if TransferAck::matches(&data) => return true,
                TransportEvent::Message(data) => {
                    debug!("Ignoring {} unexpected bytes from the receiver", data.len())
                }
                TransportEvent::ChannelClosed => return false,
                TransportEvent::Connectivity(state) if state.is_fatal() => return false,
                _ => {}
            }
        }
        false
    };

    match tokio::time::timeout(limit, wait).await {
        Ok(true) => {
            info!("Receiver confirmed the transfer");
            true
        }
        Ok(false) => {
            warn!("Channel closed before the receiver confirmed; the file was sent");
            false
        }
        Err(_) => {
            warn!("No confirmation from the receiver within {:?}; the file was sent", limit);
            false
        }
    }
}
