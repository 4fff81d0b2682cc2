use crate::error::TransferError;
use async_trait::async_trait;
use ferry_core::FileMetadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

/// Name used when the peer's file name has no usable final component.
pub const FALLBACK_FILE_NAME: &str = "received_file";

/// Where received payload bytes go.
#[async_trait]
pub trait Destination: Send {
    /// Called once, when the metadata has been decoded.
    async fn open(&mut self, metadata: &FileMetadata) -> Result<(), TransferError>;

    async fn write(&mut self, data: &[u8]) -> Result<(), TransferError>;

    /// Flushes and closes. Called once the payload is complete.
    async fn finish(&mut self) -> Result<(), TransferError>;

    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Reduces a peer-supplied name to its final path component.
pub fn safe_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => FALLBACK_FILE_NAME.to_owned(),
        name => name.to_owned(),
    }
}

/// A user-chosen save path, resolved against the incoming file's name.
///
/// Empty or `.` means the current directory. An existing directory receives
/// the file under its own name; a path that does not exist yet is created
/// as a directory; an existing file is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveLocation {
    base: PathBuf,
}

impl SaveLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { base: path.into() }
    }

    pub fn current_dir() -> Self {
        Self::new(".")
    }

    pub async fn resolve(&self, file_name: &str) -> io::Result<PathBuf> {
        let name = safe_file_name(file_name);
        if self.base.as_os_str().is_empty() || self.base == Path::new(".") {
            return Ok(PathBuf::from(name));
        }

        match fs::metadata(&self.base).await {
            Ok(meta) if meta.is_dir() => Ok(self.base.join(name)),
            Ok(_) => Ok(self.base.clone()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.base).await?;
                Ok(self.base.join(name))
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for SaveLocation {
    fn default() -> Self {
        Self::current_dir()
    }
}

/// Writes the payload to a file chosen by a [`SaveLocation`].
pub struct FileDestination {
    location: SaveLocation,
    file: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl FileDestination {
    pub fn new(location: SaveLocation) -> Self {
        Self {
            location,
            file: None,
            path: None,
        }
    }
}

#[async_trait]
impl Destination for FileDestination {
    async fn open(&mut self, metadata: &FileMetadata) -> Result<(), TransferError> {
        let path = self.location.resolve(&metadata.file_name).await?;
        let file = File::create(&path).await?;
        info!("Saving {} to {}", metadata.file_name, path.display());
        self.file = Some(BufWriter::new(file));
        self.path = Some(path);
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), TransferError> {
        let file = self.file.as_mut().ok_or(TransferError::ProtocolViolation(
            "payload arrived before the destination was opened",
        ))?;
        file.write_all(data).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), TransferError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.into_inner().sync_all().await?;
        }
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
