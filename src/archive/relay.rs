use async_trait::async_trait;
use hyper::body::{Bytes, Sender};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::error::archive as ArchiveError;
use crate::error::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 800 * 1024;

/// Destination of relayed chunks. `send` resolves once the chunk was accepted.
#[async_trait]
pub trait ChunkSink {
    async fn send(&mut self, chunk: Bytes) -> Result<(), Error>;
}

#[async_trait]
impl ChunkSink for Sender {
    async fn send(&mut self, chunk: Bytes) -> Result<(), Error> {
        self.send_data(chunk)
            .await
            .map_err(|_| ArchiveError::StreamWriteFailure)
    }
}

/// Moves bytes from a reader to a sink, one chunk at a time.
///
/// A chunk is only read once the previous one was accepted by the sink, so a
/// slow client slows down the reads instead of growing a buffer.
#[derive(Copy, Clone, Debug)]
pub struct Relay {
    chunk_size: usize,
}

impl Relay {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of bytes relayed once the reader reached its end.
    pub async fn run<R, S>(
        &self,
        reader: &mut R,
        sink: &mut S,
        token: &CancellationToken,
    ) -> Result<u64, Error>
    where
        R: AsyncRead + Unpin + Send,
        S: ChunkSink + Send,
    {
        let mut buffer = vec![0; self.chunk_size];
        let mut relayed = 0;
        loop {
            let read = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ArchiveError::Cancelled),
                read = reader.read(&mut buffer) => read.map_err(ArchiveError::OutputRead)?,
            };
            if read == 0 {
                return Ok(relayed);
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ArchiveError::Cancelled),
                sent = sink.send(Bytes::copy_from_slice(&buffer[..read])) => sent?,
            }
            relayed += read as u64;

            tokio::task::yield_now().await;
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
