use std::time::Duration;

use hyper::body::Sender;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::archive::process::ArchiveProcess;
use crate::archive::relay::Relay;
use crate::archive::ArchiveRequest;
use crate::error::archive as ArchiveError;
use crate::error::Error;

/// One download: a resolved request, the archiver producing it and the body
/// it is streamed to. Both the process and the body are released when
/// [`Session::run`] returns, whatever the outcome.
pub struct Session {
    id: Uuid,
    request: ArchiveRequest,
    process: ArchiveProcess,
    body: Sender,
    relay: Relay,
    timeout: Duration,
    token: CancellationToken,
}

impl Session {
    pub fn new(
        request: ArchiveRequest,
        process: ArchiveProcess,
        body: Sender,
        relay: Relay,
        timeout: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            process,
            body,
            relay,
            timeout,
            token,
        }
    }

    /// Returns the number of bytes streamed to the client.
    pub async fn run(mut self) -> Result<u64, Error> {
        log::info!(
            "Session {} streaming {} (archiver {:?}) as {} in chunks of {} bytes",
            self.id,
            self.request.path().display(),
            self.process.id(),
            self.request.filename(),
            self.relay.chunk_size(),
        );

        let timeout = self.timeout;
        let outcome = match tokio::time::timeout(timeout, self.stream()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ArchiveError::Timeout),
        };

        match &outcome {
            Ok(_) => (),
            // Headers and part of the body are gone already, the body just stops.
            Err(ArchiveError::NonZeroExit(_)) => (),
            Err(_) => {
                self.body.abort();
                self.process.terminate().await;
            }
        }
        log::debug!("Session {} archiver ended as {:?}", self.id, self.process.state());
        outcome
    }

    async fn stream(&mut self) -> Result<u64, Error> {
        let streamed = self
            .relay
            .run(&mut self.process, &mut self.body, &self.token)
            .await?;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(ArchiveError::Cancelled),
            finished = self.process.finish() => finished?,
        };
        Ok(streamed)
    }

    /// Runs the session in its own task, logging how it ended.
    pub fn spawn(self) {
        let id = self.id;
        let identifier = self.request.identifier().to_owned();
        tokio::spawn(async move {
            match self.run().await {
                Ok(size) => log::info!(
                    "Session {} completed {} ({} bytes)",
                    id,
                    identifier,
                    size
                ),
                Err(err) if err.is_interruption() => {
                    log::warn!("Session {} interrupted {}: {}", id, identifier, err)
                }
                Err(err) => log::error!("Session {} failed {}: {}", id, identifier, err),
            }
        });
    }
}
