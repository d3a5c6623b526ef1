//! Connection handler: the per-connection read/dispatch/respond loop.

use std::{net::SocketAddr, sync::Arc};

use klvchat_shared::{klv::hex_dump, read_frame, time::Clock};
use tokio::io::AsyncRead;

use crate::{
    error::HandlerError,
    history::HistoryBuffer,
    pusher::FramePusher,
    session::{Delivery, Outcome, Session},
};

/// Drives one connection until the peer disconnects, sends `QUIT`, or an
/// I/O or framing error occurs.
///
/// The connection's sink must already be registered with the pusher; the
/// handler deregisters it on every exit path.
pub struct ConnectionHandler<R> {
    reader: R,
    peer: SocketAddr,
    session: Session,
    pusher: Arc<dyn FramePusher>,
    history: Arc<HistoryBuffer>,
    clock: Arc<dyn Clock>,
    max_frame_len: usize,
}

impl<R> ConnectionHandler<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(
        reader: R,
        peer: SocketAddr,
        session: Session,
        pusher: Arc<dyn FramePusher>,
        history: Arc<HistoryBuffer>,
        clock: Arc<dyn Clock>,
        max_frame_len: usize,
    ) -> Self {
        Self {
            reader,
            peer,
            session,
            pusher,
            history,
            clock,
            max_frame_len,
        }
    }

    /// Serve the connection to completion, then deregister its sink.
    pub async fn run(mut self) {
        let id = self.session.id();

        match self.serve().await {
            Ok(()) => tracing::debug!("[{}] Connection loop finished", id),
            Err(e) => tracing::warn!("[{}] Connection from {} terminated: {}", id, self.peer, e),
        }

        self.pusher.unregister(id).await;
        tracing::info!("[{}] Disconnected ({})", id, self.session.name());
    }

    async fn serve(&mut self) -> Result<(), HandlerError> {
        let id = self.session.id();

        loop {
            let Some(frame) = read_frame(&mut self.reader, self.max_frame_len).await? else {
                tracing::debug!("[{}] Stream closed by peer", id);
                return Ok(());
            };
            tracing::debug!("[{}] Received: {}", id, frame);

            let outcome = self
                .session
                .dispatch(&frame, &self.history, self.clock.as_ref())
                .await;
            self.respond(&outcome).await?;

            if outcome.closes {
                return Ok(());
            }
        }
    }

    /// Send the `RESP` status privately, then deliver the reply.
    ///
    /// Only a successful reply is broadcast or recorded in the history; a
    /// rejected one goes back to the requester alone.
    async fn respond(&self, outcome: &Outcome) -> Result<(), HandlerError> {
        let id = self.session.id();

        self.pusher
            .push_to(id, &outcome.status.to_frame().encode()?)
            .await?;
        tracing::debug!("[{}] Sent RESP: {}", id, outcome.status);

        let reply = outcome.reply.encode()?;
        tracing::debug!("[{}] Raw bytes sent: {}", id, hex_dump(&reply));

        if !outcome.status.is_success() {
            self.pusher.push_to(id, &reply).await?;
            return Ok(());
        }

        if let Some(entry) = &outcome.history_entry {
            self.history.append(entry.clone()).await;
        }

        match outcome.delivery {
            Delivery::Broadcast => {
                let delivered = self.pusher.broadcast(&reply).await;
                tracing::debug!(
                    "[{}] Broadcast {} to {} client(s)",
                    id,
                    outcome.reply.key,
                    delivered
                );
            }
            Delivery::Private => self.pusher.push_to(id, &reply).await?,
        }

        Ok(())
    }
}
