//! TCP connection to the chat server.

use std::sync::Arc;

use klvchat_shared::{Frame, read_frame, write_frame};
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::Mutex,
    task::JoinHandle,
};

use crate::error::ClientError;

/// Largest value the 4-byte length field can declare.
///
/// Server replies may be longer than anything the server accepts as input (a
/// `MSG` gains a name prefix, a `READ` joins the whole history), so the client
/// takes whatever the wire format allows.
pub const MAX_FRAME_LEN: usize = u32::MAX as usize;

/// Write half shared between the sender and the listener task; `None` once
/// the connection has been closed.
type SharedWriter = Arc<Mutex<Option<OwnedWriteHalf>>>;

/// Connected chat client.
///
/// A background task reads frames from the server and hands each one to the
/// callback given to [`ChatClient::connect`], in arrival order.
pub struct ChatClient {
    sender: ClientSender,
    listener: JoinHandle<()>,
}

impl ChatClient {
    /// Connect to `host:port` and start delivering incoming frames to `on_frame`.
    pub async fn connect<F>(host: &str, port: u16, on_frame: F) -> Result<Self, ClientError>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        Self::connect_with_limit(host, port, MAX_FRAME_LEN, on_frame).await
    }

    /// Like [`ChatClient::connect`], but refuse incoming values longer than
    /// `max_frame_len`. Such a frame ends the connection.
    pub async fn connect_with_limit<F>(
        host: &str,
        port: u16,
        max_frame_len: usize,
        on_frame: F,
    ) -> Result<Self, ClientError>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.clone(),
                source,
            })?;
        tracing::info!("Connected to {}", addr);

        let (reader, writer) = stream.into_split();
        let writer: SharedWriter = Arc::new(Mutex::new(Some(writer)));
        let listener = tokio::spawn(listen(reader, writer.clone(), max_frame_len, on_frame));

        Ok(Self {
            sender: ClientSender { writer },
            listener,
        })
    }

    /// Encode and send one frame.
    pub async fn send(&mut self, key: &str, text: &str) -> Result<(), ClientError> {
        self.sender.send(key, text).await
    }

    /// Whether the server side is still open
    pub fn is_connected(&self) -> bool {
        !self.listener.is_finished()
    }

    /// Split into the sending half and the listener task, which completes once
    /// the connection ends.
    pub fn into_split(self) -> (ClientSender, JoinHandle<()>) {
        (self.sender, self.listener)
    }
}

/// Sending half of a [`ChatClient`]
pub struct ClientSender {
    writer: SharedWriter,
}

impl ClientSender {
    /// Encode and send one frame.
    pub async fn send(&mut self, key: &str, text: &str) -> Result<(), ClientError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ClientError::Disconnected)?;

        let frame = Frame::new(key, text);
        tracing::debug!("Sending: {}", frame);
        write_frame(writer, &frame).await?;
        Ok(())
    }

    /// Close the sending direction of the connection.
    pub async fn close(self) {
        let Some(mut writer) = self.writer.lock().await.take() else {
            return;
        };
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("Failed to shut down connection: {}", e);
        }
    }
}

async fn listen<F>(
    mut reader: OwnedReadHalf,
    writer: SharedWriter,
    max_frame_len: usize,
    mut on_frame: F,
) where
    F: FnMut(Frame),
{
    loop {
        match read_frame(&mut reader, max_frame_len).await {
            Ok(Some(frame)) => {
                tracing::debug!("Received: {}", frame);
                on_frame(frame);
            }
            Ok(None) => {
                tracing::info!("Server closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!("Read error: {}", e);
                // Nobody reads this socket any more: drop both halves so the
                // server's pending writes fail instead of blocking.
                writer.lock().await.take();
                drop(reader);
                break;
            }
        }
    }
}
