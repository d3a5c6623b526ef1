//! Broadcast registry: the process-wide set of connection sinks.
//!
//! One lock guards registration, deregistration and every write. It is held
//! across fan-out writes, so broadcasts are serialized against each other and
//! each connection sees frames in the order `broadcast` was called. A slow
//! peer therefore delays delivery to everyone else.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, sync::Mutex};

use crate::pusher::{ConnectionId, FramePusher, PushError, Sink};

/// Sinks keyed by connection; dead sinks are pruned on the first failed write.
#[derive(Default)]
pub struct BroadcastRegistry {
    sinks: Mutex<HashMap<ConnectionId, Sink>>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sinks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sinks.lock().await.is_empty()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.sinks.lock().await.contains_key(&id)
    }
}

async fn write_to(sink: &mut Sink, frame: &[u8]) -> std::io::Result<()> {
    sink.write_all(frame).await?;
    sink.flush().await
}

#[async_trait]
impl FramePusher for BroadcastRegistry {
    async fn register(&self, id: ConnectionId, sink: Sink) {
        let mut sinks = self.sinks.lock().await;
        if sinks.insert(id, sink).is_some() {
            tracing::warn!("{} was already registered; replaced its sink", id);
        }
        tracing::debug!("{} registered ({} connected)", id, sinks.len());
    }

    async fn unregister(&self, id: ConnectionId) -> bool {
        let mut sinks = self.sinks.lock().await;
        let Some(mut sink) = sinks.remove(&id) else {
            return false;
        };
        if let Err(e) = sink.shutdown().await {
            tracing::debug!("Shutdown of {}'s sink failed: {}", id, e);
        }
        tracing::debug!("{} unregistered ({} connected)", id, sinks.len());
        true
    }

    async fn push_to(&self, id: ConnectionId, frame: &[u8]) -> Result<(), PushError> {
        let mut sinks = self.sinks.lock().await;
        let sink = sinks.get_mut(&id).ok_or(PushError::NotRegistered(id))?;

        if let Err(e) = write_to(sink, frame).await {
            sinks.remove(&id);
            return Err(e.into());
        }
        Ok(())
    }

    async fn broadcast(&self, frame: &[u8]) -> usize {
        let mut sinks = self.sinks.lock().await;
        tracing::debug!("[Broadcast] Sending to {} client(s)", sinks.len());

        let mut failed = Vec::new();
        for (id, sink) in sinks.iter_mut() {
            if let Err(e) = write_to(sink, frame).await {
                tracing::warn!("[Broadcast] Failed to send to {}: {}", id, e);
                failed.push(*id);
            }
        }
        for id in &failed {
            sinks.remove(id);
        }

        tracing::debug!("[Broadcast] Remaining clients: {}", sinks.len());
        sinks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, DuplexStream, duplex};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - register / unregister の冪等性
    // - push_to: 特定の接続だけへの送信
    // - broadcast: 全接続への送信と、書き込みに失敗した sink の遅延削除
    //
    // 【なぜこのテストが必要か】
    // - 切断済みのピアはハートビートではなく送信時にのみ検出される
    // - 1 つの sink の失敗が他の接続への配信を妨げてはならない
    // ========================================

    /// Sink whose every write fails, standing in for a dead peer
    struct BrokenSink;

    impl AsyncWrite for BrokenSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "peer went away",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn live_sink() -> (Sink, DuplexStream) {
        let (writer, reader) = duplex(1024);
        (Box::new(writer), reader)
    }

    async fn read_n<R: AsyncRead + Unpin>(reader: &mut R, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        reader.read_exact(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_broadcast_prunes_failing_sink_and_delivers_to_others() {
        // テスト項目: 3 つの sink のうち 1 つが失敗しても残り 2 つに届き、失敗した sink は削除される
        // given (前提条件):
        let registry = BroadcastRegistry::new();
        let (sink1, mut rx1) = live_sink();
        let (sink3, mut rx3) = live_sink();
        registry.register(ConnectionId::new(1), sink1).await;
        registry.register(ConnectionId::new(2), Box::new(BrokenSink)).await;
        registry.register(ConnectionId::new(3), sink3).await;

        // when (操作):
        let delivered = registry.broadcast(b"frame").await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert_eq!(read_n(&mut rx1, 5).await, b"frame");
        assert_eq!(read_n(&mut rx3, 5).await, b"frame");
        assert!(!registry.contains(ConnectionId::new(2)).await);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_broadcast_with_no_sinks() {
        // テスト項目: 登録された sink がなくてもエラーにならない
        // given (前提条件):
        let registry = BroadcastRegistry::new();

        // when (操作):
        let delivered = registry.broadcast(b"frame").await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_push_to_reaches_only_target() {
        // テスト項目: push_to は指定した接続だけに書き込む
        // given (前提条件):
        let registry = BroadcastRegistry::new();
        let (sink1, mut rx1) = live_sink();
        let (sink2, mut rx2) = live_sink();
        registry.register(ConnectionId::new(1), sink1).await;
        registry.register(ConnectionId::new(2), sink2).await;

        // when (操作):
        registry
            .push_to(ConnectionId::new(2), b"private")
            .await
            .unwrap();
        registry.broadcast(b"all").await;

        // then (期待する結果):
        assert_eq!(read_n(&mut rx2, 10).await, b"privateall");
        assert_eq!(read_n(&mut rx1, 3).await, b"all");
    }

    #[tokio::test]
    async fn test_push_to_unknown_connection() {
        // テスト項目: 未登録の接続への push_to は NotRegistered を返す
        // given (前提条件):
        let registry = BroadcastRegistry::new();

        // when (操作):
        let result = registry.push_to(ConnectionId::new(9), b"x").await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::NotRegistered(id)) if id.value() == 9));
    }

    #[tokio::test]
    async fn test_push_to_failing_sink_removes_it() {
        // テスト項目: push_to の書き込みに失敗した sink は削除される
        // given (前提条件):
        let registry = BroadcastRegistry::new();
        registry.register(ConnectionId::new(1), Box::new(BrokenSink)).await;

        // when (操作):
        let result = registry.push_to(ConnectionId::new(1), b"x").await;

        // then (期待する結果):
        assert!(matches!(result, Err(PushError::Io(_))));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent_and_closes_sink() {
        // テスト項目: unregister は 2 回呼んでも安全で、sink を閉じる
        // given (前提条件):
        let registry = BroadcastRegistry::new();
        let (sink, mut rx) = live_sink();
        registry.register(ConnectionId::new(1), sink).await;

        // when (操作):
        let first = registry.unregister(ConnectionId::new(1)).await;
        let second = registry.unregister(ConnectionId::new(1)).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        let mut rest = Vec::new();
        assert_eq!(rx.read_to_end(&mut rest).await.unwrap(), 0);
    }
}
