//! Frame I/O over byte streams.
//!
//! A frame is read field by field (key, length, value), each with
//! [`read_exact`], so partial socket reads are stitched together and an
//! orderly close is reported as `None` rather than as an error.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::klv::{self, Frame, FrameError, HEADER_LEN, KEY_LEN};

/// Errors raised while reading or writing frames on a stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// Declared value length above the configured limit
    #[error("frame value of {declared} bytes exceeds the {limit} byte limit")]
    ValueTooLarge { declared: usize, limit: usize },
}

/// Read exactly `n` bytes from `reader`.
///
/// Loops across partial reads. Returns `Ok(None)` if the stream closes before
/// `n` bytes arrive; never returns a short buffer.
pub async fn read_exact<R>(reader: &mut R, n: usize) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; n];
    let mut filled = 0;

    while filled < n {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            return Ok(None);
        }
        filled += read;
    }

    Ok(Some(buf))
}

/// Read one frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends at any point of the frame, including
/// mid-value. A declared length above `max_value_len` fails before the value
/// buffer is allocated.
pub async fn read_frame<R>(reader: &mut R, max_value_len: usize) -> Result<Option<Frame>, StreamError>
where
    R: AsyncRead + Unpin,
{
    let Some(key_field) = read_exact(reader, KEY_LEN).await? else {
        return Ok(None);
    };
    let Some(length_field) = read_exact(reader, HEADER_LEN - KEY_LEN).await? else {
        return Ok(None);
    };

    let mut header = key_field;
    header.extend_from_slice(&length_field);
    // An empty-valued frame decodes from the header alone.
    let declared = match klv::decode(&header, 0) {
        Ok((frame, _)) => return Ok(Some(frame)),
        Err(FrameError::TruncatedValue { declared, .. }) => declared,
        Err(e) => return Err(e.into()),
    };

    if declared > max_value_len {
        return Err(StreamError::ValueTooLarge {
            declared,
            limit: max_value_len,
        });
    }

    let Some(value) = read_exact(reader, declared).await? else {
        return Ok(None);
    };
    header.extend_from_slice(&value);

    let (frame, _) = klv::decode(&header, 0)?;
    Ok(Some(frame))
}

/// Encode `frame` and write it to `writer`, flushing afterwards.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), StreamError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.encode()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_read_exact_stitches_partial_reads() {
        // テスト項目: 複数回に分かれて届いたバイト列を 1 つのバッファにまとめて返す
        // given (前提条件):
        let (mut client, mut server) = duplex(64);
        let writer = tokio::spawn(async move {
            client.write_all(b"ab").await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(b"cd").await.unwrap();
            tokio::task::yield_now().await;
            client.write_all(b"ef").await.unwrap();
        });

        // when (操作):
        let result = read_exact(&mut server, 6).await.unwrap();
        writer.await.unwrap();

        // then (期待する結果):
        assert_eq!(result, Some(b"abcdef".to_vec()));
    }

    #[tokio::test]
    async fn test_read_exact_reports_end_of_stream_instead_of_short_buffer() {
        // テスト項目: n バイト揃う前にストリームが閉じたら None を返す（短いバッファは返さない）
        // given (前提条件):
        let (mut client, mut server) = duplex(64);
        client.write_all(b"abc").await.unwrap();
        drop(client);

        // when (操作):
        let result = read_exact(&mut server, 8).await.unwrap();

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_read_exact_zero_bytes_returns_empty_buffer() {
        // テスト項目: 0 バイトの読み込みは即座に空のバッファを返す
        // given (前提条件):
        let (_client, mut server) = duplex(8);

        // when (操作):
        let result = read_exact(&mut server, 0).await.unwrap();

        // then (期待する結果):
        assert_eq!(result, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_write_then_read_frame() {
        // テスト項目: write_frame で書いたフレームを read_frame で読み戻せる
        // given (前提条件):
        let (mut client, mut server) = duplex(256);
        let sent = Frame::new("MSG", "hello there");

        // when (操作):
        write_frame(&mut client, &sent).await.unwrap();
        write_frame(&mut client, &Frame::new("TIME", "")).await.unwrap();
        let first = read_frame(&mut server, 1024).await.unwrap();
        let second = read_frame(&mut server, 1024).await.unwrap();

        // then (期待する結果):
        assert_eq!(first, Some(sent));
        assert_eq!(second, Some(Frame::new("TIME", "")));
    }

    #[tokio::test]
    async fn test_read_frame_stream_closed_mid_value_is_end_of_stream() {
        // テスト項目: 値の途中でストリームが閉じた場合は EndOfStream（None）として扱う
        // given (前提条件):
        let (mut client, mut server) = duplex(256);
        let bytes = klv::encode("MSG", b"hello").unwrap();
        client.write_all(&bytes[..10]).await.unwrap();
        drop(client);

        // when (操作):
        let result = read_frame(&mut server, 1024).await.unwrap();

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_value() {
        // テスト項目: 上限を超える長さが宣言されたフレームは ValueTooLarge になる
        // given (前提条件):
        let (mut client, mut server) = duplex(256);
        let mut header = b"MSG\0".to_vec();
        header.extend_from_slice(&u32::MAX.to_be_bytes());
        client.write_all(&header).await.unwrap();

        // when (操作):
        let result = read_frame(&mut server, 1024).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(StreamError::ValueTooLarge { limit: 1024, .. })
        ));
    }
}
