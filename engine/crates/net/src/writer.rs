use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::channels::OutboundRx;
use crate::frame::encode_packet;

/// Spawn the task that drains a session's outbound channel onto the socket.
///
/// The task ends when every sender is dropped, when a packet marked
/// `close` has been written, or on the first write error. The write half
/// is shut down on the way out so the peer sees EOF.
pub fn spawn_writer<W>(mut writer: W, mut rx: OutboundRx) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            let bytes = match encode_packet(&out.packet) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "Writer: failed to encode packet");
                    continue;
                }
            };
            if let Err(e) = writer.write_all(&bytes).await {
                tracing::debug!(error = %e, "Writer: socket write failed");
                break;
            }
            if out.close {
                break;
            }
        }
        rx.close();
        let _ = writer.flush().await;
        let _ = writer.shutdown().await;
    })
}
