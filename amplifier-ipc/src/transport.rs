//! Request payload delivery over worker stdin

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::IpcError;

/// Serialize `payload` as one JSON document, write it and close the pipe.
///
/// Workers read stdin to EOF before doing anything, so the writer is always
/// shut down. A worker that exits without reading gives a broken pipe, which
/// is reported as [`IpcError::ConnectionClosed`]; the caller learns the real
/// outcome from the exit status.
pub async fn write_payload<W, T>(mut stdin: W, payload: &T) -> Result<usize, IpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_vec(payload)?;

    stdin.write_all(&json).await?;
    stdin.flush().await?;
    stdin.shutdown().await?;

    tracing::debug!(bytes = json.len(), "Wrote request payload to worker stdin");
    Ok(json.len())
}
