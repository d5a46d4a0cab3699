use crate::error::RecordError;
use crate::record::User;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Append `user` to `writer` as `name:id\n`.
///
/// The record and the terminator are two separate writes; if the second one
/// fails the sink keeps the first. Buffered sinks are flushed by the caller.
pub async fn write_user<W>(
    token: &CancellationToken,
    writer: &mut W,
    user: &User,
) -> Result<(), RecordError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if token.is_cancelled() {
        return Err(RecordError::Cancelled);
    }

    writer.write_all(user.to_string().as_bytes()).await?;
    writer.write_all(b"\n").await?;

    Ok(())
}
