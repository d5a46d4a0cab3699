use crate::config::PipelineConfig;
use crate::decoder::decode_users_with;
use crate::error::RecordError;
use crate::record::User;
use crate::writer::write_user;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub decoded: usize,
    pub written: usize,
}

/// Decode `reader` and write every valid record to `writer`.
///
/// Stops at the first decode or write error. The sink is flushed on every
/// exit, so records written before the error stay in it.
pub async fn copy_users<R, W>(
    config: &PipelineConfig,
    token: &CancellationToken,
    reader: R,
    writer: &mut W,
) -> Result<CopySummary, RecordError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + ?Sized,
{
    copy_users_with(config, token, reader, writer, |_| {}).await
}

/// [`copy_users`] with a hook called for each decoded record before it is
/// written.
pub async fn copy_users_with<R, W, F>(
    config: &PipelineConfig,
    token: &CancellationToken,
    reader: R,
    writer: &mut W,
    on_record: F,
) -> Result<CopySummary, RecordError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(&User),
{
    let mut summary = CopySummary::default();
    let outcome = drain(config, token, reader, writer, on_record, &mut summary).await;

    match outcome {
        Ok(()) => {
            writer.flush().await?;
            info!(decoded = summary.decoded, written = summary.written, "copy finished");
            Ok(summary)
        }
        Err(err) => {
            // Keep the prefix; the decode or write error is what gets reported.
            if let Err(flush_err) = writer.flush().await {
                warn!(%flush_err, "flush after failed copy also failed");
            }
            warn!(%err, decoded = summary.decoded, written = summary.written, "copy stopped");
            Err(err)
        }
    }
}

async fn drain<R, W, F>(
    config: &PipelineConfig,
    token: &CancellationToken,
    reader: R,
    writer: &mut W,
    mut on_record: F,
    summary: &mut CopySummary,
) -> Result<(), RecordError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(&User),
{
    let mut results = decode_users_with(config, token.clone(), reader);

    while let Some(result) = results.recv().await {
        let user = result?;
        summary.decoded += 1;
        on_record(&user);

        write_user(token, writer, &user).await?;
        summary.written += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copies_valid_records() {
        let mut out = Vec::new();
        let summary = copy_users(
            &PipelineConfig::default(),
            &CancellationToken::new(),
            "# users\n  alice  :1\nbob:2\n".as_bytes(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(summary, CopySummary { decoded: 2, written: 2 });
        assert_eq!(out, b"alice:1\nbob:2\n");
    }

    #[tokio::test]
    async fn test_stops_at_first_error_and_keeps_prefix() {
        let mut out = Vec::new();
        let err = copy_users(
            &PipelineConfig::default(),
            &CancellationToken::new(),
            "alice:1\nbob:x\ncarol:3\n".as_bytes(),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RecordError::NonNumericId { .. }));
        assert_eq!(out, b"alice:1\n");
    }

    #[tokio::test]
    async fn test_buffered_sink_keeps_prefix_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("users_processed.txt");
        let mut sink = tokio::io::BufWriter::new(tokio::fs::File::create(&output).await.unwrap());

        let err = copy_users(
            &PipelineConfig::default(),
            &CancellationToken::new(),
            "alice:1\nbob:x\n".as_bytes(),
            &mut sink,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RecordError::NonNumericId { .. }));
        assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), "alice:1\n");
    }

    #[tokio::test]
    async fn test_hook_sees_each_record_before_error() {
        let mut seen = Vec::new();
        let err = copy_users_with(
            &PipelineConfig::default(),
            &CancellationToken::new(),
            "#c\nalice:1\nbob:2\nbroken\n".as_bytes(),
            &mut tokio::io::sink(),
            |user| seen.push(user.name.clone()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RecordError::Format { .. }));
        assert_eq!(seen, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_cancelled_copy_writes_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let mut out = Vec::new();
        let err = copy_users(&PipelineConfig::default(), &token, "alice:1\n".as_bytes(), &mut out)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_file_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("users.txt");
        let output = dir.path().join("users_processed.txt");
        tokio::fs::write(&input, "// list\nalice:1\nbob:2\n").await.unwrap();

        let source = tokio::fs::File::open(&input).await.unwrap();
        let mut sink = tokio::io::BufWriter::new(tokio::fs::File::create(&output).await.unwrap());
        let summary = copy_users(&PipelineConfig::default(), &CancellationToken::new(), source, &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(tokio::fs::read_to_string(&output).await.unwrap(), "alice:1\nbob:2\n");
    }
}
