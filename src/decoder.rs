use crate::config::PipelineConfig;
use crate::error::RecordError;
use crate::record::{parse_user, User};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One item of the decode stream. An `Err` is always the last item.
pub type DecodeResult = Result<User, RecordError>;

// =============================================================================
// Per-line state machine
// =============================================================================

/// Outcome of feeding a single source line to the decoder.
#[derive(Debug)]
pub(crate) enum LineStep {
    /// Comment line, nothing to emit.
    Skip,
    /// Emit the record and keep reading.
    Emit(User),
    /// Emit the error and stop reading.
    Stop(RecordError),
}

/// Turn one raw `\n`-delimited segment into text.
///
/// A trailing `\r` is dropped. Invalid UTF-8 is replaced rather than
/// reported, so only a failing source yields `RecordError::Io`.
pub(crate) fn line_from_bytes(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Role: shared by the async and the blocking decoder
pub(crate) fn decode_line(config: &PipelineConfig, token: &CancellationToken, line: &str) -> LineStep {
    if token.is_cancelled() {
        debug!("cancellation observed, stopping decode");
        return LineStep::Stop(RecordError::Cancelled);
    }

    debug!(line, "processing line");

    if config.is_comment(line) {
        debug!(line, "skipping comment line");
        return LineStep::Skip;
    }

    match parse_user(line) {
        Ok(user) => LineStep::Emit(user),
        Err(err) => LineStep::Stop(err),
    }
}

// =============================================================================
// Async decoder
// =============================================================================

/// Decode `name:id` lines from `reader` with the default configuration.
///
/// Spawns the producer on the current tokio runtime and returns the
/// consumer side of a channel with capacity 1. The channel closes when the
/// source is exhausted, after the first error, or after cancellation.
pub fn decode_users<R>(token: CancellationToken, reader: R) -> mpsc::Receiver<DecodeResult>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    decode_users_with(&PipelineConfig::default(), token, reader)
}

/// Same as [`decode_users`] with explicit channel capacity and comment markers.
pub fn decode_users_with<R>(
    config: &PipelineConfig,
    token: CancellationToken,
    reader: R,
) -> mpsc::Receiver<DecodeResult>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let config = config.clone();

    // The sender is moved into the task, so every return closes the channel.
    tokio::spawn(async move {
        produce(config, token, reader, tx).await;
    });

    rx
}

/// Stream view over [`decode_users_with`].
pub fn decode_user_stream<R>(
    config: &PipelineConfig,
    token: CancellationToken,
    reader: R,
) -> ReceiverStream<DecodeResult>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    ReceiverStream::new(decode_users_with(config, token, reader))
}

async fn produce<R>(
    config: PipelineConfig,
    token: CancellationToken,
    reader: R,
    tx: mpsc::Sender<DecodeResult>,
) where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');

    loop {
        let line = match segments.next_segment().await {
            Ok(Some(bytes)) => line_from_bytes(bytes),
            Ok(None) => {
                debug!("source exhausted");
                return;
            }
            Err(err) => {
                let _ = tx.send(Err(err.into())).await;
                return;
            }
        };

        let (item, last) = match decode_line(&config, &token, &line) {
            LineStep::Skip => continue,
            LineStep::Emit(user) => (Ok(user), false),
            LineStep::Stop(err) => (Err(err), true),
        };

        if tx.send(item).await.is_err() {
            debug!("receiver dropped, stopping decode");
            return;
        }
        if last {
            return;
        }
    }
}
