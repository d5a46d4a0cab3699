//! Thread-based decoder and writer for `std::io` sources and sinks.
//!
//! Same contract as the async versions: bounded channel, input order,
//! stop after the first error, cancellation checked once per line or write.

use crate::config::PipelineConfig;
use crate::decoder::{decode_line, line_from_bytes, DecodeResult, LineStep};
use crate::error::RecordError;
use crate::record::User;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::io::{BufRead, Write};
use std::thread;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Decode on a dedicated thread; iterate the receiver until it disconnects.
pub fn decode_users<R>(
    config: &PipelineConfig,
    token: CancellationToken,
    reader: R,
) -> Receiver<DecodeResult>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = bounded(config.channel_capacity.max(1));
    let config = config.clone();

    thread::spawn(move || produce(&config, &token, reader, tx));

    rx
}

fn produce<R: BufRead>(
    config: &PipelineConfig,
    token: &CancellationToken,
    reader: R,
    tx: Sender<DecodeResult>,
) {
    for segment in reader.split(b'\n') {
        let line = match segment {
            Ok(bytes) => line_from_bytes(bytes),
            Err(err) => {
                let _ = tx.send(Err(err.into()));
                return;
            }
        };

        let (item, last) = match decode_line(config, token, &line) {
            LineStep::Skip => continue,
            LineStep::Emit(user) => (Ok(user), false),
            LineStep::Stop(err) => (Err(err), true),
        };

        if tx.send(item).is_err() {
            debug!("receiver dropped, stopping decode");
            return;
        }
        if last {
            return;
        }
    }
    debug!("source exhausted");
}

/// Blocking counterpart of [`crate::writer::write_user`].
pub fn write_user<W>(token: &CancellationToken, writer: &mut W, user: &User) -> Result<(), RecordError>
where
    W: Write + ?Sized,
{
    if token.is_cancelled() {
        return Err(RecordError::Cancelled);
    }

    writer.write_all(user.to_string().as_bytes())?;
    writer.write_all(b"\n")?;

    Ok(())
}
