//! The producer: reads lines and feeds them to the reservoir.

use std::borrow::Cow;

use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::reservoir::SharedReservoir;
use crate::sink::Tee;
use crate::termination::{StopReason, Termination};

/// How a producer run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Lines read and offered to the reservoir.
    pub records: u64,
    pub reason: StopReason,
}

/// Read `input` line by line until it ends or `termination` stops.
///
/// Each line is copied to `tee` and then offered to the reservoir. A stop is
/// noticed before the next line is read, and a pending read is abandoned, so
/// nothing past the interrupt is consumed. End of input and read errors both
/// trigger `termination`. The tee is finished on return.
pub async fn feed<I, R>(
    mut input: I,
    reservoir: SharedReservoir<R>,
    mut tee: Tee,
    termination: Termination,
) -> FeedOutcome
where
    I: AsyncBufRead + Unpin,
    R: Rng,
{
    let mut buf = Vec::new();
    let mut records = 0u64;

    let reason = loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            reason = termination.stopped() => {
                info!(records, %reason, "stopped reading input");
                break reason;
            }
            read = input.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                info!(records, "input exhausted");
                termination.trigger(StopReason::InputExhausted);
                break StopReason::InputExhausted;
            }
            Ok(_) => {
                let line = decode_line(&buf);
                tee.write_line(&line);
                reservoir.admit(line);
                records += 1;
            }
            Err(err) => {
                warn!(records, %err, "input read failed, treating as end of input");
                termination.trigger(StopReason::InputFailed);
                break StopReason::InputFailed;
            }
        }
    };

    tee.finish();
    debug!(records, %reason, "producer finished");
    FeedOutcome { records, reason }
}

/// Strip the line terminator (`\n` or `\r\n`) and decode, replacing invalid UTF-8.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}
