//! One sampling run: producer, optional HTTP view, and the final snapshot.

use rand::Rng;
use tokio::io::AsyncBufRead;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::feed::feed;
use crate::reservoir::SharedReservoir;
use crate::serve::serve;
use crate::sink::Tee;
use crate::snapshot::Snapshot;
use crate::termination::Termination;

/// Sample `input` into `reservoir` until it ends or `termination` stops,
/// serving the live sample on `listener` meanwhile, and return the final
/// snapshot.
///
/// The producer is joined before the final snapshot is taken, so the result
/// holds exactly the records admitted before the stop was observed.
pub async fn sample_stream<I, R>(
    input: I,
    reservoir: SharedReservoir<R>,
    tee: Tee,
    termination: Termination,
    listener: Option<TcpListener>,
) -> Snapshot
where
    I: AsyncBufRead + Unpin + Send + 'static,
    R: Rng + Send + 'static,
{
    let producer = tokio::spawn(feed(
        input,
        reservoir.clone(),
        tee,
        termination.clone(),
    ));

    if let Some(listener) = listener {
        match listener.local_addr() {
            Ok(addr) => info!(%addr, "serving live sample over http"),
            Err(err) => warn!(%err, "serving live sample over http on an unknown address"),
        }
        let (reservoir, termination) = (reservoir.clone(), termination.clone());
        tokio::spawn(async move {
            if let Err(err) = serve(listener, reservoir, termination).await {
                warn!(%err, "http server stopped");
            }
        });
    }

    let reason = termination.stopped().await;
    info!(%reason, "sampling stopped");

    match producer.await {
        Ok(outcome) => info!(
            records = outcome.records,
            seen = reservoir.seen_count(),
            "producer joined"
        ),
        Err(err) => warn!(%err, "producer task failed"),
    }

    reservoir.snapshot()
}
