//! Feeds a replay script through a filter and records what comes out.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::{ReplayError, ReplayEvent};
use crate::filter::{UpdateFilter, UpdateSenders};
use crate::time::Clock;
use crate::update::{AddrUpdate, LinkUpdate, Update};

/// A filtered update and the offset from the start of the replay at which
/// the filter emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    /// Offset from the start of the replay.
    pub at: Duration,
    /// The filtered update.
    pub update: Update,
}

/// Replays `events` through `filter`.
///
/// Each event is sent at its offset from the moment this is called. Once
/// every event has been sent the inputs are closed and the filter drains
/// whatever it still holds. Cancelling `shutdown` stops both the feed and
/// the filter; updates emitted up to that point are still returned.
///
/// Link and address outputs are merged in the order they are received, so
/// updates emitted at the same instant on different streams may be
/// interleaved in either order.
///
/// # Errors
///
/// Returns [`ReplayError::Filter`] if the filter stops with an error.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub async fn replay<C: Clock>(
    filter: &UpdateFilter<C>,
    events: Vec<ReplayEvent>,
    capacity: usize,
    shutdown: CancellationToken,
) -> Result<Vec<Emitted>, ReplayError> {
    let (link_in_tx, link_in_rx) = mpsc::channel(capacity);
    let (addr_in_tx, addr_in_rx) = mpsc::channel(capacity);
    let (link_out_tx, link_out_rx) = mpsc::channel(capacity);
    let (addr_out_tx, addr_out_rx) = mpsc::channel(capacity);

    let clock = filter.clock();
    let start = clock.now();
    tracing::debug!(
        events = events.len(),
        delay = ?filter.damping().delay(),
        "Replay starting"
    );

    let run = filter.run(
        shutdown.clone(),
        ReceiverStream::new(link_in_rx),
        ReceiverStream::new(addr_in_rx),
        UpdateSenders::new(link_out_tx, addr_out_tx),
    );
    let feed = feed(clock, start, events, link_in_tx, addr_in_tx, &shutdown);
    let collect = collect(clock, start, link_out_rx, addr_out_rx);

    let (result, (), emitted) = tokio::join!(run, feed, collect);
    result?;

    tracing::debug!(emitted = emitted.len(), "Replay finished");
    Ok(emitted)
}

/// Sends each event at its offset, then drops the senders.
async fn feed<C: Clock>(
    clock: &C,
    start: Instant,
    events: Vec<ReplayEvent>,
    links: mpsc::Sender<LinkUpdate>,
    addrs: mpsc::Sender<AddrUpdate>,
    shutdown: &CancellationToken,
) {
    for event in events {
        let wait = clock.until(start + event.at);
        if !wait.is_zero() {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => return,
                () = clock.after(wait) => {}
            }
        }

        tracing::trace!(
            if_index = event.update.index(),
            update = %event.update,
            "Feeding update"
        );
        let sent = match event.update {
            Update::Link(update) => links.send(update).await.is_ok(),
            Update::Addr(update) => addrs.send(update).await.is_ok(),
        };
        if !sent {
            tracing::debug!("Filter stopped, remaining events not fed");
            return;
        }
    }
}

/// Records filtered updates until both outputs close.
async fn collect<C: Clock>(
    clock: &C,
    start: Instant,
    links: mpsc::Receiver<LinkUpdate>,
    addrs: mpsc::Receiver<AddrUpdate>,
) -> Vec<Emitted> {
    let links = ReceiverStream::new(links).map(Update::Link);
    let addrs = ReceiverStream::new(addrs).map(Update::Addr);
    let mut merged = links.merge(addrs);

    let mut emitted = Vec::new();
    while let Some(update) = merged.next().await {
        let at = clock.since(start);
        tracing::debug!(?at, %update, "Filtered update");
        emitted.push(Emitted { at, update });
    }
    emitted
}
