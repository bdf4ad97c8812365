//! Sweep scheduling and dispatch of ready updates.
//!
//! One sweep walks every interface queue, sends whatever has become ready
//! and re-arms the single [`Wakeup`] for the earliest entry still waiting.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{FilterError, OutputStream};
use super::queue::QueueTable;
use crate::time::Clock;
use crate::update::{AddrUpdate, LinkUpdate, Update};

/// Shortest delay a wake-up is ever armed with, so a deadline that has just
/// passed still yields a timer that fires after the current sweep.
pub const MIN_WAKEUP_DELAY: Duration = Duration::from_millis(1);

/// Senders for the two filtered output streams.
#[derive(Debug, Clone)]
pub struct UpdateSenders {
    /// Filtered link updates.
    pub links: mpsc::Sender<LinkUpdate>,
    /// Filtered address updates.
    pub addrs: mpsc::Sender<AddrUpdate>,
}

impl UpdateSenders {
    /// Bundles the two output senders.
    #[must_use]
    pub const fn new(links: mpsc::Sender<LinkUpdate>, addrs: mpsc::Sender<AddrUpdate>) -> Self {
        Self { links, addrs }
    }

    /// Sends an update on the stream matching its variant, waiting for capacity.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::OutputClosed`] if that stream's receiver is gone.
    pub async fn send(&self, update: Update) -> Result<(), FilterError> {
        match update {
            Update::Link(link) => self.links.send(link).await.map_err(|_| {
                FilterError::OutputClosed {
                    stream: OutputStream::Link,
                }
            }),
            Update::Addr(addr) => self.addrs.send(addr).await.map_err(|_| {
                FilterError::OutputClosed {
                    stream: OutputStream::Address,
                }
            }),
        }
    }
}

/// Whether the loop should keep going after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Cancelled,
}

/// Sends `update`, giving up if `shutdown` fires while the consumer is slow.
pub(crate) async fn dispatch(
    outputs: &UpdateSenders,
    shutdown: &CancellationToken,
    update: Update,
) -> Result<Flow, FilterError> {
    tokio::select! {
        biased;

        () = shutdown.cancelled() => Ok(Flow::Cancelled),
        sent = outputs.send(update) => sent.map(|()| Flow::Continue),
    }
}

/// The single outstanding wake-up of the filter loop.
///
/// Arming replaces any previous timer; a disarmed wake-up never fires.
pub(crate) struct Wakeup<S> {
    sleep: Option<Pin<Box<S>>>,
    deadline: Option<Instant>,
}

impl<S: Future<Output = ()>> Wakeup<S> {
    pub(crate) const fn new() -> Self {
        Self {
            sleep: None,
            deadline: None,
        }
    }

    pub(crate) const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn arm(&mut self, sleep: S, deadline: Instant) {
        self.sleep = Some(Box::pin(sleep));
        self.deadline = Some(deadline);
    }

    pub(crate) fn disarm(&mut self) {
        self.sleep = None;
        self.deadline = None;
    }

    /// Completes when the armed timer fires; pending forever while disarmed.
    ///
    /// Cancel-safe: if dropped before completion the timer stays armed.
    pub(crate) async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.disarm();
            }
            None => std::future::pending().await,
        }
    }
}

/// Dispatches every ready entry and re-arms `wakeup` for the earliest one left.
///
/// Interfaces are visited in ascending index order; within an interface
/// dispatch stops at the first entry that is not yet ready.
pub(crate) async fn sweep<C: Clock>(
    clock: &C,
    queues: &mut QueueTable,
    wakeup: &mut Wakeup<C::Sleep>,
    outputs: &UpdateSenders,
    shutdown: &CancellationToken,
) -> Result<Flow, FilterError> {
    let mut next: Option<Instant> = None;

    for index in queues.indices() {
        while let Some(entry) = queues.pop_ready(index, clock.now()) {
            tracing::debug!(
                update = %entry.update,
                kind = ?entry.update.kind(),
                late_by = ?clock.since(entry.ready_at),
                "Update ready to send"
            );
            if dispatch(outputs, shutdown, entry.update).await? == Flow::Cancelled {
                return Ok(Flow::Cancelled);
            }
        }

        match queues.head_ready_at(index) {
            Some(ready_at) => {
                tracing::trace!(
                    if_index = index,
                    pending = queues.pending(index),
                    "Updates still queued for interface"
                );
                next = Some(next.map_or(ready_at, |earliest| earliest.min(ready_at)));
            }
            None => tracing::trace!(if_index = index, "No more updates for interface"),
        }
    }

    match next {
        Some(deadline) => {
            let delay = wakeup_delay(clock.until(deadline));
            tracing::debug!(?delay, "Scheduled next sweep");
            wakeup.arm(clock.after(delay), deadline);
        }
        None => {
            tracing::debug!("No more updates to send, disabling timer");
            wakeup.disarm();
        }
    }

    Ok(Flow::Continue)
}

/// Clamps a remaining delay to [`MIN_WAKEUP_DELAY`].
#[must_use]
pub(crate) fn wakeup_delay(remaining: Duration) -> Duration {
    remaining.max(MIN_WAKEUP_DELAY)
}
