//! The update filter loop.
//!
//! This module provides [`UpdateFilter`], which reads raw link and address
//! updates, holds back the ones that may be part of a flap, and forwards
//! everything else as soon as it is safe.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::error::FilterError;
use super::policy::DampingPolicy;
use super::queue::QueueTable;
use super::scheduler::{Flow, UpdateSenders, Wakeup, dispatch, sweep};
use crate::time::{Clock, TokioClock};
use crate::update::{AddrUpdate, LinkUpdate, Update};

/// Filters out updates caused by addresses being briefly removed and re-added.
///
/// Some DHCP clients remove and re-add the leased address while renewing.
/// The filter keeps a queue of link and address updates per interface:
///
/// - An address removal might be a flap, so it is held back for the
///   damping delay.
/// - If the same prefix is added back before then, the removal is squashed
///   and only the add is emitted, at the removal's original deadline.
/// - Adds and link changes for an interface with nothing queued pass
///   straight through; otherwise they wait behind the queued entries.
///
/// All state lives inside one [`UpdateFilter::run`] call, so independent
/// filters never share anything.
///
/// # Type Parameters
///
/// * `C` - The [`Clock`] implementation (defaults to [`TokioClock`])
///
/// # Example
///
/// ```no_run
/// use flap_filter::filter::{DampingPolicy, UpdateFilter};
/// use std::time::Duration;
///
/// # async fn demo() {
/// let filter = UpdateFilter::new()
///     .with_damping(DampingPolicy::new(Duration::from_millis(250)));
/// let mut handle = filter.spawn(64);
///
/// while let Some(update) = handle.filtered_addrs.recv().await {
///     println!("{update:?}");
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UpdateFilter<C = TokioClock> {
    clock: C,
    damping: DampingPolicy,
}

impl UpdateFilter<TokioClock> {
    /// Creates a filter with the tokio clock and the default damping delay.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_clock(TokioClock)
    }
}

impl Default for UpdateFilter<TokioClock> {
    fn default() -> Self {
        Self::new()
    }
}

/// What to do after handling an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Sweep,
    Skip,
    Stop,
}

/// What woke the loop up.
#[derive(Debug)]
enum Event {
    Shutdown,
    Link(LinkUpdate),
    Addr(AddrUpdate),
    LinksClosed,
    AddrsClosed,
    Timer,
}

impl<C: Clock> UpdateFilter<C> {
    /// Creates a filter with a custom clock.
    ///
    /// This constructor allows injecting a simulated clock for testing.
    #[must_use]
    pub const fn with_clock(clock: C) -> Self {
        Self {
            clock,
            damping: DampingPolicy::new(super::policy::FLAP_DAMPING_DELAY),
        }
    }

    /// Configures the damping policy.
    #[must_use]
    pub const fn with_damping(mut self, damping: DampingPolicy) -> Self {
        self.damping = damping;
        self
    }

    /// Returns the damping policy.
    #[must_use]
    pub const fn damping(&self) -> DampingPolicy {
        self.damping
    }

    /// Returns the clock.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Runs the filter until cancelled.
    ///
    /// Reads `links` and `addrs` and writes filtered updates to `outputs`.
    /// Sends wait for the consumer, so a slow consumer stalls the filter
    /// rather than losing updates.
    ///
    /// Returns `Ok(())` when `shutdown` is cancelled; anything still
    /// deferred at that point is discarded. An input stream that ends is
    /// no longer polled; once both have ended and nothing is deferred the
    /// loop also returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::OutputClosed`] if a consumer drops its receiver.
    pub async fn run<L, A>(
        &self,
        shutdown: CancellationToken,
        mut links: L,
        mut addrs: A,
        outputs: UpdateSenders,
    ) -> Result<(), FilterError>
    where
        L: Stream<Item = LinkUpdate> + Unpin,
        A: Stream<Item = AddrUpdate> + Unpin,
    {
        tracing::debug!(delay = ?self.damping.delay(), "Update filter starting");

        let mut queues = QueueTable::new();
        let mut wakeup = Wakeup::new();
        let mut links_open = true;
        let mut addrs_open = true;

        loop {
            if !links_open && !addrs_open && queues.is_empty() {
                tracing::info!("Update sources closed and nothing deferred, stopping");
                return Ok(());
            }

            let event = tokio::select! {
                biased;

                () = shutdown.cancelled() => Event::Shutdown,
                // Ahead of the inputs so a busy producer cannot starve due updates.
                () = wakeup.fired() => Event::Timer,
                link = links.next(), if links_open => {
                    link.map_or(Event::LinksClosed, Event::Link)
                }
                addr = addrs.next(), if addrs_open => {
                    addr.map_or(Event::AddrsClosed, Event::Addr)
                }
            };

            let step = match event {
                Event::Shutdown => {
                    tracing::info!("Shutdown requested, stopping update filter");
                    return Ok(());
                }
                Event::Link(update) => {
                    self.on_link(update, &mut queues, &outputs, &shutdown)
                        .await?
                }
                Event::Addr(update) => {
                    let timer = wakeup.deadline();
                    self.on_addr(update, &mut queues, timer, &outputs, &shutdown)
                        .await?
                }
                Event::LinksClosed => {
                    tracing::debug!("Link update source closed");
                    links_open = false;
                    Step::Skip
                }
                Event::AddrsClosed => {
                    tracing::debug!("Address update source closed");
                    addrs_open = false;
                    Step::Skip
                }
                Event::Timer => {
                    tracing::debug!("Timer popped");
                    Step::Sweep
                }
            };

            match step {
                Step::Skip => {}
                Step::Stop => {
                    tracing::info!("Shutdown requested during dispatch, stopping update filter");
                    return Ok(());
                }
                Step::Sweep => {
                    let flow =
                        sweep(&self.clock, &mut queues, &mut wakeup, &outputs, &shutdown).await?;
                    if flow == Flow::Cancelled {
                        tracing::info!(
                            "Shutdown requested during dispatch, stopping update filter"
                        );
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles a link update.
    async fn on_link(
        &self,
        update: LinkUpdate,
        queues: &mut QueueTable,
        outputs: &UpdateSenders,
        shutdown: &CancellationToken,
    ) -> Result<Step, FilterError> {
        if !queues.has_pending(update.index) {
            // Flaps show up as address removals first; a link change with
            // nothing queued is unrelated and must not be delayed.
            tracing::debug!(if_index = update.index, "Link change with empty queue, short circuit");
            return forward(outputs, shutdown, Update::Link(update)).await;
        }

        let ready_at = self.clock.now() + self.damping.delay();
        tracing::debug!(if_index = update.index, "Link change with non-empty queue, deferring");
        queues.defer_link(update, ready_at);
        Ok(Step::Sweep)
    }

    /// Handles an address update.
    ///
    /// `timer` is the deadline of the armed wake-up, if any.
    async fn on_addr(
        &self,
        update: AddrUpdate,
        queues: &mut QueueTable,
        timer: Option<Instant>,
        outputs: &UpdateSenders,
        shutdown: &CancellationToken,
    ) -> Result<Step, FilterError> {
        if update.is_add {
            tracing::debug!(prefix = %update.prefix, if_index = update.index, "Got address ADD");
            if !queues.has_pending(update.index) {
                // Only removals can start a flap, so an add with nothing in
                // flight goes straight out.
                tracing::debug!("Add with empty queue, short circuit");
                return forward(outputs, shutdown, Update::Addr(update)).await;
            }
        } else {
            tracing::debug!(prefix = %update.prefix, if_index = update.index, "Got address DEL");
        }

        let index = update.index;
        let coalesced = queues.coalesce(update, self.clock.now(), self.damping.delay());
        tracing::trace!(
            if_index = index,
            squashed = coalesced.squashed,
            pending = queues.pending(index),
            "Address update queued"
        );
        if coalesced.truncated > 0 {
            tracing::debug!(
                discarded = coalesced.truncated,
                "Discarded updates queued after the squashed one"
            );
        }

        if let Some(deadline) = timer {
            // The armed timer already fires no later than this entry can be sent.
            tracing::debug!(?deadline, "Timer already set");
            return Ok(Step::Skip);
        }
        Ok(Step::Sweep)
    }

    /// Spawns the filter on the current tokio runtime.
    ///
    /// Creates bounded channels of `capacity` for both inputs and both
    /// outputs and returns their free ends.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(self, capacity: usize) -> FilterHandle
    where
        C: 'static,
    {
        let (link_in_tx, link_in_rx) = mpsc::channel(capacity);
        let (addr_in_tx, addr_in_rx) = mpsc::channel(capacity);
        let (link_out_tx, link_out_rx) = mpsc::channel(capacity);
        let (addr_out_tx, addr_out_rx) = mpsc::channel(capacity);
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            self.run(
                token,
                ReceiverStream::new(link_in_rx),
                ReceiverStream::new(addr_in_rx),
                UpdateSenders::new(link_out_tx, addr_out_tx),
            )
            .await
        });

        FilterHandle {
            links: link_in_tx,
            addrs: addr_in_tx,
            filtered_links: link_out_rx,
            filtered_addrs: addr_out_rx,
            shutdown,
            task,
        }
    }
}

/// Sends a fast-path update; no sweep follows it.
async fn forward(
    outputs: &UpdateSenders,
    shutdown: &CancellationToken,
    update: Update,
) -> Result<Step, FilterError> {
    Ok(match dispatch(outputs, shutdown, update).await? {
        Flow::Continue => Step::Skip,
        Flow::Cancelled => Step::Stop,
    })
}

/// Channel ends of a spawned [`UpdateFilter`].
///
/// Dropping both input senders lets the filter drain what it has deferred
/// and exit; cancelling `shutdown` stops it immediately.
#[derive(Debug)]
pub struct FilterHandle {
    /// Raw link updates in.
    pub links: mpsc::Sender<LinkUpdate>,
    /// Raw address updates in.
    pub addrs: mpsc::Sender<AddrUpdate>,
    /// Filtered link updates out.
    pub filtered_links: mpsc::Receiver<LinkUpdate>,
    /// Filtered address updates out.
    pub filtered_addrs: mpsc::Receiver<AddrUpdate>,
    /// Cancels the filter loop.
    pub shutdown: CancellationToken,
    /// The running filter loop.
    pub task: JoinHandle<Result<(), FilterError>>,
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
