//! Per-interface queues of deferred updates and the flap coalescer.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::update::{AddrUpdate, InterfaceIndex, LinkUpdate, Update};

/// An update waiting until its ready time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredEntry {
    /// Earliest instant at which the update may be dispatched.
    pub ready_at: Instant,
    /// The held-back update.
    pub update: Update,
}

impl DeferredEntry {
    /// Creates a deferred entry.
    #[must_use]
    pub const fn new(ready_at: Instant, update: Update) -> Self {
        Self { ready_at, update }
    }

    /// Returns true if this is an address update for the same prefix as `addr`.
    fn matches_prefix(&self, addr: &AddrUpdate) -> bool {
        self.update
            .as_addr()
            .is_some_and(|queued| queued.same_prefix_as(addr))
    }
}

/// Result of queueing an address update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coalesced {
    /// Ready time assigned to the new entry.
    pub ready_at: Instant,
    /// Whether an earlier entry for the same prefix was replaced.
    pub squashed: bool,
    /// Entries queued after the replaced one that were discarded with it.
    pub truncated: usize,
}

/// Deferred updates keyed by interface index.
///
/// A queue only exists while it holds at least one entry, so the table is
/// bounded by the number of interfaces with updates in flight. Interfaces
/// are iterated in ascending index order.
#[derive(Debug, Default)]
pub struct QueueTable {
    queues: BTreeMap<InterfaceIndex, VecDeque<DeferredEntry>>,
}

impl QueueTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `index` has deferred updates.
    #[must_use]
    pub fn has_pending(&self, index: InterfaceIndex) -> bool {
        self.queues.contains_key(&index)
    }

    /// Returns the number of deferred updates for `index`.
    #[must_use]
    pub fn pending(&self, index: InterfaceIndex) -> usize {
        self.queues.get(&index).map_or(0, VecDeque::len)
    }

    /// Returns the number of interfaces with deferred updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Returns true if nothing is deferred.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Returns the interfaces that currently have deferred updates.
    #[must_use]
    pub fn indices(&self) -> Vec<InterfaceIndex> {
        self.queues.keys().copied().collect()
    }

    /// Appends a link update behind whatever is queued for its interface.
    pub fn defer_link(&mut self, update: LinkUpdate, ready_at: Instant) {
        self.queues
            .entry(update.index)
            .or_default()
            .push_back(DeferredEntry::new(ready_at, Update::Link(update)));
    }

    /// Queues an address update, squashing an earlier update for the same prefix.
    ///
    /// Adds are ready immediately (they still wait behind earlier entries),
    /// removals after `delay`. The queue is scanned in order; at the first
    /// address entry with the same prefix the new update inherits that
    /// entry's ready time and replaces it. The scan stops there: entries
    /// before the match are kept, the matched entry and everything after it
    /// are discarded.
    pub fn coalesce(&mut self, update: AddrUpdate, now: Instant, delay: Duration) -> Coalesced {
        let mut ready_at = if update.is_add { now } else { now + delay };
        let index = update.index;
        let mut queue = self.queues.remove(&index).unwrap_or_default();

        let mut squashed = false;
        let mut truncated = 0;
        if let Some(pos) = queue
            .iter()
            .position(|entry| entry.matches_prefix(&update))
        {
            tracing::debug!(
                prefix = %update.prefix,
                "Received update for same prefix within damping window, squashed the earlier one"
            );
            ready_at = queue[pos].ready_at;
            squashed = true;
            truncated = queue.len() - pos - 1;
            queue.truncate(pos);
        }

        queue.push_back(DeferredEntry::new(ready_at, Update::Addr(update)));
        self.queues.insert(index, queue);

        Coalesced {
            ready_at,
            squashed,
            truncated,
        }
    }

    /// Removes and returns the head entry for `index` if it is ready at `now`.
    ///
    /// Never looks past an unready head, which keeps dispatch FIFO per
    /// interface. The interface's queue is dropped once it empties.
    pub fn pop_ready(&mut self, index: InterfaceIndex, now: Instant) -> Option<DeferredEntry> {
        let queue = self.queues.get_mut(&index)?;
        let ready = queue.front().is_some_and(|head| head.ready_at <= now);
        let entry = if ready { queue.pop_front() } else { None };
        if queue.is_empty() {
            self.queues.remove(&index);
        }
        entry
    }

    /// Returns the ready time of the head entry for `index`.
    #[must_use]
    pub fn head_ready_at(&self, index: InterfaceIndex) -> Option<Instant> {
        self.queues
            .get(&index)
            .and_then(VecDeque::front)
            .map(|entry| entry.ready_at)
    }

    /// Returns the entries queued for `index`, head first.
    pub fn entries(&self, index: InterfaceIndex) -> impl Iterator<Item = &DeferredEntry> {
        self.queues.get(&index).into_iter().flatten()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
