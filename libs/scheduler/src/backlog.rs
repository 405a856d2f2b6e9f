//! In-memory pending backlog, refilled in batches from an external source.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use anyhow::Result;
use async_trait::async_trait;

use crate::interleave::interleave;

/// Source of pending sync resources, typically backed by a registry query.
///
/// Returns one ordered list per candidate queue (for example never-synced
/// resources and resources awaiting a retry). The source must not return
/// resources named in `exclude`; the backlog filters them again regardless,
/// so a just-dispatched resource is never re-queued by a lagging source.
#[async_trait]
pub trait PendingSource<R>: Send + Sync {
    /// Load up to `limit` candidates in total, spread across the source's
    /// candidate queues. A total below `limit` signals the last batch.
    async fn load_candidates(&self, exclude: &HashSet<R>, limit: usize) -> Result<Vec<Vec<R>>>;
}

/// The scheduler's in-memory backlog.
///
/// Refilled only when its size drops below the dispatch capacity (low-water
/// mark), which bounds read round-trips against the source without risking
/// starvation when the source holds more candidates than fit in one batch.
#[derive(Debug)]
pub struct PendingBacklog<R> {
    queue: VecDeque<R>,
    batch_size: usize,
}

impl<R> PendingBacklog<R>
where
    R: Clone + Eq + Hash,
{
    pub fn new(batch_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            batch_size,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether the backlog has dropped below the low-water mark.
    pub fn below_low_water(&self, capacity: usize) -> bool {
        self.queue.len() < capacity
    }

    /// Replace the backlog with a freshly loaded batch.
    ///
    /// Fairness is computed across the full set of candidate lists before
    /// truncation to the batch size, and anything already in flight is
    /// dropped. Returns `true` when the raw batch was short, i.e. the source
    /// has no further candidates beyond this batch.
    pub fn refill(&mut self, lists: Vec<Vec<R>>, in_flight: &HashSet<R>) -> bool {
        let total: usize = lists.iter().map(Vec::len).sum();
        let last_batch = total < self.batch_size;

        let lists: Vec<Vec<R>> = lists
            .into_iter()
            .map(|list| {
                list.into_iter()
                    .filter(|resource| !in_flight.contains(resource))
                    .collect()
            })
            .collect();

        self.queue = interleave(lists, self.batch_size).into();
        last_batch
    }

    /// Take the next resource to dispatch.
    pub fn pop(&mut self) -> Option<R> {
        self.queue.pop_front()
    }
}
