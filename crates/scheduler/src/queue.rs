//! Per-source FIFO queues with a round-robin rotation over sources.
//!
//! Fairness is across *sources*, not raw requests: a source with a
//! hundred queued items gets one turn per rotation, the same as a
//! source with one. A source is present in the rotation iff its queue
//! is non-empty; emptied queues are pruned immediately so the cursor
//! never dwells on a dead entry.

use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;
use uuid::Uuid;

/// One queued translation request. Resolved exactly once.
pub(crate) struct PendingRequest {
    pub id: Uuid,
    pub text: String,
    pub source: String,
    /// Scope stamp copied from the generation counter at enqueue time.
    pub generation: u64,
    pub tx: oneshot::Sender<Option<String>>,
}

impl PendingRequest {
    /// Deliver the result. The caller may have dropped its future; a
    /// closed channel is not an error.
    pub fn resolve(self, result: Option<String>) {
        let _ = self.tx.send(result);
    }
}

#[derive(Default)]
pub(crate) struct SourceQueues {
    queues: HashMap<String, VecDeque<PendingRequest>>,
    /// Rotation order. Invariant: every entry has a non-empty queue.
    rotation: Vec<String>,
    /// Index of the next source to service.
    cursor: usize,
}

impl SourceQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request to its source's queue, registering the source
    /// at the tail of the rotation if it was absent.
    pub fn enqueue(&mut self, req: PendingRequest) {
        let queue = self.queues.entry(req.source.clone()).or_default();
        if queue.is_empty() {
            self.rotation.push(req.source.clone());
        }
        queue.push_back(req);
    }

    /// Take the front request of the currently pointed-at source and
    /// advance the cursor. Returns `None` when no source has work.
    pub fn next(&mut self) -> Option<PendingRequest> {
        if self.rotation.is_empty() {
            return None;
        }
        let source = self.rotation[self.cursor].clone();
        let queue = self.queues.get_mut(&source)?;
        let req = queue.pop_front()?;

        if queue.is_empty() {
            self.queues.remove(&source);
            self.rotation.remove(self.cursor);
            // Removal shifts the next source into this slot; only the
            // wrap needs fixing.
            if self.cursor >= self.rotation.len() {
                self.cursor = 0;
            }
        } else {
            self.cursor = (self.cursor + 1) % self.rotation.len();
        }
        Some(req)
    }

    /// Remove and return every queued request stamped with a
    /// generation older than `generation`, pruning emptied sources and
    /// keeping the cursor on the first surviving source at or after
    /// its old position.
    pub fn drain_stale(&mut self, generation: u64) -> Vec<PendingRequest> {
        let mut drained = Vec::new();
        for queue in self.queues.values_mut() {
            let mut kept = VecDeque::with_capacity(queue.len());
            for req in queue.drain(..) {
                if req.generation < generation {
                    drained.push(req);
                } else {
                    kept.push_back(req);
                }
            }
            *queue = kept;
        }

        let old_rotation = std::mem::take(&mut self.rotation);
        let mut survivors_before_cursor = 0;
        for (idx, source) in old_rotation.into_iter().enumerate() {
            let alive = self.queues.get(&source).is_some_and(|q| !q.is_empty());
            if alive {
                if idx < self.cursor {
                    survivors_before_cursor += 1;
                }
                self.rotation.push(source);
            }
        }
        self.queues.retain(|_, q| !q.is_empty());
        self.cursor = if self.rotation.is_empty() {
            0
        } else {
            survivors_before_cursor % self.rotation.len()
        };
        drained
    }

    pub fn is_empty(&self) -> bool {
        self.rotation.is_empty()
    }

    /// Total queued requests across all sources.
    pub fn depth(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Number of sources with pending work.
    pub fn active_sources(&self) -> usize {
        self.rotation.len()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, source: &str, generation: u64) -> PendingRequest {
        let (tx, _rx) = oneshot::channel();
        PendingRequest {
            id: Uuid::new_v4(),
            text: text.into(),
            source: source.into(),
            generation,
            tx,
        }
    }

    fn texts_in_order(q: &mut SourceQueues) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(req) = q.next() {
            out.push(req.text);
        }
        out
    }

    #[test]
    fn round_robin_interleaves_sources() {
        let mut q = SourceQueues::new();
        q.enqueue(request("a1", "A", 0));
        q.enqueue(request("a2", "A", 0));
        q.enqueue(request("a3", "A", 0));
        q.enqueue(request("b1", "B", 0));

        assert_eq!(texts_in_order(&mut q), ["a1", "b1", "a2", "a3"]);
        assert!(q.is_empty());
    }

    #[test]
    fn noisy_source_does_not_starve_others() {
        let mut q = SourceQueues::new();
        for i in 0..100 {
            q.enqueue(request(&format!("a{i}"), "A", 0));
        }
        q.enqueue(request("b1", "B", 0));
        q.enqueue(request("c1", "C", 0));

        let order = texts_in_order(&mut q);
        // B and C are each serviced within the first full rotation.
        assert!(order.iter().position(|t| t == "b1").unwrap() <= 3);
        assert!(order.iter().position(|t| t == "c1").unwrap() <= 3);
    }

    #[test]
    fn emptied_source_reappears_at_rotation_tail() {
        let mut q = SourceQueues::new();
        q.enqueue(request("a1", "A", 0));
        q.enqueue(request("b1", "B", 0));
        q.enqueue(request("b2", "B", 0));

        assert_eq!(q.next().unwrap().text, "a1"); // A pruned
        q.enqueue(request("a2", "A", 0)); // fresh append after B
        assert_eq!(q.next().unwrap().text, "b1");
        assert_eq!(q.next().unwrap().text, "a2");
        assert_eq!(q.next().unwrap().text, "b2");
    }

    #[test]
    fn next_on_empty_returns_none() {
        let mut q = SourceQueues::new();
        assert!(q.next().is_none());
        assert_eq!(q.depth(), 0);
        assert_eq!(q.active_sources(), 0);
    }

    #[test]
    fn drain_stale_keeps_newer_generation() {
        let mut q = SourceQueues::new();
        q.enqueue(request("old1", "A", 0));
        q.enqueue(request("new1", "A", 1));
        q.enqueue(request("old2", "B", 0));

        let drained = q.drain_stale(1);
        assert_eq!(drained.len(), 2);
        assert_eq!(q.depth(), 1);
        assert_eq!(q.active_sources(), 1);
        assert_eq!(q.next().unwrap().text, "new1");
    }

    #[test]
    fn drain_stale_repairs_cursor() {
        let mut q = SourceQueues::new();
        q.enqueue(request("a1", "A", 0));
        q.enqueue(request("a2", "A", 1));
        q.enqueue(request("b1", "B", 0));
        q.enqueue(request("c1", "C", 1));

        // Advance the cursor past A.
        assert_eq!(q.next().unwrap().text, "a1");

        // B disappears entirely; cursor must land on a live source.
        let drained = q.drain_stale(1);
        assert_eq!(drained.len(), 1);
        assert_eq!(texts_in_order(&mut q), ["c1", "a2"]);
    }

    #[test]
    fn depth_counts_all_sources() {
        let mut q = SourceQueues::new();
        q.enqueue(request("a1", "A", 0));
        q.enqueue(request("a2", "A", 0));
        q.enqueue(request("b1", "B", 0));
        assert_eq!(q.depth(), 3);
        assert_eq!(q.active_sources(), 2);
    }
}
