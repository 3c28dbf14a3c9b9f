//! The search frontier.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::SearchStrategy;
use crate::subgroup::Subgroup;

/// A subgroup waiting to be refined, with the priority it was queued at.
#[derive(Debug, Clone)]
pub struct Candidate {
    subgroup: Subgroup,
    priority: f64,
}

impl Candidate {
    pub fn new(subgroup: Subgroup, priority: f64) -> Self {
        Self { subgroup, priority }
    }

    pub fn subgroup(&self) -> &Subgroup {
        &self.subgroup
    }

    pub fn into_subgroup(self) -> Subgroup {
        self.subgroup
    }
}

/// Ordering key: smaller keys leave the queue first.
#[derive(Debug, Clone, Copy)]
struct QueueKey {
    rank: f64,
    order: i64,
    slot: usize,
}

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .total_cmp(&other.rank)
            .then(self.order.cmp(&other.order))
            .then(self.slot.cmp(&other.slot))
    }
}

/// Priority queue of candidates, ordered by the search strategy.
///
/// Candidates live in an index-addressed arena; ordered sets hold only keys.
/// Ties are broken by insertion order. With a width, the lowest-priority
/// entries are evicted once the bound is exceeded. Beam search keeps two
/// levels: candidates are popped from the current level while new ones go to
/// the next, which becomes current once the current level is exhausted.
#[derive(Debug)]
pub struct CandidateQueue {
    strategy: SearchStrategy,
    width: Option<usize>,
    current: BTreeSet<QueueKey>,
    next: BTreeSet<QueueKey>,
    arena: Vec<Option<Candidate>>,
    free: Vec<usize>,
    inserted: i64,
}

impl CandidateQueue {
    pub fn new(strategy: SearchStrategy, width: Option<usize>) -> Self {
        Self {
            strategy,
            width: width.map(|w| w.max(1)),
            current: BTreeSet::new(),
            next: BTreeSet::new(),
            arena: Vec::new(),
            free: Vec::new(),
            inserted: 0,
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add(&mut self, candidate: Candidate) {
        let order = self.inserted;
        self.inserted += 1;

        let (rank, order) = match self.strategy {
            SearchStrategy::Beam | SearchStrategy::BestFirst => (-candidate.priority, order),
            SearchStrategy::BreadthFirst => (0.0, order),
            SearchStrategy::DepthFirst => (0.0, -order),
        };
        // NaN priorities sort last
        let rank = if rank.is_nan() { f64::INFINITY } else { rank };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.arena[slot] = Some(candidate);
                slot
            }
            None => {
                self.arena.push(Some(candidate));
                self.arena.len() - 1
            }
        };
        let key = QueueKey { rank, order, slot };

        let bounded = match self.strategy {
            SearchStrategy::Beam => {
                self.next.insert(key);
                self.width.map(|w| (w, true))
            }
            SearchStrategy::BestFirst => {
                self.current.insert(key);
                self.width.map(|w| (w, false))
            }
            SearchStrategy::BreadthFirst | SearchStrategy::DepthFirst => {
                self.current.insert(key);
                None
            }
        };

        if let Some((width, next_level)) = bounded {
            let level = if next_level {
                &mut self.next
            } else {
                &mut self.current
            };
            while level.len() > width {
                if let Some(evicted) = level.pop_last() {
                    self.arena[evicted.slot] = None;
                    self.free.push(evicted.slot);
                }
            }
        }
    }

    /// Remove and return the highest-priority candidate.
    pub fn remove_first(&mut self) -> Option<Candidate> {
        if self.current.is_empty() {
            std::mem::swap(&mut self.current, &mut self.next);
        }
        let key = self.current.pop_first()?;
        self.free.push(key.slot);
        self.arena[key.slot].take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(size: usize, priority: f64) -> Candidate {
        Candidate::new(Subgroup::root(size), priority)
    }

    fn drain(queue: &mut CandidateQueue) -> Vec<usize> {
        std::iter::from_fn(|| queue.remove_first())
            .map(|c| c.subgroup().coverage())
            .collect()
    }

    #[test]
    fn test_best_first_orders_by_priority_then_insertion() {
        let mut queue = CandidateQueue::new(SearchStrategy::BestFirst, None);
        queue.add(candidate(1, 0.1));
        queue.add(candidate(2, 0.5));
        queue.add(candidate(3, 0.1));
        queue.add(candidate(4, 0.9));
        assert_eq!(drain(&mut queue), vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_breadth_and_depth_first() {
        let mut fifo = CandidateQueue::new(SearchStrategy::BreadthFirst, None);
        let mut lifo = CandidateQueue::new(SearchStrategy::DepthFirst, None);
        for (size, priority) in [(1, 0.9), (2, 0.1), (3, 0.5)] {
            fifo.add(candidate(size, priority));
            lifo.add(candidate(size, priority));
        }
        assert_eq!(drain(&mut fifo), vec![1, 2, 3]);
        assert_eq!(drain(&mut lifo), vec![3, 2, 1]);
    }

    #[test]
    fn test_width_evicts_lowest_priority() {
        let mut queue = CandidateQueue::new(SearchStrategy::BestFirst, Some(2));
        queue.add(candidate(1, 0.3));
        queue.add(candidate(2, 0.7));
        queue.add(candidate(3, 0.5));
        assert_eq!(queue.len(), 2);
        assert_eq!(drain(&mut queue), vec![2, 3]);
    }

    #[test]
    fn test_beam_keeps_levels_apart() {
        let mut queue = CandidateQueue::new(SearchStrategy::Beam, Some(2));
        queue.add(candidate(10, 0.0));
        let root = queue.remove_first().unwrap();
        assert_eq!(root.subgroup().coverage(), 10);

        // children of the root form the next level, bounded by the width
        queue.add(candidate(1, 0.2));
        queue.add(candidate(2, 0.8));
        queue.add(candidate(3, 0.4));
        assert_eq!(queue.len(), 2);

        let first = queue.remove_first().unwrap();
        assert_eq!(first.subgroup().coverage(), 2);

        // a grandchild with a high score waits for the current level to drain
        queue.add(candidate(4, 0.99));
        assert_eq!(drain(&mut queue), vec![3, 4]);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut queue = CandidateQueue::new(SearchStrategy::BestFirst, None);
        for round in 0..5 {
            queue.add(candidate(round, round as f64));
            assert!(queue.remove_first().is_some());
        }
        assert_eq!(queue.arena.len(), 1);
        assert!(queue.is_empty());
    }
}
