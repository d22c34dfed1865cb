//! Deadline-ordered timer queue
//!
//! Timers are plain values popped by the game loop once their deadline has
//! passed, so nothing fires outside the loop that owns the room state.
//! Entries with equal deadlines come out in the order they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

#[derive(Debug)]
struct Entry<T> {
    deadline: Instant,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed so the max-heap yields the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, deadline: Instant, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline,
            seq,
            item,
        });
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    /// Removes and returns the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, T)> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|entry| (entry.deadline, entry.item))
    }

    /// Drops every pending timer matching `predicate`. Returns how many were dropped.
    pub fn cancel<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.heap.len();
        self.heap.retain(|entry| !predicate(&entry.item));
        before - self.heap.len()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_respects_deadlines() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(t0 + Duration::from_secs(5), "late");
        queue.schedule(t0 + Duration::from_secs(1), "early");

        assert_eq!(queue.next_deadline(), Some(t0 + Duration::from_secs(1)));
        assert!(queue.pop_due(t0).is_none());

        let (deadline, item) = queue.pop_due(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(item, "early");
        assert_eq!(deadline, t0 + Duration::from_secs(1));
        assert!(queue.pop_due(t0 + Duration::from_secs(2)).is_none());

        assert_eq!(queue.pop_due(t0 + Duration::from_secs(5)).unwrap().1, "late");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_equal_deadlines_keep_schedule_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        for i in 0..5 {
            queue.schedule(t0, i);
        }

        let popped: Vec<i32> = std::iter::from_fn(|| queue.pop_due(t0).map(|(_, i)| i)).collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_drops_matching_timers() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        queue.schedule(t0, ("a", 1));
        queue.schedule(t0, ("b", 2));
        queue.schedule(t0, ("a", 3));

        assert_eq!(queue.cancel(|(room, _)| *room == "a"), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(t0).unwrap().1, ("b", 2));
        assert_eq!(queue.cancel(|_| true), 0);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue: TimerQueue<u8> = TimerQueue::default();
        assert!(queue.next_deadline().is_none());
        assert!(queue.pop_due(Instant::now()).is_none());
        assert_eq!(queue.len(), 0);
    }
}
