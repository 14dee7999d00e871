use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::domain::model::order_book::OrderBookState;

/// Size-bounded record of processed states keyed by timestamp.
///
/// Entries are immutable once inserted. When the buffer grows past its
/// capacity the entry with the smallest timestamp is evicted.
#[derive(Debug, Clone)]
pub struct BookHistory {
    capacity: usize,
    entries: BTreeMap<i64, Arc<OrderBookState>>,
}

impl BookHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: BTreeMap::new(),
        }
    }

    /// Store `state` under `timestamp`, replacing an entry with the same key
    pub fn record(&mut self, timestamp: i64, state: Arc<OrderBookState>) {
        self.entries.insert(timestamp, state);
        while self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_first() {
                debug!("History full ({}), evicted entry at {}", self.capacity, evicted);
            }
        }
    }

    pub fn get(&self, timestamp: i64) -> Option<Arc<OrderBookState>> {
        self.entries.get(&timestamp).cloned()
    }

    pub fn latest(&self) -> Option<Arc<OrderBookState>> {
        self.entries.values().next_back().cloned()
    }

    pub fn oldest_timestamp(&self) -> Option<i64> {
        self.entries.keys().next().copied()
    }

    /// Entries with `from <= timestamp <= to`, oldest first
    pub fn range(&self, from: i64, to: i64) -> Vec<(i64, Arc<OrderBookState>)> {
        if from > to {
            return Vec::new();
        }
        self.entries
            .range(from..=to)
            .map(|(ts, state)| (*ts, state.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ts: i64) -> Arc<OrderBookState> {
        Arc::new(OrderBookState::from_levels(vec![], vec![], ts))
    }

    #[test]
    fn test_evicts_smallest_timestamp() {
        let mut history = BookHistory::new(3);
        for ts in [30, 10, 20, 40] {
            history.record(ts, state(ts));
        }
        assert_eq!(history.len(), 3);
        assert!(history.get(10).is_none());
        assert_eq!(history.oldest_timestamp(), Some(20));
        assert_eq!(history.latest().map(|s| s.timestamp()), Some(40));
    }

    #[test]
    fn test_same_timestamp_replaces() {
        let mut history = BookHistory::new(3);
        history.record(5, state(1));
        history.record(5, state(2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(5).map(|s| s.timestamp()), Some(2));
    }

    #[test]
    fn test_range_and_clear() {
        let mut history = BookHistory::new(10);
        for ts in 1..=5 {
            history.record(ts, state(ts));
        }
        let slice: Vec<i64> = history.range(2, 4).into_iter().map(|(ts, _)| ts).collect();
        assert_eq!(slice, vec![2, 3, 4]);
        assert!(history.range(4, 2).is_empty());

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 10);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut history = BookHistory::new(0);
        history.record(1, state(1));
        history.record(2, state(2));
        assert_eq!(history.len(), 1);
        assert!(history.get(2).is_some());
    }
}
