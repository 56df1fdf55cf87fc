//! Node arena statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by a node arena and the tree built on it.
///
/// All fields are atomic for lock-free, thread-safe updates.
///
/// # Memory Ordering
/// `Ordering::Relaxed` everywhere: counters are independent and only need
/// atomicity.
///
/// # Example
/// ```
/// use arbortree::ArenaStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = ArenaStats::new();
/// stats.splits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().splits, 1);
/// ```
#[derive(Debug)]
pub struct ArenaStats {
    /// Nodes handed out by the arena.
    pub nodes_allocated: AtomicU64,

    /// Nodes returned to the arena.
    pub nodes_freed: AtomicU64,

    /// Allocations refused because the arena was full.
    pub allocation_failures: AtomicU64,

    /// Leaves converted into branches.
    pub splits: AtomicU64,

    /// Branches collapsed into their only remaining child.
    pub collapses: AtomicU64,
}

impl ArenaStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            nodes_allocated: AtomicU64::new(0),
            nodes_freed: AtomicU64::new(0),
            allocation_failures: AtomicU64::new(0),
            splits: AtomicU64::new(0),
            collapses: AtomicU64::new(0),
        }
    }

    /// Nodes currently live according to the counters.
    pub fn live_nodes(&self) -> u64 {
        let allocated = self.nodes_allocated.load(Ordering::Relaxed);
        let freed = self.nodes_freed.load(Ordering::Relaxed);
        allocated.saturating_sub(freed)
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            nodes_allocated: self.nodes_allocated.load(Ordering::Relaxed),
            nodes_freed: self.nodes_freed.load(Ordering::Relaxed),
            allocation_failures: self.allocation_failures.load(Ordering::Relaxed),
            splits: self.splits.load(Ordering::Relaxed),
            collapses: self.collapses.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.nodes_allocated.store(0, Ordering::Relaxed);
        self.nodes_freed.store(0, Ordering::Relaxed);
        self.allocation_failures.store(0, Ordering::Relaxed);
        self.splits.store(0, Ordering::Relaxed);
        self.collapses.store(0, Ordering::Relaxed);
    }
}

impl Default for ArenaStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of arena statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub nodes_allocated: u64,
    pub nodes_freed: u64,
    pub allocation_failures: u64,
    pub splits: u64,
    pub collapses: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nodes: {} allocated, {} freed, {} refused | Splits: {} | Collapses: {}",
            self.nodes_allocated,
            self.nodes_freed,
            self.allocation_failures,
            self.splits,
            self.collapses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = ArenaStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert_eq!(stats.live_nodes(), 0);
    }

    #[test]
    fn test_live_nodes() {
        let stats = ArenaStats::new();
        stats.nodes_allocated.fetch_add(5, Ordering::Relaxed);
        stats.nodes_freed.fetch_add(2, Ordering::Relaxed);
        assert_eq!(stats.live_nodes(), 3);
    }

    #[test]
    fn test_stats_reset() {
        let stats = ArenaStats::new();
        stats.splits.fetch_add(3, Ordering::Relaxed);
        stats.collapses.fetch_add(1, Ordering::Relaxed);

        stats.reset();

        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = StatsSnapshot {
            nodes_allocated: 10,
            nodes_freed: 4,
            allocation_failures: 1,
            splits: 2,
            collapses: 1,
        };
        assert_eq!(
            snapshot.to_string(),
            "Nodes: 10 allocated, 4 freed, 1 refused | Splits: 2 | Collapses: 1"
        );
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(ArenaStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let stats_clone = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats_clone.nodes_allocated.fetch_add(1, Ordering::Relaxed);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().nodes_allocated, 1000);
    }
}
