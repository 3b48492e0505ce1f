//! Render generations.
//!
//! Every render takes a ticket; only the holder of the newest ticket may
//! touch the outlet or commit a location. Older renders run to completion
//! and have their results dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic render counter.
#[derive(Debug, Clone, Default)]
pub struct RenderGeneration {
    latest: Arc<AtomicU64>,
}

impl RenderGeneration {
    /// Creates a counter that has handed out no tickets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a render, superseding every earlier ticket.
    pub fn start(&self) -> RenderTicket {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RenderTicket {
            id,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Id of the newest ticket, 0 before the first render.
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Permission for one render to commit, valid until a newer render starts.
#[derive(Debug, Clone)]
pub struct RenderTicket {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl RenderTicket {
    /// The render id; the first render of a router has id 1.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns whether no newer render has started.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes() {
        let generation = RenderGeneration::new();
        assert_eq!(generation.latest(), 0);

        let first = generation.start();
        assert_eq!(first.id(), 1);
        assert!(first.is_current());

        let second = generation.start();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(generation.latest(), 2);
    }
}
