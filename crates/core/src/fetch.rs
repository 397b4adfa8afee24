//! Fetch state machine and stale-response guard shared by the list views.

use crate::models::PageMeta;

/// Lifecycle of one list request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    /// A request is in flight.
    Loading,
    /// The last request succeeded.
    Success {
        /// Fetched items in display order.
        items: Vec<T>,
        /// Pagination data reported by the server.
        meta: PageMeta,
    },
    /// The last request failed with a user-facing message.
    Error(String),
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> FetchState<T> {
    /// True while a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Items of a successful fetch; empty otherwise.
    pub fn items(&self) -> &[T] {
        match self {
            Self::Success { items, .. } => items,
            _ => &[],
        }
    }

    /// Mutable items of a successful fetch, for optimistic local updates.
    pub fn items_mut(&mut self) -> Option<&mut Vec<T>> {
        match self {
            Self::Success { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Pagination data of a successful fetch.
    pub fn meta(&self) -> Option<PageMeta> {
        match self {
            Self::Success { meta, .. } => Some(*meta),
            _ => None,
        }
    }

    /// Error message, if the last fetch failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Identifies one issued request. Only the newest ticket may apply a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    /// Monotonic sequence number of the request.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Hands out tickets and remembers which one is current.
#[derive(Debug, Default)]
pub struct RequestTracker {
    current: u64,
}

impl RequestTracker {
    /// Start a new request, superseding every earlier ticket.
    pub fn begin(&mut self) -> Ticket {
        self.current += 1;
        Ticket {
            generation: self.current,
        }
    }

    /// True when `ticket` belongs to the most recent request.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_tickets_supersede_older_ones() {
        let mut tracker = RequestTracker::default();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn accessors_follow_variant() {
        let mut state = FetchState::Success {
            items: vec![1, 2],
            meta: PageMeta::single(),
        };
        assert_eq!(state.items(), &[1, 2]);
        if let Some(items) = state.items_mut() {
            items.push(3);
        }
        assert_eq!(state.items().len(), 3);
        assert_eq!(state.meta(), Some(PageMeta::single()));

        let failed: FetchState<u8> = FetchState::Error("boom".to_string());
        assert!(failed.items().is_empty());
        assert_eq!(failed.error(), Some("boom"));
        assert!(FetchState::<u8>::default().is_loading());
    }
}
