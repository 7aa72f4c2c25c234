//! Sequenced list state.
//!
//! Lists shown to staff are copies of server truth and are replaced wholesale
//! by each successful fetch. Fetches can overlap (a slow search followed by a
//! fast one), so each fetch takes a ticket when it starts and its response is
//! only applied if no newer fetch has been answered already.

/// Position of a fetch in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// A value refreshed by possibly-overlapping fetches.
#[derive(Debug, Clone, Default)]
pub struct Sequenced<T> {
    issued: u64,
    /// Newest ticket whose response (value or failure) was accepted.
    settled: u64,
    loaded: bool,
    value: T,
}

impl<T> Sequenced<T> {
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            issued: 0,
            settled: 0,
            loaded: false,
            value,
        }
    }

    /// Take a ticket for a fetch that is about to be sent.
    pub const fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Whether a fetch issued after `ticket` has already been answered.
    #[must_use]
    pub const fn is_stale(&self, ticket: FetchTicket) -> bool {
        ticket.0 <= self.settled
    }

    /// Apply the response of the fetch holding `ticket`.
    ///
    /// Returns `false`, leaving the current value in place, when a fetch
    /// issued later has already been answered.
    pub fn apply(&mut self, ticket: FetchTicket, value: T) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        self.loaded = true;
        self.value = value;
        true
    }

    /// Record that the fetch holding `ticket` failed. The value is kept.
    ///
    /// Returns `false` when the failure is stale and should not be reported.
    pub fn fail(&mut self, ticket: FetchTicket) -> bool {
        self.settle(ticket)
    }

    fn settle(&mut self, ticket: FetchTicket) -> bool {
        if self.is_stale(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                settled = self.settled,
                "Discarding stale list response"
            );
            return false;
        }
        self.settled = ticket.0;
        true
    }

    /// Whether any fetch has been applied yet.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub const fn get(&self) -> &T {
        &self.value
    }

    /// Local, non-authoritative edits. Overwritten by the next applied fetch.
    pub const fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
