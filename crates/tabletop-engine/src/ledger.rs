//! Deduplication and sequencing.
//!
//! Both live in one struct because they must move together: a key is
//! recorded as processed in the same step that reserves its sequence
//! number, so no key can ever be associated with two different seqs and
//! no seq is ever handed out without a key.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

use tabletop_protocol::ClientId;

/// Result of [`Ledger::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The key is new; this seq now belongs to it permanently.
    Accepted(u64),
    /// The key has been seen before. The caller must do nothing at all.
    AlreadyProcessed,
}

/// Records which `(client_id, event_id)` pairs have taken effect and
/// hands out the global sequence.
///
/// Sequence numbers start at 1 and increase by exactly one per accepted
/// key. By default entries are kept forever. With a retention limit the
/// oldest keys are forgotten first once the limit is exceeded; a
/// forgotten key that is retransmitted would be accepted again.
#[derive(Debug, Default)]
pub struct Ledger {
    last_seq: u64,
    // Nested so lookups can borrow `&str` instead of building a key.
    entries: HashMap<ClientId, HashMap<String, u64>>,
    len: usize,
    retention: Option<NonZeroUsize>,
    // Admission order; only maintained when `retention` is set.
    order: VecDeque<(ClientId, String)>,
}

impl Ledger {
    /// An unbounded ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger that remembers at most `retention` keys, or every key
    /// when `None`.
    pub fn with_retention(retention: Option<NonZeroUsize>) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    /// Returns `true` if this key already took effect.
    pub fn is_processed(&self, client_id: &ClientId, event_id: &str) -> bool {
        self.seq_for(client_id, event_id).is_some()
    }

    /// The seq assigned to a key, if it has one.
    pub fn seq_for(&self, client_id: &ClientId, event_id: &str) -> Option<u64> {
        self.entries.get(client_id)?.get(event_id).copied()
    }

    /// Reserves the next seq for a new key, or reports a duplicate.
    pub fn admit(&mut self, client_id: &ClientId, event_id: &str) -> Admission {
        if self.is_processed(client_id, event_id) {
            return Admission::AlreadyProcessed;
        }

        self.last_seq += 1;
        let seq = self.last_seq;
        self.entries
            .entry(client_id.clone())
            .or_default()
            .insert(event_id.to_owned(), seq);
        self.len += 1;

        if let Some(limit) = self.retention {
            self.order.push_back((client_id.clone(), event_id.to_owned()));
            while self.len > limit.get() {
                self.evict_oldest();
            }
        }

        Admission::Accepted(seq)
    }

    /// The most recently assigned seq, or 0 before the first admission.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Number of keys currently remembered.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn evict_oldest(&mut self) {
        let Some((client_id, event_id)) = self.order.pop_front() else {
            return;
        };
        if let Some(per_client) = self.entries.get_mut(&client_id) {
            if per_client.remove(&event_id).is_some() {
                self.len -= 1;
            }
            if per_client.is_empty() {
                self.entries.remove(&client_id);
            }
        }
        tracing::trace!(%client_id, event_id, "dedup entry evicted");
    }
}
