//! Deferral set: packets that reached their slice's turn but failed the feasibility check.
//!
//! Entries are keyed by [`PacketRef`] in a `BTreeMap`, so re-evaluation always walks them in
//! `(slice, packet)` order and the outcome never depends on insertion history.

use super::priority::Infeasibility;
use crate::packet::PacketRef;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct DeferralSet {
    entries: BTreeMap<PacketRef, Infeasibility>,
}

impl DeferralSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `id`, remembering the constraint it failed.
    pub fn defer(&mut self, id: PacketRef, reason: Infeasibility) {
        self.entries.insert(id, reason);
    }

    /// Re-evaluate every deferred packet and remove those that became admissible.
    ///
    /// `check` returns `Ok(value)` for an admissible packet, `Err(reason)` otherwise. Admissible
    /// packets are returned in `(slice, packet)` order together with `value`; the others stay
    /// deferred with their reason refreshed.
    pub fn readmit<T>(
        &mut self,
        mut check: impl FnMut(PacketRef) -> Result<T, Infeasibility>,
    ) -> Vec<(PacketRef, T)> {
        let mut admitted = Vec::new();
        self.entries.retain(|&id, reason| match check(id) {
            Ok(value) => {
                admitted.push((id, value));
                false
            }
            Err(latest) => {
                *reason = latest;
                true
            }
        });
        admitted
    }

    /// Remove and return every deferred packet with its last failure reason.
    pub fn drain(&mut self) -> impl Iterator<Item = (PacketRef, Infeasibility)> {
        std::mem::take(&mut self.entries).into_iter()
    }

    pub fn contains(&self, id: PacketRef) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
