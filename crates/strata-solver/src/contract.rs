//! Contracts: base obligations inherited across multiple-inheritance fan-in.
//!
//! A phrase reached through several inheriting branches (a diamond in the
//! inheritance lattice) must end up inheriting everything each branch's
//! declaration at that position inherits. The contract of an explicit node
//! is the set of those requirements not yet covered by its own bases.
//!
//! ```text
//! Left
//!   Slot : X
//! Right
//!   Slot : Y
//! Both : Left, Right
//!   Slot : X      // contract {X, Y} -> {Y}
//! ```
//!
//! Conditions only ever move from unsatisfied to satisfied.

use crate::cache::{FxIndexSet, ParallelCache};
use crate::parallel::ParallelId;
use crate::recursion::{RecursionGuard, RecursionProfile};
use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Contract {
    unsatisfied: FxIndexSet<ParallelId>,
    satisfied: FxIndexSet<ParallelId>,
}

impl Contract {
    /// Collect the own bases of every explicit node contributing to
    /// `owner`, recursing through implicit contributors.
    pub fn build(cache: &ParallelCache, owner: ParallelId, profile: RecursionProfile) -> Self {
        let mut contract = Self::default();
        let mut guard = RecursionGuard::with_profile(profile);
        for &contributor in cache.node(owner).contributors() {
            contract.collect(cache, owner, contributor, &mut guard);
        }
        contract
    }

    fn collect(
        &mut self,
        cache: &ParallelCache,
        owner: ParallelId,
        contributor: ParallelId,
        guard: &mut RecursionGuard<ParallelId>,
    ) {
        if !guard.enter(contributor).is_entered() {
            return;
        }
        let node = cache.node(contributor);
        if node.is_explicit() {
            for (base, _) in node.bases() {
                if base != owner {
                    self.unsatisfied.insert(base);
                }
            }
        } else {
            for &nested in node.contributors() {
                self.collect(cache, owner, nested, guard);
            }
        }
        guard.leave(contributor);
    }

    /// Satisfy every outstanding condition found in `candidate`'s base
    /// closure. Returns how many were satisfied.
    pub fn try_satisfy_condition(&mut self, cache: &ParallelCache, candidate: ParallelId) -> usize {
        if self.unsatisfied.is_empty() {
            return 0;
        }
        let closure = cache.base_closure(candidate);
        let satisfied = &mut self.satisfied;
        let mut count = 0;
        self.unsatisfied.retain(|&condition| {
            if closure.contains(&condition) {
                satisfied.insert(condition);
                count += 1;
                false
            } else {
                true
            }
        });
        if count > 0 {
            trace!(candidate = ?candidate, satisfied = count, "contract conditions satisfied");
        }
        count
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = ParallelId> + '_ {
        self.unsatisfied.iter().copied()
    }

    pub fn satisfied(&self) -> impl Iterator<Item = ParallelId> + '_ {
        self.satisfied.iter().copied()
    }

    #[inline]
    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied.is_empty()
    }
}

/// Contract slots, one per node, filled lazily.
#[derive(Clone, Debug, Default)]
pub struct ContractTable {
    slots: Vec<Option<Contract>>,
}

impl ContractTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, id: ParallelId) -> Option<&Contract> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ParallelId) -> Option<&mut Contract> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    #[inline]
    pub fn is_built(&self, id: ParallelId) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, id: ParallelId, contract: Contract) {
        let index = id.0 as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(contract);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParallelId, &Contract)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (ParallelId(i as u32), c)))
    }
}

#[cfg(test)]
#[path = "tests/contract_tests.rs"]
mod tests;
