//! Sparse automaton state: per-clause ordered sequences of materialized TAs.
//!
//! Only automata that have ever been touched by Type II feedback, or that
//! have not yet decayed below `sparse_min_state`, are stored. Everything
//! else is implicitly excluded at a state "just below `mid_state`".

use crate::hyperparams::Hyperparams;
use crate::state::AutomatonStore;

/// Per-clause ascending `(ta_id, state)` sequences.
#[derive(Debug, Clone)]
pub struct SparseState {
    clauses: Vec<Vec<(u32, i8)>>,
    mid_state: i8,
}

impl SparseState {
    /// Every clause starts empty: no automaton is materialized.
    pub fn new(hp: &Hyperparams) -> Self {
        Self {
            clauses: vec![Vec::new(); hp.num_clauses as usize],
            mid_state: hp.mid_state(),
        }
    }

    /// Builds a sparse store by materializing every dense cell whose action
    /// is 1 (the cross-loading path of the persistence layer), carrying the
    /// original dense state.
    pub fn from_dense_inclusions(hp: &Hyperparams, dense: &super::DenseState) -> Self {
        let mut clauses = Vec::with_capacity(hp.num_clauses as usize);
        for clause in 0..hp.num_clauses as usize {
            let mut entries = Vec::new();
            for literal in 0..hp.num_literals as usize {
                for polarity in 0..2usize {
                    let state = dense.state(clause, literal, polarity);
                    if state >= hp.mid_state() {
                        entries.push(((2 * literal + polarity) as u32, state));
                    }
                }
            }
            clauses.push(entries);
        }
        Self { clauses, mid_state: hp.mid_state() }
    }

    /// Rebuilds a sparse store from the tagged `(ta_id, state)` rows read
    /// back off disk by the persistence layer.
    pub fn from_tagged(hp: &Hyperparams, rows: Vec<Vec<(u32, i8)>>) -> Self {
        Self { clauses: rows, mid_state: hp.mid_state() }
    }

    /// Materialized entries for a clause, in ascending `ta_id` order.
    pub fn entries(&self, clause: usize) -> &[(u32, i8)] {
        &self.clauses[clause]
    }

    /// Current state of `ta_id` in `clause`, if materialized.
    pub fn get(&self, clause: usize, ta_id: u32) -> Option<i8> {
        let entries = &self.clauses[clause];
        entries
            .binary_search_by_key(&ta_id, |&(id, _)| id)
            .ok()
            .map(|i| entries[i].1)
    }

    /// Inserts a new entry (or overwrites an existing one) for `ta_id`,
    /// keeping the sequence strictly ascending by `ta_id`.
    pub fn upsert(&mut self, clause: usize, ta_id: u32, state: i8) {
        let entries = &mut self.clauses[clause];
        match entries.binary_search_by_key(&ta_id, |&(id, _)| id) {
            Ok(i) => entries[i].1 = state,
            Err(i) => entries.insert(i, (ta_id, state)),
        }
    }

    /// Removes `ta_id` from `clause` if materialized.
    pub fn remove(&mut self, clause: usize, ta_id: u32) {
        let entries = &mut self.clauses[clause];
        if let Ok(i) = entries.binary_search_by_key(&ta_id, |&(id, _)| id) {
            entries.remove(i);
        }
    }

    /// Applies a saturating delta to a materialized entry, removing it if
    /// the result falls strictly below `sparse_min_state`. No-op if absent.
    pub fn bump(&mut self, clause: usize, ta_id: u32, delta: i8, hp: &Hyperparams) {
        let entries = &mut self.clauses[clause];
        if let Ok(i) = entries.binary_search_by_key(&ta_id, |&(id, _)| id) {
            let next = (entries[i].1 as i32 + delta as i32).clamp(hp.min_state as i32, hp.max_state as i32) as i8;
            if next < hp.sparse_min_state() {
                entries.remove(i);
            } else {
                entries[i].1 = next;
            }
        }
    }

    pub fn len_for(&self, clause: usize) -> usize {
        self.clauses[clause].len()
    }
}

impl AutomatonStore for SparseState {
    fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn action(&self, clause: usize, ta_id: u32) -> bool {
        self.get(clause, ta_id).map(|s| s >= self.mid_state).unwrap_or(false)
    }

    fn inclusions(&self, clause: usize) -> Vec<u32> {
        self.clauses[clause]
            .iter()
            .filter(|&&(_, s)| s >= self.mid_state)
            .map(|&(id, _)| id)
            .collect()
    }
}

/// Per-class bitset over literals, gating Type II materialization.
///
/// Indexed `[class * num_literals + literal]`.
#[derive(Debug, Clone)]
pub struct ActiveLiterals {
    bits: Vec<bool>,
    num_literals: usize,
}

impl ActiveLiterals {
    pub fn new(hp: &Hyperparams) -> Self {
        Self {
            bits: vec![false; hp.num_classes as usize * hp.num_literals as usize],
            num_literals: hp.num_literals as usize,
        }
    }

    pub fn is_set(&self, class: usize, literal: usize) -> bool {
        self.bits[class * self.num_literals + literal]
    }

    pub fn set(&mut self, class: usize, literal: usize) {
        self.bits[class * self.num_literals + literal] = true;
    }
}
