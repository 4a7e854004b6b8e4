//! Automaton state back ends: dense matrix and sparse per-clause sequences.
//!
//! Both back ends expose the same read surface (`AutomatonStore`) to the
//! clause evaluator and the feedback engine; only the mutation paths differ,
//! and those live on each concrete type since Type Ia/Ib/II apply distinct
//! bookkeeping to each representation (see `crate::feedback`).

pub mod dense;
pub mod sparse;

pub use dense::DenseState;
pub use sparse::SparseState;

/// Shared query surface over a clause's automata, independent of back end.
pub trait AutomatonStore {
    /// Number of clauses this store was built for.
    fn num_clauses(&self) -> usize;

    /// `true` iff the automaton `ta_id` within `clause` is currently
    /// included (its state is at or above `mid_state`).
    fn action(&self, clause: usize, ta_id: u32) -> bool;

    /// `ta_id`s currently included in `clause`, strictly ascending.
    fn inclusions(&self, clause: usize) -> Vec<u32>;
}
