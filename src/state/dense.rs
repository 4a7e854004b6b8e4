//! Dense automaton state: a contiguous `(clause, literal, polarity)` matrix.

use ndarray::Array3;

use crate::hyperparams::Hyperparams;
use crate::prng::Prng;
use crate::state::AutomatonStore;

/// Contiguous `(K, L, 2)` signed-8-bit cells, indexed `[clause, literal, polarity]`.
#[derive(Debug, Clone)]
pub struct DenseState {
    cells: Array3<i8>,
    mid_state: i8,
}

impl DenseState {
    /// Builds a freshly initialized dense store: for each `(clause, literal)`
    /// a fair coin decides whether the positive or negative polarity starts
    /// one step above `mid_state`, giving every clause a 50/50 mix of
    /// marginally-included literals at the boundary.
    pub fn new(hp: &Hyperparams, rng: &mut Prng) -> Self {
        let k = hp.num_clauses as usize;
        let l = hp.num_literals as usize;
        let mid = hp.mid_state();
        let mut cells = Array3::<i8>::zeros((k, l, 2));
        for clause in 0..k {
            for literal in 0..l {
                if rng.next_u32() & 1 == 0 {
                    cells[[clause, literal, 0]] = mid - 1;
                    cells[[clause, literal, 1]] = mid;
                } else {
                    cells[[clause, literal, 0]] = mid;
                    cells[[clause, literal, 1]] = mid - 1;
                }
            }
        }
        Self { cells, mid_state: mid }
    }

    /// Rebuilds a dense store directly from a flat on-disk state buffer,
    /// indexed `(((k*L)+l)*2)+p`, as written by the persistence layer.
    pub fn from_flat(hp: &Hyperparams, flat: &[i8]) -> Self {
        let k = hp.num_clauses as usize;
        let l = hp.num_literals as usize;
        let cells = Array3::from_shape_vec((k, l, 2), flat.to_vec())
            .expect("flat state buffer sized by caller to (k, l, 2)");
        Self { cells, mid_state: hp.mid_state() }
    }

    /// Flattens the store back to the on-disk layout `(((k*L)+l)*2)+p`.
    pub fn to_flat(&self) -> Vec<i8> {
        self.cells.iter().copied().collect()
    }

    pub fn state(&self, clause: usize, literal: usize, polarity: usize) -> i8 {
        self.cells[[clause, literal, polarity]]
    }

    pub fn set_state(&mut self, clause: usize, literal: usize, polarity: usize, state: i8) {
        self.cells[[clause, literal, polarity]] = state;
    }

    pub fn num_literals(&self) -> usize {
        self.cells.shape()[1]
    }

    /// Applies a saturating delta and returns the resulting state.
    pub fn bump(&mut self, clause: usize, literal: usize, polarity: usize, delta: i8, min: i8, max: i8) -> i8 {
        let cur = self.cells[[clause, literal, polarity]] as i32;
        let next = (cur + delta as i32).clamp(min as i32, max as i32) as i8;
        self.cells[[clause, literal, polarity]] = next;
        next
    }
}

impl AutomatonStore for DenseState {
    fn num_clauses(&self) -> usize {
        self.cells.shape()[0]
    }

    fn action(&self, clause: usize, ta_id: u32) -> bool {
        let literal = (ta_id / 2) as usize;
        let polarity = (ta_id % 2) as usize;
        self.cells[[clause, literal, polarity]] >= self.mid_state
    }

    fn inclusions(&self, clause: usize) -> Vec<u32> {
        let l = self.num_literals();
        let mut out = Vec::new();
        for literal in 0..l {
            for polarity in 0..2 {
                if self.cells[[clause, literal, polarity]] >= self.mid_state {
                    out.push((2 * literal + polarity) as u32);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp() -> Hyperparams {
        Hyperparams::new(2, 4, 3, 100, 127, -127, false, 3.0).unwrap()
    }

    #[test]
    fn fresh_store_has_one_inclusion_per_literal() {
        let hp = hp();
        let mut rng = Prng::seed(1);
        let store = DenseState::new(&hp, &mut rng);
        for clause in 0..hp.num_clauses as usize {
            let incl = store.inclusions(clause);
            // Exactly one polarity per literal sits at mid_state (included);
            // the other sits at mid_state - 1 (excluded).
            assert_eq!(incl.len(), hp.num_literals as usize);
        }
    }

    #[test]
    fn flat_round_trips() {
        let hp = hp();
        let mut rng = Prng::seed(9);
        let store = DenseState::new(&hp, &mut rng);
        let flat = store.to_flat();
        let restored = DenseState::from_flat(&hp, &flat);
        assert_eq!(flat, restored.to_flat());
    }

    #[test]
    fn bump_saturates() {
        let hp = hp();
        let mut rng = Prng::seed(1);
        let mut store = DenseState::new(&hp, &mut rng);
        store.set_state(0, 0, 0, 126);
        let v = store.bump(0, 0, 0, 1, hp.min_state, hp.max_state);
        assert_eq!(v, 127);
        let v = store.bump(0, 0, 0, 1, hp.min_state, hp.max_state);
        assert_eq!(v, 127);
    }
}
