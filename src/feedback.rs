//! The feedback engine: Type Ia/Ib/II kernels, the per-row training step,
//! and the two class-sampling variants that pick which classes receive
//! feedback.

use crate::clause::evaluate_all;
use crate::hyperparams::Hyperparams;
use crate::prng::Prng;
use crate::state::sparse::ActiveLiterals;
use crate::state::{AutomatonStore, DenseState, SparseState};
use crate::voting::sum_votes;

/// One training row's label, in either of the two supported shapes.
pub enum Label<'a> {
    /// `y_size = 1`: a single class id.
    ClassIndex(u32),
    /// `y_size = num_classes`: a one-hot-or-more membership vector.
    BinaryVector(&'a [u8]),
}

fn roll(rng: &mut Prng, probability: f64) -> bool {
    (rng.next_f32() as f64) <= probability
}

/// Draws an index from `candidates` weighted by `clip(votes[c], T) + T`
/// (always nonnegative since votes are pre-clipped). Returns `None` if the
/// candidate set is empty or every weight is zero.
fn weighted_pick(candidates: &[usize], votes: &[i32], threshold: i32, rng: &mut Prng) -> Option<usize> {
    let weights: Vec<u32> = candidates.iter().map(|&c| (votes[c] + threshold) as u32).collect();
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return None;
    }
    let draw = rng.next_below(total);
    let mut cumulative = 0u32;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > draw {
            return Some(candidates[i]);
        }
    }
    candidates.last().copied()
}

/// Selects the positive and negative classes for this row, per §4.5.3.
/// Either half may come back `None`, in which case that half of feedback
/// is skipped for the row.
pub fn select_classes(label: &Label, votes: &[i32], hp: &Hyperparams, rng: &mut Prng) -> (Option<usize>, Option<usize>) {
    let num_classes = hp.num_classes as usize;
    match label {
        Label::ClassIndex(y) => {
            let c_plus = *y as usize;
            let others: Vec<usize> = (0..num_classes).filter(|&c| c != c_plus).collect();
            let c_minus = weighted_pick(&others, votes, hp.threshold, rng);
            (Some(c_plus), c_minus)
        }
        Label::BinaryVector(y) => {
            let positives: Vec<usize> = (0..num_classes).filter(|&c| y[c] != 0).collect();
            let negatives: Vec<usize> = (0..num_classes).filter(|&c| y[c] == 0).collect();
            let c_plus = weighted_pick(&positives, votes, hp.threshold, rng);
            let c_minus = weighted_pick(&negatives, votes, hp.threshold, rng);
            (c_plus, c_minus)
        }
    }
}

fn away_from_zero(w: i16) -> i16 {
    if w >= 0 {
        w.saturating_add(1)
    } else {
        w.saturating_sub(1)
    }
}

fn toward_zero(w: i16, is_positive: bool) -> i16 {
    match w.cmp(&0) {
        std::cmp::Ordering::Greater => w - 1,
        std::cmp::Ordering::Less => w + 1,
        std::cmp::Ordering::Equal => {
            if is_positive {
                1
            } else {
                -1
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    TypeIa,
    TypeIb,
    TypeII,
    None,
}

fn dispatch(weight: i16, is_positive: bool, clause_active: bool) -> Kind {
    let vote_sign = weight >= 0;
    match (vote_sign == is_positive, clause_active) {
        (true, true) => Kind::TypeIa,
        (true, false) => Kind::TypeIb,
        (false, true) => Kind::TypeII,
        (false, false) => Kind::None,
    }
}

/// Runs one training row against a dense automaton store.
pub fn train_row_dense(
    hp: &Hyperparams,
    store: &mut DenseState,
    weights: &mut [i16],
    x: &[u8],
    label: &Label,
    rng: &mut Prng,
) {
    let clause_output = evaluate_all(store, x, false);
    let votes = sum_votes(&clause_output, weights, hp.num_classes as usize, hp.threshold);
    let (c_plus, c_minus) = select_classes(label, &votes, hp, rng);
    let num_classes = hp.num_classes as usize;

    if let Some(c) = c_plus {
        let p = (hp.threshold - votes[c]) as f64 / (2.0 * hp.threshold as f64);
        for k in 0..hp.num_clauses as usize {
            if roll(rng, p) {
                apply_dense(hp, store, weights, num_classes, k, c, x, true, clause_output[k], rng);
            }
        }
    }
    if let Some(c) = c_minus {
        let p = (votes[c] + hp.threshold) as f64 / (2.0 * hp.threshold as f64);
        for k in 0..hp.num_clauses as usize {
            if roll(rng, p) {
                apply_dense(hp, store, weights, num_classes, k, c, x, false, clause_output[k], rng);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_dense(
    hp: &Hyperparams,
    store: &mut DenseState,
    weights: &mut [i16],
    num_classes: usize,
    clause: usize,
    class: usize,
    x: &[u8],
    is_positive: bool,
    clause_active: bool,
    rng: &mut Prng,
) {
    let idx = clause * num_classes + class;
    match dispatch(weights[idx], is_positive, clause_active) {
        Kind::TypeIa => {
            weights[idx] = away_from_zero(weights[idx]);
            type1a_dense(hp, store, clause, x, rng);
        }
        Kind::TypeIb => {
            type1b_dense(hp, store, clause, rng);
        }
        Kind::TypeII => {
            weights[idx] = toward_zero(weights[idx], is_positive);
            type2_dense(hp, store, clause, x, rng);
        }
        Kind::None => {}
    }
}

/// Type Ia: clause active, vote agrees with label. Rewards literals whose
/// polarity matches the input bit, punishes the ones that don't.
pub fn type1a_dense(hp: &Hyperparams, store: &mut DenseState, clause: usize, x: &[u8], rng: &mut Prng) {
    let reward_prob = if hp.boost_true_positive_feedback { 1.0 } else { hp.s_m1_inv };
    for literal in 0..hp.num_literals as usize {
        let bit = x[literal];
        if bit == 1 {
            if roll(rng, reward_prob) {
                store.bump(clause, literal, 0, 1, hp.min_state, hp.max_state);
            }
        } else if roll(rng, hp.s_inv) {
            store.bump(clause, literal, 0, -1, hp.min_state, hp.max_state);
        }
        if bit == 0 {
            if roll(rng, reward_prob) {
                store.bump(clause, literal, 1, 1, hp.min_state, hp.max_state);
            }
        } else if roll(rng, hp.s_inv) {
            store.bump(clause, literal, 1, -1, hp.min_state, hp.max_state);
        }
    }
}

/// Type Ib: clause inactive, vote agrees with label. Punishes every TA with
/// probability `s_inv`, no weight change.
pub fn type1b_dense(hp: &Hyperparams, store: &mut DenseState, clause: usize, rng: &mut Prng) {
    for literal in 0..hp.num_literals as usize {
        for polarity in 0..2usize {
            if roll(rng, hp.s_inv) {
                store.bump(clause, literal, polarity, -1, hp.min_state, hp.max_state);
            }
        }
    }
}

/// Type II: clause active, vote disagrees with label. Grows inclusions that
/// would discriminate against this input.
pub fn type2_dense(hp: &Hyperparams, store: &mut DenseState, clause: usize, x: &[u8], rng: &mut Prng) {
    let _ = rng; // Type II's literal mutation is deterministic given (clause, X).
    for literal in 0..hp.num_literals as usize {
        for polarity in 0..2u32 {
            let ta_id = 2 * literal as u32 + polarity;
            if store.action(clause, ta_id) {
                continue;
            }
            if polarity == x[literal] as u32 {
                store.bump(clause, literal, polarity as usize, 1, hp.min_state, hp.max_state);
            }
        }
    }
}

/// Runs one training row against a sparse automaton store.
#[allow(clippy::too_many_arguments)]
pub fn train_row_sparse(
    hp: &Hyperparams,
    store: &mut SparseState,
    active: &mut ActiveLiterals,
    weights: &mut [i16],
    x: &[u8],
    label: &Label,
    rng: &mut Prng,
) {
    let clause_output = evaluate_all(store, x, false);
    let votes = sum_votes(&clause_output, weights, hp.num_classes as usize, hp.threshold);
    let (c_plus, c_minus) = select_classes(label, &votes, hp, rng);
    let num_classes = hp.num_classes as usize;

    if let Some(c) = c_plus {
        let p = (hp.threshold - votes[c]) as f64 / (2.0 * hp.threshold as f64);
        for k in 0..hp.num_clauses as usize {
            if roll(rng, p) {
                apply_sparse(hp, store, active, weights, num_classes, k, c, x, true, clause_output[k], rng);
            }
        }
    }
    if let Some(c) = c_minus {
        let p = (votes[c] + hp.threshold) as f64 / (2.0 * hp.threshold as f64);
        for k in 0..hp.num_clauses as usize {
            if roll(rng, p) {
                apply_sparse(hp, store, active, weights, num_classes, k, c, x, false, clause_output[k], rng);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_sparse(
    hp: &Hyperparams,
    store: &mut SparseState,
    active: &mut ActiveLiterals,
    weights: &mut [i16],
    num_classes: usize,
    clause: usize,
    class: usize,
    x: &[u8],
    is_positive: bool,
    clause_active: bool,
    rng: &mut Prng,
) {
    let idx = clause * num_classes + class;
    match dispatch(weights[idx], is_positive, clause_active) {
        Kind::TypeIa => {
            weights[idx] = away_from_zero(weights[idx]);
            type1a_sparse(hp, store, active, clause, class, x, rng);
        }
        Kind::TypeIb => {
            type1b_sparse(hp, store, clause, rng);
        }
        Kind::TypeII => {
            weights[idx] = toward_zero(weights[idx], is_positive);
            type2_sparse(hp, store, active, clause, class, x, rng);
        }
        Kind::None => {}
    }
}

/// Type Ia, sparse: only materialized automata are bumped; a literal whose
/// positive polarity would be rewarded but isn't materialized yet instead
/// licenses future Type II growth by setting its class active-literal bit.
pub fn type1a_sparse(
    hp: &Hyperparams,
    store: &mut SparseState,
    active: &mut ActiveLiterals,
    clause: usize,
    class: usize,
    x: &[u8],
    rng: &mut Prng,
) {
    let reward_prob = if hp.boost_true_positive_feedback { 1.0 } else { hp.s_m1_inv };
    for literal in 0..hp.num_literals as usize {
        let bit = x[literal];
        let (pos_id, neg_id) = Hyperparams::ta_ids(literal as u32);

        if bit == 1 {
            if store.get(clause, pos_id).is_some() {
                if roll(rng, reward_prob) {
                    store.bump(clause, pos_id, 1, hp);
                }
            } else if !active.is_set(class, literal) {
                active.set(class, literal);
            }
        } else if store.get(clause, pos_id).is_some() && roll(rng, hp.s_inv) {
            store.bump(clause, pos_id, -1, hp);
        }

        if bit == 0 {
            if store.get(clause, neg_id).is_some() && roll(rng, reward_prob) {
                store.bump(clause, neg_id, 1, hp);
            }
        } else if store.get(clause, neg_id).is_some() && roll(rng, hp.s_inv) {
            store.bump(clause, neg_id, -1, hp);
        }
    }
}

/// Type Ib, sparse: punishes already-materialized automata only; a result
/// below `sparse_min_state` removes the entry.
pub fn type1b_sparse(hp: &Hyperparams, store: &mut SparseState, clause: usize, rng: &mut Prng) {
    let materialized: Vec<u32> = store.entries(clause).iter().map(|&(id, _)| id).collect();
    for ta_id in materialized {
        if store.get(clause, ta_id).is_some() && roll(rng, hp.s_inv) {
            store.bump(clause, ta_id, -1, hp);
        }
    }
}

/// Type II, sparse: raises already-excluded materialized automata the same
/// way as the dense kernel; for non-materialized automata, only inserts a
/// new entry (at `sparse_init_state`) when the class's active-literal bit
/// licenses this literal.
pub fn type2_sparse(
    hp: &Hyperparams,
    store: &mut SparseState,
    active: &ActiveLiterals,
    clause: usize,
    class: usize,
    x: &[u8],
    rng: &mut Prng,
) {
    let _ = rng;
    for literal in 0..hp.num_literals as usize {
        for polarity in 0..2u32 {
            let ta_id = 2 * literal as u32 + polarity;
            if store.action(clause, ta_id) {
                continue;
            }
            if polarity != x[literal] as u32 {
                continue;
            }
            match store.get(clause, ta_id) {
                Some(_) => store.bump(clause, ta_id, 1, hp),
                None if active.is_set(class, literal) => {
                    store.upsert(clause, ta_id, hp.sparse_init_state());
                }
                None => {}
            }
        }
    }
}
