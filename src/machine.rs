//! Machine façades: construction, lifecycle, and the `train`/`predict`/
//! `evaluate` surface, one per representation.

use std::io::{BufWriter, Cursor, Write};

use crate::activation::OutputMode;
use crate::clause::evaluate_all;
use crate::error::{Result, TsetlinError};
use crate::feedback::{train_row_dense, train_row_sparse, Label};
use crate::hyperparams::Hyperparams;
use crate::persistence::{self, TrailingBlock, TrailingBlockStateless};
use crate::prng::Prng;
use crate::state::sparse::ActiveLiterals;
use crate::state::{AutomatonStore, DenseState, SparseState};
use crate::voting::sum_votes;

const DEFAULT_SEED: u32 = 42;

fn y_size_for(hp: &Hyperparams, mode: OutputMode) -> u32 {
    match mode {
        OutputMode::ClassIndex => 1,
        OutputMode::BinaryVector => hp.num_classes,
    }
}

fn shapes(hp: &Hyperparams, mode: OutputMode) -> (usize, usize) {
    let x_width = hp.num_literals as usize;
    let y_width = match mode {
        OutputMode::ClassIndex => 4,
        OutputMode::BinaryVector => hp.num_classes as usize,
    };
    (x_width, y_width)
}

/// Draws each `(clause, class)` weight independently as `+1` or `-1`.
fn init_weights(hp: &Hyperparams, rng: &mut Prng) -> Vec<i16> {
    (0..hp.num_clauses as usize * hp.num_classes as usize)
        .map(|_| if rng.next_f32() <= 0.5 { 1i16 } else { -1i16 })
        .collect()
}

fn label_from_bytes(mode: OutputMode, y_row: &[u8]) -> Label<'_> {
    match mode {
        OutputMode::ClassIndex => {
            let mut b = [0u8; 4];
            b.copy_from_slice(&y_row[..4]);
            Label::ClassIndex(u32::from_le_bytes(b))
        }
        OutputMode::BinaryVector => Label::BinaryVector(y_row),
    }
}

fn check_rows(buf_len: usize, row_width: usize, rows: usize, name: &str) -> Result<()> {
    let expected = row_width * rows;
    if buf_len != expected {
        return Err(TsetlinError::ShapeMismatch {
            reason: format!("{name} buffer is {buf_len} bytes, expected {expected} ({rows} rows of {row_width} bytes)"),
        });
    }
    Ok(())
}

fn read_whole_file(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| TsetlinError::io("opening file", e))
}

fn matches_rows(y_pred: &[u8], y: &[u8], yw: usize, rows: usize) -> usize {
    (0..rows)
        .filter(|&row| y_pred[row * yw..(row + 1) * yw] == y[row * yw..(row + 1) * yw])
        .count()
}

/// The canonical dense representation: every automaton is materialized.
pub struct DenseMachine {
    hp: Hyperparams,
    mode: OutputMode,
    store: DenseState,
    weights: Vec<i16>,
    rng: Prng,
}

impl DenseMachine {
    pub fn create(hp: Hyperparams, mode: OutputMode, seed: u32) -> Result<Self> {
        mode.validate_y_size(y_size_for(&hp, mode), hp.num_classes)?;
        let mut rng = Prng::seed(seed);
        let store = DenseState::new(&hp, &mut rng);
        let weights = init_weights(&hp, &mut rng);
        log::debug!("created dense machine: K={} L={} C={}", hp.num_clauses, hp.num_literals, hp.num_classes);
        Ok(Self { hp, mode, store, weights, rng })
    }

    pub fn hyperparams(&self) -> &Hyperparams {
        &self.hp
    }

    /// Direct access for tests/scenario setup that overwrite state or
    /// weights wholesale (spec.md's S1–S6 construct a machine this way).
    pub fn set_state(&mut self, store: DenseState) {
        self.store = store;
    }

    pub fn set_weights(&mut self, weights: Vec<i16>) {
        self.weights = weights;
    }

    /// Exposes the underlying store for cross-representation test oracles.
    pub fn state_for_tests(&self) -> &DenseState {
        &self.store
    }

    pub fn train(&mut self, x: &[u8], y: &[u8], rows: usize, epochs: usize) -> Result<()> {
        let (xw, yw) = shapes(&self.hp, self.mode);
        check_rows(x.len(), xw, rows, "X")?;
        check_rows(y.len(), yw, rows, "y")?;
        for epoch in 0..epochs {
            for row in 0..rows {
                let x_row = &x[row * xw..(row + 1) * xw];
                let y_row = &y[row * yw..(row + 1) * yw];
                let label = label_from_bytes(self.mode, y_row);
                train_row_dense(&self.hp, &mut self.store, &mut self.weights, x_row, &label, &mut self.rng);
            }
            log::debug!("dense machine: epoch {} of {} complete", epoch + 1, epochs);
        }
        Ok(())
    }

    pub fn predict(&self, x: &[u8], y_pred: &mut [u8], rows: usize) -> Result<()> {
        let (xw, yw) = shapes(&self.hp, self.mode);
        check_rows(x.len(), xw, rows, "X")?;
        check_rows(y_pred.len(), yw, rows, "y_pred")?;
        let mid = self.hp.mid_state() as i32;
        for row in 0..rows {
            let x_row = &x[row * xw..(row + 1) * xw];
            let out_row = &mut y_pred[row * yw..(row + 1) * yw];
            let clause_output = evaluate_all(&self.store, x_row, true);
            let votes = sum_votes(&clause_output, &self.weights, self.hp.num_classes as usize, self.hp.threshold);
            self.mode.apply(&votes, mid, out_row);
        }
        Ok(())
    }

    pub fn evaluate(&self, x: &[u8], y: &[u8], rows: usize) -> Result<(usize, f64)> {
        let (_, yw) = shapes(&self.hp, self.mode);
        check_rows(y.len(), yw, rows, "y")?;
        let mut y_pred = vec![0u8; yw * rows];
        self.predict(x, &mut y_pred, rows)?;
        let matches = matches_rows(&y_pred, y, yw, rows);
        Ok((matches, matches as f64 / rows as f64))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| TsetlinError::io("creating file", e))?;
        let mut w = BufWriter::new(file);
        persistence::write_header(&mut w, &self.hp)?;
        persistence::write_weights(&mut w, &self.weights)?;
        persistence::write_dense_block(&mut w, &self.store.to_flat())?;
        w.flush().map_err(|e| TsetlinError::io("flushing file", e))?;
        log::info!("saved dense machine to {path}");
        Ok(())
    }

    pub fn load(path: &str, mode: OutputMode, seed: Option<u32>) -> Result<Self> {
        let buf = read_whole_file(path)?;
        let mut cur = Cursor::new(&buf);
        let hp = persistence::read_header(&mut cur)?;
        let weights = persistence::read_weights(&mut cur, hp.num_clauses as usize * hp.num_classes as usize)?;
        let pos = cur.position();
        let expected_len = hp.num_clauses as usize * hp.num_literals as usize * 2;
        let flat = persistence::read_dense_block(&mut cur, (buf.len() as u64 - pos) as usize)?;
        if flat.len() != expected_len {
            return Err(TsetlinError::CorruptModel {
                reason: format!("dense state has {} bytes, expected {expected_len}", flat.len()),
            });
        }
        let store = DenseState::from_flat(&hp, &flat);
        let rng = Prng::seed(seed.unwrap_or(DEFAULT_SEED));
        log::info!("loaded dense machine from {path}");
        Ok(Self { hp, mode, store, weights, rng })
    }

    pub fn free(self) {
        drop(self);
    }
}

/// Sparse representation: only materialized automata are stored; supports
/// growth (Type II) and pruning (`sparse_min_state`).
pub struct SparseMachine {
    hp: Hyperparams,
    mode: OutputMode,
    store: SparseState,
    active: ActiveLiterals,
    weights: Vec<i16>,
    rng: Prng,
}

impl SparseMachine {
    pub fn create(hp: Hyperparams, mode: OutputMode, seed: u32) -> Result<Self> {
        mode.validate_y_size(y_size_for(&hp, mode), hp.num_classes)?;
        let store = SparseState::new(&hp);
        let active = ActiveLiterals::new(&hp);
        let mut rng = Prng::seed(seed);
        let weights = init_weights(&hp, &mut rng);
        log::debug!("created sparse machine: K={} L={} C={}", hp.num_clauses, hp.num_literals, hp.num_classes);
        Ok(Self { hp, mode, store, active, weights, rng })
    }

    pub fn hyperparams(&self) -> &Hyperparams {
        &self.hp
    }

    /// Exposes the underlying store for cross-representation test oracles.
    pub fn state_for_tests(&self) -> &SparseState {
        &self.store
    }

    pub fn train(&mut self, x: &[u8], y: &[u8], rows: usize, epochs: usize) -> Result<()> {
        let (xw, yw) = shapes(&self.hp, self.mode);
        check_rows(x.len(), xw, rows, "X")?;
        check_rows(y.len(), yw, rows, "y")?;
        for epoch in 0..epochs {
            for row in 0..rows {
                let x_row = &x[row * xw..(row + 1) * xw];
                let y_row = &y[row * yw..(row + 1) * yw];
                let label = label_from_bytes(self.mode, y_row);
                train_row_sparse(
                    &self.hp,
                    &mut self.store,
                    &mut self.active,
                    &mut self.weights,
                    x_row,
                    &label,
                    &mut self.rng,
                );
            }
            log::debug!("sparse machine: epoch {} of {} complete", epoch + 1, epochs);
        }
        Ok(())
    }

    pub fn predict(&self, x: &[u8], y_pred: &mut [u8], rows: usize) -> Result<()> {
        let (xw, yw) = shapes(&self.hp, self.mode);
        check_rows(x.len(), xw, rows, "X")?;
        check_rows(y_pred.len(), yw, rows, "y_pred")?;
        let mid = self.hp.mid_state() as i32;
        for row in 0..rows {
            let x_row = &x[row * xw..(row + 1) * xw];
            let out_row = &mut y_pred[row * yw..(row + 1) * yw];
            let clause_output = evaluate_all(&self.store, x_row, true);
            let votes = sum_votes(&clause_output, &self.weights, self.hp.num_classes as usize, self.hp.threshold);
            self.mode.apply(&votes, mid, out_row);
        }
        Ok(())
    }

    pub fn evaluate(&self, x: &[u8], y: &[u8], rows: usize) -> Result<(usize, f64)> {
        let (_, yw) = shapes(&self.hp, self.mode);
        check_rows(y.len(), yw, rows, "y")?;
        let mut y_pred = vec![0u8; yw * rows];
        self.predict(x, &mut y_pred, rows)?;
        let matches = matches_rows(&y_pred, y, yw, rows);
        Ok((matches, matches as f64 / rows as f64))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| TsetlinError::io("creating file", e))?;
        let mut w = BufWriter::new(file);
        persistence::write_header(&mut w, &self.hp)?;
        persistence::write_weights(&mut w, &self.weights)?;
        let num_clauses = self.hp.num_clauses as usize;
        persistence::write_sparse_block(&mut w, num_clauses, |clause| {
            self.store
                .inclusions(clause)
                .into_iter()
                .map(|id| (id, self.store.get(clause, id).expect("inclusion is materialized")))
                .collect()
        })?;
        w.flush().map_err(|e| TsetlinError::io("flushing file", e))?;
        log::info!("saved sparse machine to {path}");
        Ok(())
    }

    /// Loads either a native sparse-format file or a dense-format file
    /// (cross-loading: every dense cell with action=1 is materialized at
    /// its original state).
    pub fn load(path: &str, mode: OutputMode, seed: Option<u32>) -> Result<Self> {
        let buf = read_whole_file(path)?;
        let mut cur = Cursor::new(&buf);
        let hp = persistence::read_header(&mut cur)?;
        let weights = persistence::read_weights(&mut cur, hp.num_clauses as usize * hp.num_classes as usize)?;
        let pos = cur.position();
        let remaining = buf.len() as u64 - pos;
        let store = match persistence::read_sparse_capable_block(&mut cur, &hp, remaining)? {
            TrailingBlock::Dense(flat) => {
                let dense = DenseState::from_flat(&hp, &flat);
                SparseState::from_dense_inclusions(&hp, &dense)
            }
            TrailingBlock::Sparse(rows) => SparseState::from_tagged(&hp, rows),
        };
        let active = ActiveLiterals::new(&hp);
        let rng = Prng::seed(seed.unwrap_or(DEFAULT_SEED));
        log::info!("loaded sparse machine from {path}");
        Ok(Self { hp, mode, store, active, weights, rng })
    }

    pub fn free(self) {
        drop(self);
    }
}

pub(crate) struct StatelessStore {
    clauses: Vec<Vec<u32>>,
}

impl AutomatonStore for StatelessStore {
    fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    fn action(&self, clause: usize, ta_id: u32) -> bool {
        self.clauses[clause].binary_search(&ta_id).is_ok()
    }

    fn inclusions(&self, clause: usize) -> Vec<u32> {
        self.clauses[clause].clone()
    }
}

/// Inference-only projection of a trained model: the inclusion set only,
/// no automaton state integers.
pub struct StatelessMachine {
    hp: Hyperparams,
    mode: OutputMode,
    store: StatelessStore,
    weights: Vec<i16>,
}

impl StatelessMachine {
    pub fn hyperparams(&self) -> &Hyperparams {
        &self.hp
    }

    pub fn predict(&self, x: &[u8], y_pred: &mut [u8], rows: usize) -> Result<()> {
        let (xw, yw) = shapes(&self.hp, self.mode);
        check_rows(x.len(), xw, rows, "X")?;
        check_rows(y_pred.len(), yw, rows, "y_pred")?;
        let mid = self.hp.mid_state() as i32;
        for row in 0..rows {
            let x_row = &x[row * xw..(row + 1) * xw];
            let out_row = &mut y_pred[row * yw..(row + 1) * yw];
            let clause_output = evaluate_all(&self.store, x_row, true);
            let votes = sum_votes(&clause_output, &self.weights, self.hp.num_classes as usize, self.hp.threshold);
            self.mode.apply(&votes, mid, out_row);
        }
        Ok(())
    }

    pub fn evaluate(&self, x: &[u8], y: &[u8], rows: usize) -> Result<(usize, f64)> {
        let (_, yw) = shapes(&self.hp, self.mode);
        check_rows(y.len(), yw, rows, "y")?;
        let mut y_pred = vec![0u8; yw * rows];
        self.predict(x, &mut y_pred, rows)?;
        let matches = matches_rows(&y_pred, y, yw, rows);
        Ok((matches, matches as f64 / rows as f64))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| TsetlinError::io("creating file", e))?;
        let mut w = BufWriter::new(file);
        persistence::write_header(&mut w, &self.hp)?;
        persistence::write_weights(&mut w, &self.weights)?;
        let num_clauses = self.hp.num_clauses as usize;
        persistence::write_stateless_block(&mut w, num_clauses, |clause| self.store.clauses[clause].clone())?;
        w.flush().map_err(|e| TsetlinError::io("flushing file", e))?;
        log::info!("saved stateless machine to {path}");
        Ok(())
    }

    /// Loads a native stateless file, a native sparse file (discarding
    /// state), or a dense file (discarding state).
    pub fn load(path: &str, mode: OutputMode) -> Result<Self> {
        let buf = read_whole_file(path)?;
        let mut cur = Cursor::new(&buf);
        let hp = persistence::read_header(&mut cur)?;
        let weights = persistence::read_weights(&mut cur, hp.num_clauses as usize * hp.num_classes as usize)?;
        let pos = cur.position();
        let remaining = buf.len() as u64 - pos;
        let clauses = match persistence::read_stateless_capable_block(&mut cur, &hp, remaining)? {
            TrailingBlockStateless::Dense(flat) => {
                let dense = DenseState::from_flat(&hp, &flat);
                (0..hp.num_clauses as usize).map(|k| dense.inclusions(k)).collect()
            }
            TrailingBlockStateless::Stateless(rows) => rows,
        };
        log::info!("loaded stateless machine from {path}");
        Ok(Self { hp, mode, store: StatelessStore { clauses }, weights })
    }

    /// Builds a stateless projection directly from a trained sparse
    /// machine, without a save/load round trip.
    pub fn from_sparse(sparse: &SparseMachine) -> Self {
        let clauses = (0..sparse.hp.num_clauses as usize).map(|k| sparse.store.inclusions(k)).collect();
        Self {
            hp: sparse.hp,
            mode: sparse.mode,
            store: StatelessStore { clauses },
            weights: sparse.weights.clone(),
        }
    }

    pub fn free(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s1_machine() -> DenseMachine {
        let hp = Hyperparams::new(1, 1, 3, 100, 127, -127, false, 10.0).unwrap();
        let mut m = DenseMachine::create(hp, OutputMode::BinaryVector, 42).unwrap();
        m.set_state(DenseState::from_flat(&hp, &[1, -1, -1, 1, -1, -1]));
        m.set_weights(vec![1]);
        m
    }

    #[test]
    fn s1_fixed_clause_inference() {
        let m = s1_machine();
        let mut out = [0u8; 1];
        m.predict(&[1, 0, 0], &mut out, 1).unwrap();
        assert_eq!(out, [1]);
        m.predict(&[1, 1, 0], &mut out, 1).unwrap();
        assert_eq!(out, [0]);
    }

    #[test]
    fn s2_training_reverses_prediction() {
        let mut m = s1_machine();
        let mut out = [0u8; 1];
        m.predict(&[1, 0, 1], &mut out, 1).unwrap();
        assert_eq!(out, [1]);
        m.train(&[1, 0, 1], &[0], 1, 10).unwrap();
        m.predict(&[1, 0, 1], &mut out, 1).unwrap();
        assert_eq!(out, [0]);
    }

    #[test]
    fn save_then_load_dense_round_trips() {
        let m = s1_machine();
        let path = std::env::temp_dir().join(format!("tsetlin_test_{}.bin", std::process::id()));
        let path = path.to_str().unwrap();
        m.save(path).unwrap();
        let loaded = DenseMachine::load(path, OutputMode::BinaryVector, Some(42)).unwrap();
        assert_eq!(loaded.store.to_flat(), m.store.to_flat());
        assert_eq!(loaded.weights, m.weights);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_mismatched_x_shape() {
        let m = s1_machine();
        let mut out = [0u8; 1];
        let err = m.predict(&[1, 0], &mut out, 1);
        assert!(err.is_err());
    }
}
