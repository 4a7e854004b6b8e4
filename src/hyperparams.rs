//! Immutable construction-time configuration shared by every representation.

use crate::error::{Result, TsetlinError};

/// Hyperparameters fixed for the lifetime of a machine.
///
/// `mid_state`, `s_inv`, `s_m1_inv`, `sparse_min_state`, and
/// `sparse_init_state` are derived once at construction and cached here so
/// hot training loops never recompute them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparams {
    pub num_classes: u32,
    pub num_clauses: u32,
    pub num_literals: u32,
    pub threshold: i32,
    pub max_state: i8,
    pub min_state: i8,
    pub boost_true_positive_feedback: bool,
    pub s: f64,

    pub(crate) mid_state: i8,
    pub(crate) s_inv: f64,
    pub(crate) s_m1_inv: f64,
    pub(crate) sparse_min_state: i8,
    pub(crate) sparse_init_state: i8,
}

impl Hyperparams {
    /// Validates and derives the hyperparameter set.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_classes: u32,
        num_clauses: u32,
        num_literals: u32,
        threshold: i32,
        max_state: i8,
        min_state: i8,
        boost_true_positive_feedback: bool,
        s: f64,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(TsetlinError::InvalidHyperparameters {
                reason: "num_classes must be >= 1".into(),
            });
        }
        if num_clauses == 0 {
            return Err(TsetlinError::InvalidHyperparameters {
                reason: "num_clauses must be >= 1".into(),
            });
        }
        if num_literals == 0 {
            return Err(TsetlinError::InvalidHyperparameters {
                reason: "num_literals must be >= 1".into(),
            });
        }
        if threshold < 1 {
            return Err(TsetlinError::InvalidHyperparameters {
                reason: "threshold must be >= 1".into(),
            });
        }
        if min_state >= max_state {
            return Err(TsetlinError::InvalidHyperparameters {
                reason: format!("min_state ({min_state}) must be < max_state ({max_state})"),
            });
        }
        if s.partial_cmp(&1.0) != Some(std::cmp::Ordering::Greater) {
            return Err(TsetlinError::InvalidHyperparameters {
                reason: format!("s ({s}) must be > 1.0"),
            });
        }

        // Truncation toward zero, matching integer division semantics.
        let mid_state = ((max_state as i32 + min_state as i32) / 2) as i8;
        let s_inv = 1.0 / s;
        let s_m1_inv = (s - 1.0) / s;
        let sparse_min_state = (mid_state as i32 - 40).clamp(min_state as i32, max_state as i32) as i8;
        let sparse_init_state = (sparse_min_state as i32 + 5).clamp(min_state as i32, max_state as i32) as i8;

        Ok(Self {
            num_classes,
            num_clauses,
            num_literals,
            threshold,
            max_state,
            min_state,
            boost_true_positive_feedback,
            s,
            mid_state,
            s_inv,
            s_m1_inv,
            sparse_min_state,
            sparse_init_state,
        })
    }

    pub fn mid_state(&self) -> i8 {
        self.mid_state
    }

    pub fn sparse_min_state(&self) -> i8 {
        self.sparse_min_state
    }

    pub fn sparse_init_state(&self) -> i8 {
        self.sparse_init_state
    }

    /// `ta_id` of the positive- and negative-polarity automaton for a literal.
    pub fn ta_ids(literal: u32) -> (u32, u32) {
        (2 * literal, 2 * literal + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Hyperparams {
        Hyperparams::new(2, 4, 3, 100, 127, -127, false, 3.0).unwrap()
    }

    #[test]
    fn derives_mid_state_by_truncation() {
        let hp = defaults();
        assert_eq!(hp.mid_state, 0);
    }

    #[test]
    fn derives_sparse_thresholds() {
        let hp = defaults();
        assert_eq!(hp.sparse_min_state, -40);
        assert_eq!(hp.sparse_init_state, -35);
    }

    #[test]
    fn rejects_s_not_greater_than_one() {
        assert!(Hyperparams::new(1, 1, 1, 1, 127, -127, false, 1.0).is_err());
    }

    #[test]
    fn rejects_inverted_state_bounds() {
        assert!(Hyperparams::new(1, 1, 1, 1, -10, 10, false, 2.0).is_err());
    }

    #[test]
    fn rejects_zero_cardinalities() {
        assert!(Hyperparams::new(0, 1, 1, 1, 127, -127, false, 2.0).is_err());
        assert!(Hyperparams::new(1, 0, 1, 1, 127, -127, false, 2.0).is_err());
        assert!(Hyperparams::new(1, 1, 0, 1, 127, -127, false, 2.0).is_err());
        assert!(Hyperparams::new(1, 1, 1, 0, 127, -127, false, 2.0).is_err());
    }

    #[test]
    fn ta_id_packs_polarity_as_low_bit() {
        assert_eq!(Hyperparams::ta_ids(0), (0, 1));
        assert_eq!(Hyperparams::ta_ids(5), (10, 11));
    }
}
