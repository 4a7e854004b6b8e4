//! Maps a vote vector to the representation the caller asked for.

use crate::error::{Result, TsetlinError};

/// Selects how votes become the bytes written into a `y_pred` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `argmax(votes)`, ties resolved by first index. Requires `y_size = 1`.
    ClassIndex,
    /// Per-class `votes[c] > mid_state`. Requires `y_size = num_classes`.
    BinaryVector,
}

impl OutputMode {
    pub fn validate_y_size(&self, y_size: u32, num_classes: u32) -> Result<()> {
        match self {
            OutputMode::ClassIndex if y_size != 1 => Err(TsetlinError::ShapeMismatch {
                reason: format!("class-index output requires y_size = 1, got {y_size}"),
            }),
            OutputMode::BinaryVector if y_size != num_classes => Err(TsetlinError::ShapeMismatch {
                reason: format!(
                    "binary-vector output requires y_size = num_classes ({num_classes}), got {y_size}"
                ),
            }),
            _ => Ok(()),
        }
    }

    /// Writes activation output for one row's votes into `out`.
    pub fn apply(&self, votes: &[i32], mid_state: i32, out: &mut [u8]) {
        match self {
            OutputMode::ClassIndex => {
                let (idx, _) = votes
                    .iter()
                    .enumerate()
                    .fold((0usize, i32::MIN), |(best_i, best_v), (i, &v)| {
                        if v > best_v {
                            (i, v)
                        } else {
                            (best_i, best_v)
                        }
                    });
                out[..4].copy_from_slice(&(idx as u32).to_le_bytes());
            }
            OutputMode::BinaryVector => {
                for (c, &v) in votes.iter().enumerate() {
                    out[c] = (v > mid_state) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_index_breaks_ties_by_first_index() {
        let votes = [3, 3, 1];
        let mut out = [0u8; 4];
        OutputMode::ClassIndex.apply(&votes, 0, &mut out);
        assert_eq!(u32::from_le_bytes(out), 0);
    }

    #[test]
    fn s1_binary_vector_inference() {
        let mut out = [0u8; 1];
        OutputMode::BinaryVector.apply(&[1], 0, &mut out);
        assert_eq!(out, [1]);
        OutputMode::BinaryVector.apply(&[0], 0, &mut out);
        assert_eq!(out, [0]);
    }

    #[test]
    fn rejects_wrong_y_size() {
        assert!(OutputMode::ClassIndex.validate_y_size(2, 4).is_err());
        assert!(OutputMode::BinaryVector.validate_y_size(2, 4).is_err());
        assert!(OutputMode::ClassIndex.validate_y_size(1, 4).is_ok());
        assert!(OutputMode::BinaryVector.validate_y_size(4, 4).is_ok());
    }
}
