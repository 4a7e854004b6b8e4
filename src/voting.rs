//! Weighted vote summation and clipping.

/// `votes[c] = clip(sum of weights[k,c] for active clauses k, -T, T)`.
///
/// `weights` is row-major `(clause, class)`. `clause_output[k]` gates
/// whether clause `k` contributes its weight row at all.
pub fn sum_votes(clause_output: &[bool], weights: &[i16], num_classes: usize, threshold: i32) -> Vec<i32> {
    let mut votes = vec![0i32; num_classes];
    for (k, &active) in clause_output.iter().enumerate() {
        if !active {
            continue;
        }
        let row = &weights[k * num_classes..(k + 1) * num_classes];
        for (c, &w) in row.iter().enumerate() {
            votes[c] += w as i32;
        }
    }
    for v in votes.iter_mut() {
        *v = clip(*v, threshold);
    }
    votes
}

pub fn clip(x: i32, threshold: i32) -> i32 {
    x.max(-threshold).min(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_voting() {
        // clause_output=[1,0], weights=[[5,-2],[-3,10]], T=100 -> votes=[5,-2]
        let clause_output = [true, false];
        let weights: [i16; 4] = [5, -2, -3, 10];
        let votes = sum_votes(&clause_output, &weights, 2, 100);
        assert_eq!(votes, vec![5, -2]);
    }

    #[test]
    fn clips_to_threshold() {
        let clause_output = [true, true, true];
        let weights: [i16; 3] = [100, 100, 100];
        let votes = sum_votes(&clause_output, &weights, 1, 50);
        assert_eq!(votes, vec![50]);
    }

    proptest::proptest! {
        #[test]
        fn votes_always_within_threshold(threshold in 1i32..1000, raw in -2000i32..2000) {
            proptest::prop_assert!(clip(raw, threshold) >= -threshold);
            proptest::prop_assert!(clip(raw, threshold) <= threshold);
        }
    }
}
