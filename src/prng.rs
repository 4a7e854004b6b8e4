//! Deterministic xorshift32 PRNG.
//!
//! All randomness used during training flows through one instance of this
//! generator per machine. Given the same seed and the same sequence of
//! calls, the stream of emitted values is bit-for-bit identical.

/// A 32-bit xorshift generator seeded at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prng {
    state: u32,
}

impl Prng {
    /// Seeds the generator. A seed of zero is not a valid xorshift state
    /// (it would emit zero forever), so it is silently replaced.
    pub fn seed(seed: u32) -> Self {
        let state = if seed == 0 { 0xDEAD_BEEF } else { seed };
        Self { state }
    }

    /// Advances the generator and returns the next `u32`.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in `[0, 1)`, built by placing the top 23 random bits
    /// into the mantissa of `1.0_f32` and subtracting `1.0`.
    pub fn next_f32(&mut self) -> f32 {
        let bits = self.next_u32() >> 9;
        let one_to_two = f32::from_bits(0x3F80_0000 | bits);
        one_to_two - 1.0
    }

    /// Draws an index in `[0, bound)` uniformly via modulo reduction.
    ///
    /// `bound` must be nonzero.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_is_replaced() {
        let mut a = Prng::seed(0);
        let mut b = Prng::seed(0xDEAD_BEEF);
        assert_eq!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Prng::seed(42);
        let mut b = Prng::seed(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seed_diverges() {
        let mut a = Prng::seed(1);
        let mut b = Prng::seed(2);
        let seq_a: Vec<u32> = (0..10).map(|_| a.next_u32()).collect();
        let seq_b: Vec<u32> = (0..10).map(|_| b.next_u32()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn next_f32_in_unit_range() {
        let mut rng = Prng::seed(7);
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "value out of range: {v}");
        }
    }

    proptest::proptest! {
        #[test]
        fn nth_value_determined_by_seed_and_n(seed: u32, n in 0u32..200) {
            let mut a = Prng::seed(seed);
            let mut b = Prng::seed(seed);
            for _ in 0..n {
                a.next_u32();
                b.next_u32();
            }
            proptest::prop_assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
