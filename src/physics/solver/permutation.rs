//! Prime-stride permutation of the iteration pass.

/// Large primes the stride is drawn from. Each is coprime with every item
/// count the solver will realistically see.
const PRIMES: [u64; 10] = [
    998_244_353,
    1_000_000_007,
    1_000_000_009,
    100_663_319,
    201_326_611,
    402_653_189,
    805_306_457,
    1_610_612_741,
    2_147_483_647,
    4_294_967_291,
];

/// Maps virtual iteration indices onto dense item indices.
///
/// Visits of the same item are spread across the whole pass instead of
/// clustering, and the stride changes every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationMapper {
    index: usize,
    prime: u64,
}

impl Default for PermutationMapper {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PermutationMapper {
    pub fn new(permutation_index: usize) -> Self {
        let mut mapper = Self {
            index: 0,
            prime: PRIMES[0],
        };
        mapper.set_permutation_index(permutation_index);
        mapper
    }

    #[inline]
    pub fn permutation_index(&self) -> usize {
        self.index
    }

    pub fn set_permutation_index(&mut self, index: usize) {
        self.index = index;
        self.prime = PRIMES[index % PRIMES.len()];
    }

    /// Move to the next prime, wrapping around the table.
    pub fn advance(&mut self) {
        self.set_permutation_index(self.index.wrapping_add(1));
    }

    /// Dense index visited at virtual position `i` of a pass over `count` items.
    #[inline]
    pub fn map(&self, i: usize, count: usize) -> usize {
        debug_assert!(count > 0);
        let n = count as u64;
        (((i as u64 % n) * (self.prime % n)) % n) as usize
    }
}
