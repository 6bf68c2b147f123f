const WORD_BITS: usize = 64;

/// Fixed-size bitset over lattice masses `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MassBitset {
    words: Vec<u64>,
    len: usize,
}

impl MassBitset {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Restores a bitset from raw words, rejecting inconsistent lengths.
    pub(crate) fn from_words(words: Vec<u64>, len: usize) -> Option<Self> {
        (words.len() == len.div_ceil(WORD_BITS)).then_some(Self { words, len })
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> bool {
        i < self.len && self.words[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize) {
        self.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
    }

    /// Whether any bit in the inclusive range `lo..=hi` is set. Requires `lo <= hi < len`.
    pub(crate) fn any_in(&self, lo: usize, hi: usize) -> bool {
        debug_assert!(lo <= hi && hi < self.len);
        let (lo_word, lo_bit) = (lo / WORD_BITS, lo % WORD_BITS);
        let (hi_word, hi_bit) = (hi / WORD_BITS, hi % WORD_BITS);
        let lo_mask = u64::MAX << lo_bit;
        let hi_mask = u64::MAX >> (WORD_BITS - 1 - hi_bit);

        if lo_word == hi_word {
            return self.words[lo_word] & lo_mask & hi_mask != 0;
        }
        self.words[lo_word] & lo_mask != 0
            || self.words[lo_word + 1..hi_word].iter().any(|&w| w != 0)
            || self.words[hi_word] & hi_mask != 0
    }
}
