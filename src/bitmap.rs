/// Number of hash bits consumed per trie level.
pub const BITS_PER_LEVEL: u32 = 5;
/// Width of the hash produced by a [`KeyHasher`](crate::KeyHasher).
pub const HASH_BITS: u32 = u64::BITS;
/// Branching factor of every node.
pub const ENTRY_COUNT: usize = 1 << BITS_PER_LEVEL;
/// A bitmap node holding this many slots turns into an array node on the next
/// insert into a free bit.
pub const PROMOTION_THRESHOLD: usize = 16;
/// An array node left with at most this many children is packed back into a
/// bitmap node.
pub const DEMOTION_THRESHOLD: usize = 8;

const FRAGMENT_MASK: u64 = ENTRY_COUNT as u64 - 1;

/// Returns the 5-bit slice of `hash` at `shift`.
///
/// Shifts past the hash width select nothing and yield zero.
pub fn fragment(hash: u64, shift: u32) -> u8 {
    (hash.checked_shr(shift).unwrap_or(0) & FRAGMENT_MASK) as u8
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bitmap(u32);

impl Bitmap {
    pub const fn new() -> Self {
        Bitmap(0)
    }

    pub fn get(&self, i: u8) -> bool {
        self.0 & (1 << i) != 0
    }

    pub fn set(&self, i: u8) -> Self {
        Bitmap(self.0 | (1 << i))
    }

    pub fn unset(&self, i: u8) -> Self {
        Bitmap(self.0 & !(1 << i))
    }

    pub fn size(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Position of bit `i` in a compact array holding one element per set bit.
    pub fn index(&self, i: u8) -> usize {
        (self.0 & ((1 << i) - 1)).count_ones() as usize
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Set bit positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let bits = self.0;

        (0..ENTRY_COUNT as u8).filter(move |&i| bits & (1 << i) != 0)
    }
}
