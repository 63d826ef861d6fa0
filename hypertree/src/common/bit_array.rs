//! Packed, growable bit array.
//!
//! Used for breadth-first descriptors (addressed by local vertex id) and for
//! grid-wide masks (addressed by global cell index).

use std::fmt::{Debug, Formatter};
use std::ops::Range;

const WORD_BITS: usize = 64;

/// A packed bit vector backed by `u64` words.
///
/// Bits beyond `len()` are always zero so word-level operations such as
/// [`BitArray::count_ones`] never need masking.
///
/// # Examples
///
/// ```rust
/// use hypertree::common::BitArray;
///
/// let mut bits = BitArray::from_bools(&[true, false, true]);
/// bits.push(false);
/// assert_eq!(bits.len(), 4);
/// assert_eq!(bits.count_ones(), 2);
/// assert!(bits.get(2));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitArray {
    words: Vec<u64>,
    len: usize,
}

impl BitArray {
    /// Creates an empty bit array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bit array of `len` bits, all set to `value`.
    pub fn with_len(len: usize, value: bool) -> Self {
        let mut bits = BitArray {
            words: vec![if value { u64::MAX } else { 0 }; len.div_ceil(WORD_BITS)],
            len,
        };
        bits.clear_tail();
        bits
    }

    pub fn from_bools(values: &[bool]) -> Self {
        let mut bits = BitArray::with_len(values.len(), false);
        for (i, &value) in values.iter().enumerate() {
            if value {
                bits.set(i, true);
            }
        }
        bits
    }

    /// Rebuilds a bit array from LSB-first packed bytes.
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        let mut bits = BitArray::with_len(len, false);
        for i in 0..len.min(bytes.len() * 8) {
            if bytes[i / 8] & (1 << (i % 8)) != 0 {
                bits.set(i, true);
            }
        }
        bits
    }

    /// Packs the bits LSB-first into bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.len.div_ceil(8)];
        for i in self.iter_ones() {
            bytes[i / 8] |= 1 << (i % 8);
        }
        bytes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the bit at `index`; bits past the end read as `false`.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Sets the bit at `index`, growing the array with zeros when needed.
    pub fn set(&mut self, index: usize, value: bool) {
        if index >= self.len {
            self.resize(index + 1);
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn push(&mut self, value: bool) {
        let index = self.len;
        self.resize(index + 1);
        if value {
            self.set(index, true);
        }
    }

    /// Grows with zeros or truncates to `len` bits.
    pub fn resize(&mut self, len: usize) {
        self.words.resize(len.div_ceil(WORD_BITS), 0);
        self.len = len;
        self.clear_tail();
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Counts set bits in `range`; the part of the range past the end counts as zeros.
    pub fn count_ones_in(&self, range: Range<usize>) -> usize {
        let end = range.end.min(self.len);
        (range.start..end).filter(|&i| self.get(i)).count()
    }

    /// Copies `range` into a new bit array; the part past the end reads as zeros.
    pub fn slice(&self, range: Range<usize>) -> BitArray {
        let len = range.end.saturating_sub(range.start);
        let mut out = BitArray::with_len(len, false);
        for (i, source) in range.enumerate() {
            if self.get(source) {
                out.set(i, true);
            }
        }
        out
    }

    /// Appends every bit of `other`.
    pub fn extend_from(&mut self, other: &BitArray) {
        let offset = self.len;
        self.resize(offset + other.len);
        for i in other.iter_ones() {
            self.set(offset + i, true);
        }
    }

    /// Copies the bits of `other` into this array starting at `offset`.
    pub fn copy_from(&mut self, offset: usize, other: &BitArray) {
        if offset + other.len > self.len {
            self.resize(offset + other.len);
        }
        for i in 0..other.len {
            self.set(offset + i, other.get(i));
        }
    }

    /// Drops the trailing run of zero bits, returning how many were removed.
    pub fn truncate_trailing_zeros(&mut self) -> usize {
        let before = self.len;
        let new_len = self.iter_ones().last().map(|i| i + 1).unwrap_or(0);
        self.resize(new_len);
        before - new_len
    }

    pub fn any(&self) -> bool {
        self.words.iter().any(|&w| w != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Iterates the indices of set bits in increasing order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some(w * WORD_BITS + bit)
            })
        })
    }

    fn clear_tail(&mut self) {
        let used = self.len % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

impl Debug for BitArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text: String = self.iter().map(|b| if b { '1' } else { '0' }).collect();
        write!(f, "BitArray[{}]({})", self.len, text)
    }
}

impl FromIterator<bool> for BitArray {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitArray::new();
        for value in iter {
            bits.push(value);
        }
        bits
    }
}
