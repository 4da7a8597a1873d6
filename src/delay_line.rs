//! Fixed-capacity history of the most recent N input samples.
//!
//! Tap `i` of a coefficient vector always multiplies the sample that is `i`
//! steps old, so [`DelayLine::as_slice`] is ordered newest first. The buffer
//! stores every sample twice, `N` slots apart, which keeps `push` O(1) and
//! the ordered view contiguous without any copying.
//!
//! ```text
//! storage: [ s0 s1 s2 s3 | s0 s1 s2 s3 ]
//!               ^head
//! view:    [ s1 s2 s3 s0 ]  (newest .. oldest)
//! ```

use alloc::vec;
use alloc::vec::Vec;

/// Ring buffer holding exactly N samples, zero-padded until N have arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayLine {
    storage: Vec<f64>,
    /// Position of the newest sample in the first half of `storage`.
    head: usize,
    len: usize,
}

#[allow(clippy::len_without_is_empty)]
impl DelayLine {
    /// Creates a zero-filled delay line of `len` taps.
    ///
    /// # Panics
    ///
    /// Panics if `len == 0`. Filter construction rejects a zero order first.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "delay line needs at least one tap");
        Self {
            storage: vec![0.0; 2 * len],
            head: 0,
            len,
        }
    }

    /// Inserts the newest sample, evicting and returning the oldest one.
    #[inline]
    pub fn push(&mut self, sample: f64) -> f64 {
        self.head = if self.head == 0 { self.len - 1 } else { self.head - 1 };
        let evicted = self.storage[self.head];
        self.storage[self.head] = sample;
        self.storage[self.head + self.len] = sample;
        evicted
    }

    /// Reverts the most recent [`push`](Self::push), restoring `evicted` as the oldest sample.
    #[inline]
    pub fn undo_push(&mut self, evicted: f64) {
        self.storage[self.head] = evicted;
        self.storage[self.head + self.len] = evicted;
        self.head = (self.head + 1) % self.len;
    }

    /// Samples ordered from newest (index 0) to oldest (index N-1).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.storage[self.head..self.head + self.len]
    }

    /// Number of taps N.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Squared Euclidean norm ‖x‖².
    pub fn energy(&self) -> f64 {
        self.as_slice().iter().map(|x| x * x).sum()
    }

    /// Zeroes the history.
    pub fn clear(&mut self) {
        self.storage.fill(0.0);
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padded_before_fill() {
        let mut line = DelayLine::new(4);
        assert_eq!(line.as_slice(), &[0.0; 4]);
        line.push(1.0);
        assert_eq!(line.as_slice(), &[1.0, 0.0, 0.0, 0.0]);
        line.push(2.0);
        assert_eq!(line.as_slice(), &[2.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_newest_first_after_wrap() {
        let mut line = DelayLine::new(3);
        for i in 1..=7 {
            line.push(i as f64);
        }
        assert_eq!(line.as_slice(), &[7.0, 6.0, 5.0]);
        assert_eq!(line.len(), 3);
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut line = DelayLine::new(2);
        assert_eq!(line.push(1.0), 0.0);
        assert_eq!(line.push(2.0), 0.0);
        assert_eq!(line.push(3.0), 1.0);
        assert_eq!(line.push(4.0), 2.0);
    }

    #[test]
    fn test_undo_push_restores_view() {
        let mut line = DelayLine::new(3);
        for i in 1..=5 {
            line.push(i as f64);
        }
        let before = line.clone();
        let evicted = line.push(9.0);
        assert_eq!(line.as_slice(), &[9.0, 5.0, 4.0]);
        line.undo_push(evicted);
        assert_eq!(line, before);
        assert_eq!(line.as_slice(), &[5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_single_tap() {
        let mut line = DelayLine::new(1);
        line.push(3.0);
        assert_eq!(line.as_slice(), &[3.0]);
        let evicted = line.push(4.0);
        assert_eq!(evicted, 3.0);
        line.undo_push(evicted);
        assert_eq!(line.as_slice(), &[3.0]);
    }

    #[test]
    fn test_energy_and_clear() {
        let mut line = DelayLine::new(3);
        line.push(1.0);
        line.push(-2.0);
        assert_eq!(line.energy(), 5.0);
        line.clear();
        assert_eq!(line.energy(), 0.0);
        assert_eq!(line.as_slice(), &[0.0; 3]);
    }
}
