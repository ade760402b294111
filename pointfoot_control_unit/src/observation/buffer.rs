//! Fixed-capacity rolling observation history.
//!
//! Storage is one contiguous pre-allocated block of `H × obs_len` values used
//! as a ring. `push` copies into the next slot (O(1), no allocation).
//! `window` always yields exactly `H` entries, oldest first: before `H`
//! pushes the leading slots repeat the first observation ever pushed.
//!
//! The policy input groups the window by term (every entry's first term, then
//! every entry's second term, ...); see [`Window::flatten_by_term`].

use thiserror::Error;

/// Rejected push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("observation length {actual} != configured {expected}")]
pub struct ObservationLengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Ring buffer of the last `H` observations.
#[derive(Debug, Clone)]
pub struct ObservationBuffer {
    /// `capacity × obs_len` values.
    data: Vec<f64>,
    /// Copy of the first observation ever pushed (padding source).
    first: Vec<f64>,
    obs_len: usize,
    capacity: usize,
    /// Next slot to write.
    head: usize,
    /// Stored entries (≤ capacity).
    len: usize,
    /// Total pushes since construction/reset.
    pushes: u64,
}

impl ObservationBuffer {
    /// Create an empty buffer holding `capacity` observations of `obs_len` values.
    ///
    /// Both dimensions are clamped to at least 1.
    pub fn new(capacity: usize, obs_len: usize) -> Self {
        let capacity = capacity.max(1);
        let obs_len = obs_len.max(1);
        Self {
            data: vec![0.0; capacity * obs_len],
            first: vec![0.0; obs_len],
            obs_len,
            capacity,
            head: 0,
            len: 0,
            pushes: 0,
        }
    }

    /// History length `H`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn obs_len(&self) -> usize {
        self.obs_len
    }

    /// Stored (non-padding) entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total pushes since construction or the last reset.
    #[inline]
    pub fn pushes(&self) -> u64 {
        self.pushes
    }

    /// Append an observation, evicting the oldest at capacity.
    pub fn push(&mut self, obs: &[f64]) -> Result<(), ObservationLengthMismatch> {
        if obs.len() != self.obs_len {
            return Err(ObservationLengthMismatch {
                expected: self.obs_len,
                actual: obs.len(),
            });
        }
        if self.pushes == 0 {
            self.first.copy_from_slice(obs);
        }
        let start = self.head * self.obs_len;
        self.data[start..start + self.obs_len].copy_from_slice(obs);
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
        self.pushes += 1;
        Ok(())
    }

    /// Entry `i` of the window (0 = oldest, `H - 1` = newest).
    ///
    /// # Panics
    /// If `i >= capacity`.
    pub fn get(&self, i: usize) -> &[f64] {
        assert!(i < self.capacity, "window index {i} out of range");
        let pad = self.capacity - self.len;
        if i < pad {
            return &self.first;
        }
        let oldest = (self.head + self.capacity - self.len) % self.capacity;
        let slot = (oldest + (i - pad)) % self.capacity;
        let start = slot * self.obs_len;
        &self.data[start..start + self.obs_len]
    }

    /// Most recent observation, if any was pushed.
    pub fn latest(&self) -> Option<&[f64]> {
        if self.len == 0 {
            None
        } else {
            Some(self.get(self.capacity - 1))
        }
    }

    /// Full `H`-entry window, oldest first.
    #[inline]
    pub fn window(&self) -> Window<'_> {
        Window {
            buffer: self,
            front: 0,
            back: self.capacity,
        }
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
        self.pushes = 0;
        self.first.iter_mut().for_each(|v| *v = 0.0);
    }
}

/// Iterator over exactly `H` history entries, oldest first.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    buffer: &'a ObservationBuffer,
    front: usize,
    back: usize,
}

impl<'a> Window<'a> {
    /// Number of entries in the full window (`H`).
    #[inline]
    pub fn history_len(&self) -> usize {
        self.buffer.capacity
    }

    #[inline]
    pub fn obs_len(&self) -> usize {
        self.buffer.obs_len
    }

    /// Length of the flattened window (`H × obs_len`).
    #[inline]
    pub fn flat_len(&self) -> usize {
        self.buffer.capacity * self.buffer.obs_len
    }

    /// Write the oldest→newest concatenation into `out[..flat_len()]`.
    ///
    /// Returns the number of values written (0 if `out` is too short).
    pub fn flatten_into(&self, out: &mut [f64]) -> usize {
        let n = self.buffer.obs_len;
        let total = self.flat_len();
        if out.len() < total {
            return 0;
        }
        for i in 0..self.buffer.capacity {
            out[i * n..(i + 1) * n].copy_from_slice(self.buffer.get(i));
        }
        total
    }

    /// Write the window grouped by term into `out[..flat_len()]`.
    ///
    /// `segments` are the term widths of one observation, in order. Each term
    /// is emitted for every entry oldest→newest before the next term starts:
    /// `t0(obs0) t0(obs1) … t1(obs0) t1(obs1) …`. Returns the number of
    /// values written (0 if `out` is too short or the widths do not sum to
    /// `obs_len`).
    pub fn flatten_by_term(&self, segments: &[usize], out: &mut [f64]) -> usize {
        let total = self.flat_len();
        if out.len() < total || segments.iter().sum::<usize>() != self.buffer.obs_len {
            return 0;
        }
        let mut at = 0;
        let mut offset = 0;
        for &width in segments {
            for i in 0..self.buffer.capacity {
                let term = &self.buffer.get(i)[offset..offset + width];
                out[at..at + width].copy_from_slice(term);
                at += width;
            }
            offset += width;
        }
        total
    }
}

impl<'a> Iterator for Window<'a> {
    type Item = &'a [f64];

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.buffer.get(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl DoubleEndedIterator for Window<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.buffer.get(self.back))
    }
}

impl ExactSizeIterator for Window<'_> {}
