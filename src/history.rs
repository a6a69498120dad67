//! Bounded move history and the append-only record of resolved rounds.

use crate::{game::RoundRecord, types::Move};

pub const PLAYER_HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity circular buffer, oldest entry evicted first.
#[derive(Clone, Debug)]
pub struct RingBuffer<T: Copy, const N: usize> {
    data: [Option<T>; N],
    /// Next slot to write.
    head: usize,
    len: usize,
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self {
            data: [None; N],
            head: 0,
            len: 0,
        }
    }

    /// Returns the evicted entry once the buffer is full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.len == N {
            self.data[self.head]
        } else {
            self.len += 1;
            None
        };
        self.data[self.head] = Some(value);
        self.head = (self.head + 1) % N;
        evicted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Chronological index: 0 is the oldest retained entry.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let start = (self.head + N - self.len) % N;
        self.data[(start + index) % N]
    }

    pub fn last(&self) -> Option<T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// The newest `count` entries, oldest first.
    pub fn tail(&self, count: usize) -> Vec<T> {
        let skip = self.len.saturating_sub(count);
        self.iter().skip(skip).collect()
    }

    pub fn clear(&mut self) {
        self.data = [None; N];
        self.head = 0;
        self.len = 0;
    }
}

impl<T: Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> Extend<T> for RingBuffer<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T: Copy, const N: usize> FromIterator<T> for RingBuffer<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}

/// Most frequent item and its count, first-seen winning ties.
pub fn most_common<T: PartialEq + Copy>(items: impl IntoIterator<Item = T>) -> Option<(T, usize)> {
    let mut tally: Vec<(T, usize)> = Vec::new();
    for item in items {
        match tally.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => tally.push((item, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (item, count) in tally {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((item, count));
        }
    }
    best
}

/// The player's confirmed moves across rounds. Survives match resets.
pub type PlayerMoveHistory = RingBuffer<Move, PLAYER_HISTORY_CAPACITY>;

#[derive(Clone, Debug, Default)]
pub struct MatchHistory {
    rounds: Vec<RoundRecord>,
}

impl MatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: RoundRecord) {
        self.rounds.push(record);
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoundRecord> {
        self.rounds.iter()
    }
}
