use arrayvec::ArrayVec;
use serde::{Serialize, Serializer, Deserialize, Deserializer};

// ----------------------------------------------
// RingBuffer
// ----------------------------------------------

// Fixed-capacity circular buffer. Once full, every push overwrites the
// oldest element, so eviction is strictly by insertion order.
#[derive(Clone, Debug)]
pub struct RingBuffer<T, const N: usize> {
    slots: ArrayVec<T, N>,
    head: usize, // Index of the oldest element once the buffer is full.
}

impl<T, const N: usize> RingBuffer<T, N> {
    pub const CAPACITY: usize = N;

    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: ArrayVec::new_const(),
            head: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    // Returns the evicted element, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        debug_assert!(N != 0, "RingBuffer with zero capacity!");

        if !self.slots.is_full() {
            self.slots.push(item);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], item);
        self.head = (self.head + 1) % N;
        Some(evicted)
    }

    #[inline]
    pub fn newest(&self) -> Option<&T> {
        self.iter().next()
    }

    #[inline]
    pub fn oldest(&self) -> Option<&T> {
        self.iter_oldest_first().next()
    }

    // Newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.iter_oldest_first().rev()
    }

    pub fn iter_oldest_first(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        // Slots past the cursor are older than the ones that wrapped around.
        let (wrapped, oldest) = self.slots.split_at(self.head);
        oldest.iter().chain(wrapped.iter())
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

// Serialized as a plain sequence, oldest first, so the saved
// layout does not depend on where the write cursor happens to be.
impl<T, const N: usize> Serialize for RingBuffer<T, N>
    where T: Serialize
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer
    {
        serializer.collect_seq(self.iter_oldest_first())
    }
}

impl<'de, T, const N: usize> Deserialize<'de> for RingBuffer<T, N>
    where T: Deserialize<'de>
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de>
    {
        // ArrayVec rejects sequences longer than N.
        let slots = ArrayVec::<T, N>::deserialize(deserializer)?;
        Ok(Self { slots, head: 0 })
    }
}

#[cfg(test)]
mod tests;
