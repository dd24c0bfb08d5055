use crate::pool::EventPool;

/// Binary min-heap of pool indices ordered by event deadline.
///
/// Every member's `heap_index` mirrors its position in `items`, which is what
/// lets [`EventHeap::remove`] locate an arbitrary event without a scan.
#[derive(Debug, Default)]
pub(crate) struct EventHeap {
    items: Vec<usize>,
}

impl EventHeap {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        EventHeap {
            items: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the event with the earliest deadline.
    pub(crate) fn peek(&self) -> Option<usize> {
        self.items.first().copied()
    }

    /// Members in array order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().copied()
    }

    /// Insert an event. Returns true when it became the new minimum.
    pub(crate) fn insert(&mut self, pool: &mut EventPool, index: usize) -> bool {
        let position = self.items.len();
        self.items.push(index);
        pool[index].heap_index = Some(position);
        self.sift_up(pool, position) == 0
    }

    /// Remove an event from anywhere in the heap.
    ///
    /// Returns false if the event is not a member, which covers double removal
    /// and records that were already fired.
    pub(crate) fn remove(&mut self, pool: &mut EventPool, index: usize) -> bool {
        let Some(position) = pool[index].heap_index else {
            return false;
        };
        if self.items.get(position) != Some(&index) {
            return false;
        }

        let last = self.items.len() - 1;
        if position != last {
            self.swap(pool, position, last);
        }
        self.items.truncate(last);
        pool[index].heap_index = None;

        if position < self.items.len() {
            // The moved element may be out of place in either direction.
            let position = self.sift_down(pool, position);
            self.sift_up(pool, position);
        }
        true
    }

    fn less(&self, pool: &EventPool, i: usize, j: usize) -> bool {
        pool[self.items[i]].less(&pool[self.items[j]])
    }

    fn swap(&mut self, pool: &mut EventPool, i: usize, j: usize) {
        self.items.swap(i, j);
        pool[self.items[i]].heap_index = Some(i);
        pool[self.items[j]].heap_index = Some(j);
    }

    /// Returns the final position of the element.
    fn sift_up(&mut self, pool: &mut EventPool, mut j: usize) -> usize {
        while j > 0 {
            let i = (j - 1) / 2;
            if !self.less(pool, j, i) {
                break;
            }
            self.swap(pool, i, j);
            j = i;
        }
        j
    }

    /// Returns the final position of the element.
    fn sift_down(&mut self, pool: &mut EventPool, mut i: usize) -> usize {
        let n = self.items.len();
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let mut j = left;
            let right = left + 1;
            if right < n && self.less(pool, right, left) {
                j = right;
            }
            if !self.less(pool, j, i) {
                break;
            }
            self.swap(pool, i, j);
            i = j;
        }
        i
    }

    /// Panics if the heap order or the `heap_index` bookkeeping is broken.
    #[cfg(test)]
    pub(crate) fn assert_valid(&self, pool: &EventPool) {
        for (position, &index) in self.items.iter().enumerate() {
            assert_eq!(pool[index].heap_index, Some(position));
            assert!(pool[index].active, "heap member {} is pooled", index);
            for child in [2 * position + 1, 2 * position + 2] {
                if child < self.items.len() {
                    assert!(
                        pool[index].expire <= pool[self.items[child]].expire,
                        "heap order broken at {} -> {}",
                        position,
                        child
                    );
                }
            }
        }
    }
}
