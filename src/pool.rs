use std::ops::{Index, IndexMut};
use tokio::time::Instant;

use crate::event::{Event, EventRef, NIL};

/// Arena of event records with an intrusive free list of slot indices.
///
/// Slots are never returned to the allocator; exhausted pools grow by one
/// batch of `alloc_cap` records.
pub(crate) struct EventPool {
    slots: Vec<Event>,
    free_head: usize,
    free_len: usize,
    alloc_cap: usize,
}

impl EventPool {
    pub(crate) fn new(alloc_cap: usize) -> Self {
        let mut pool = EventPool {
            slots: Vec::new(),
            free_head: NIL,
            free_len: 0,
            alloc_cap,
        };
        pool.allocate();
        pool
    }

    /// Carve out a new batch and make it the free chain.
    fn allocate(&mut self) {
        let start = self.slots.len();
        let end = start + self.alloc_cap;
        // Placeholder deadline, overwritten on acquire.
        let filler = Instant::now();

        self.slots.reserve_exact(self.alloc_cap);
        for i in start..end {
            let next = if i + 1 < end { i + 1 } else { self.free_head };
            self.slots.push(Event::vacant(filler, next));
        }
        self.free_head = start;
        self.free_len += self.alloc_cap;
    }

    /// Pop a record off the free chain and mark it active.
    ///
    /// The record keeps whatever stale `ttl`/`expire` it had; the caller must overwrite them.
    pub(crate) fn acquire(&mut self) -> usize {
        if self.free_head == NIL {
            self.allocate();
        }

        let index = self.free_head;
        let event = &mut self.slots[index];
        self.free_head = event.next_free;
        event.next_free = NIL;
        event.active = true;
        self.free_len -= 1;
        index
    }

    /// Return a record to the free chain. Releasing an inactive record is a no-op.
    pub(crate) fn release(&mut self, index: usize) -> bool {
        let Some(event) = self.slots.get_mut(index) else {
            return false;
        };
        if !event.active {
            return false;
        }

        event.callback = None;
        event.heap_index = None;
        event.active = false;
        event.generation = event.generation.wrapping_add(1);
        event.next_free = self.free_head;
        self.free_head = index;
        self.free_len += 1;
        true
    }

    pub(crate) fn handle(&self, index: usize) -> EventRef {
        EventRef {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Whether the handle still names the occupancy it was issued for.
    pub(crate) fn is_live(&self, handle: &EventRef) -> bool {
        self.slots
            .get(handle.index)
            .is_some_and(|event| event.active && event.generation == handle.generation)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn free_len(&self) -> usize {
        self.free_len
    }

    #[cfg(test)]
    pub(crate) fn free_head(&self) -> Option<usize> {
        (self.free_head != NIL).then_some(self.free_head)
    }
}

impl Index<usize> for EventPool {
    type Output = Event;

    fn index(&self, index: usize) -> &Event {
        &self.slots[index]
    }
}

impl IndexMut<usize> for EventPool {
    fn index_mut(&mut self, index: usize) -> &mut Event {
        &mut self.slots[index]
    }
}
